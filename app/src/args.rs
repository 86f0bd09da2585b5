//! Command line arguments.
//!
//! Flags override the TOML configuration: `--assets` / `--asset-url` replace
//! `[assets] root`, everything else comes from the file or its defaults.

use std::path::PathBuf;
use std::sync::Arc;

use circuit_court_core::{ConfigError, CourtConfig};
use circuit_court_scene::{AssetSource, DirectoryAssets, HttpAssets};
use clap::{Args, Parser, Subcommand};

/// Circuit Court courtroom renderer.
#[derive(Parser, Debug)]
#[command(
    name = "circuit-court",
    about = "Circuit Court courtroom scene",
    long_about = "Renders the Circuit Court courtroom and frames whoever holds the floor.\n\n\
        Session events are read as JSON lines, one event per line:\n\
          {\"event\":\"turnUpdate\",\"data\":{\"activeRole\":\"Defense\",\"transcript\":[],\"round\":1}}\n\
        \n\
        EXAMPLES:\n\
          # Open a window and follow events piped on stdin\n\
          ./circuit-court play --events -\n\
        \n\
          # Run headless over a recorded session\n\
          ./circuit-court replay --events session.jsonl",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a window and render the courtroom.
    Play(PlayArgs),
    /// Drive the courtroom headless through a recorded event log.
    Replay(ReplayArgs),
}

/// Where the configuration and models come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SceneArgs {
    /// TOML configuration file (defaults are used when omitted).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the courtroom models.
    #[arg(long, value_name = "DIR", conflicts_with = "asset_url")]
    pub assets: Option<PathBuf>,

    /// Base URL to fetch the courtroom models from.
    #[arg(long, value_name = "URL")]
    pub asset_url: Option<String>,
}

impl SceneArgs {
    pub fn load_config(&self) -> Result<CourtConfig, ConfigError> {
        CourtConfig::load_or_default(self.config.as_deref())
    }

    /// Asset source picked from the flags, falling back to `[assets] root`.
    pub fn asset_source(&self, config: &CourtConfig) -> Arc<dyn AssetSource> {
        if let Some(url) = &self.asset_url {
            return Arc::new(HttpAssets::new(url));
        }
        if let Some(dir) = &self.assets {
            return Arc::new(DirectoryAssets::new(dir));
        }
        let root = &config.assets.root;
        if is_url(root) {
            Arc::new(HttpAssets::new(root))
        } else {
            Arc::new(DirectoryAssets::new(root))
        }
    }
}

fn is_url(root: &str) -> bool {
    root.starts_with("http://") || root.starts_with("https://")
}

#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Session events as JSON lines; `-` reads stdin.
    #[arg(long, value_name = "FILE")]
    pub events: Option<String>,

    /// Initial window width in pixels.
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Exit after rendering N frames (useful for testing).
    #[arg(long)]
    pub max_frames: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Recorded session events as JSON lines.
    #[arg(long, value_name = "FILE")]
    pub events: PathBuf,

    /// Frames simulated after each event.
    #[arg(long, default_value = "120")]
    pub frames_per_event: u32,

    /// Seconds to wait for the courtroom models before giving up.
    #[arg(long, value_name = "SECS", default_value = "30")]
    pub load_timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("circuit-court").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn play_defaults() {
        let Command::Play(play) = parse(&["play"]).command else {
            panic!("expected play");
        };
        assert_eq!((play.width, play.height), (1280, 720));
        assert_eq!(play.events, None);
        assert_eq!(play.max_frames, None);
        assert!(play.scene.config.is_none());
    }

    #[test]
    fn play_reads_stdin_events() {
        let Command::Play(play) = parse(&["play", "--events", "-", "--max-frames", "3"]).command
        else {
            panic!("expected play");
        };
        assert_eq!(play.events.as_deref(), Some("-"));
        assert_eq!(play.max_frames, Some(3));
    }

    #[test]
    fn replay_requires_events() {
        assert!(Cli::try_parse_from(["circuit-court", "replay"]).is_err());

        let Command::Replay(replay) =
            parse(&["replay", "--events", "log.jsonl", "--frames-per-event", "10"]).command
        else {
            panic!("expected replay");
        };
        assert_eq!(replay.events, PathBuf::from("log.jsonl"));
        assert_eq!(replay.frames_per_event, 10);
        assert_eq!(replay.load_timeout, 30);
    }

    #[test]
    fn assets_and_asset_url_conflict() {
        let result = Cli::try_parse_from([
            "circuit-court",
            "play",
            "--assets",
            "models",
            "--asset-url",
            "https://example.com",
        ]);
        assert!(result.is_err());
    }

    #[rstest]
    #[case::directory("assets", false)]
    #[case::http("http://localhost:8080/assets", true)]
    #[case::https("https://cdn.example.com/court", true)]
    fn config_root_picks_source(#[case] root: &str, #[case] remote: bool) {
        assert_eq!(is_url(root), remote);

        let mut config = CourtConfig::default();
        config.assets.root = root.to_owned();
        let source = SceneArgs::default().asset_source(&config);
        assert!(source.describe().contains(root.trim_end_matches('/')));
    }

    #[test]
    fn flags_override_config_root() {
        let args = SceneArgs {
            assets: Some(PathBuf::from("elsewhere")),
            ..SceneArgs::default()
        };
        let source = args.asset_source(&CourtConfig::default());
        assert!(source.describe().contains("elsewhere"));
    }
}
