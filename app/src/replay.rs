//! Headless replay of a recorded session.
//!
//! Waits for the courtroom to load, then feeds events one at a time into a
//! [`SessionView`] and runs the host for a fixed number of frames after each,
//! recording where the camera ended up.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use circuit_court_core::{
    CameraState, CourtConfig, MusicCue, MusicDirector, Phase, SessionEvent, SessionView,
};
use circuit_court_scene::{
    AssetManifest, AssetSource, HeadlessEngine, HostStatus, RenderEngine, RenderLoopHost,
};

use crate::args::ReplayArgs;
use crate::error::AppError;
use crate::feed::read_events;
use crate::proceedings::ProceedingsLog;

/// Simulated frame time.
pub const REPLAY_DT: f32 = 1.0 / 60.0;

/// Pause between lobby frames while the courtroom is still loading.
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(5);

const REPLAY_WIDTH: u32 = 1280;
const REPLAY_HEIGHT: u32 = 720;

/// State of the courtroom after one event and its frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub event: &'static str,
    pub phase: Phase,
    pub camera: CameraState,
    pub music: MusicCue,
    pub status: HostStatus,
}

/// Run lobby frames until the courtroom leaves [`HostStatus::Loading`].
///
/// Fails with [`AppError::Bootstrap`] if loading fails and with
/// [`AppError::LoadTimeout`] if it is still loading after `timeout`.
pub fn wait_until_loaded<E: RenderEngine>(
    host: &mut RenderLoopHost<E>,
    timeout: Duration,
) -> Result<(), AppError> {
    let deadline = Instant::now() + timeout;
    let mut frames = 0_u32;
    loop {
        host.frame(Phase::Lobby, REPLAY_DT);
        frames += 1;
        match host.status() {
            HostStatus::Loading if Instant::now() >= deadline => {
                return Err(AppError::LoadTimeout(timeout));
            }
            HostStatus::Loading => thread::sleep(LOAD_POLL_INTERVAL),
            HostStatus::Failed(message) => return Err(AppError::Bootstrap(message.clone())),
            HostStatus::Disposed => {
                return Err(AppError::Bootstrap("host disposed while loading".into()));
            }
            HostStatus::Ready => {
                log::info!("Courtroom loaded after {frames} frames");
                return Ok(());
            }
        }
    }
}

/// Apply `events` in order, running `frames_per_event` frames after each.
///
/// Frames run whatever the host status is; call [`wait_until_loaded`] first
/// for a loaded courtroom.
pub fn replay<E: RenderEngine>(
    host: &mut RenderLoopHost<E>,
    events: Vec<SessionEvent>,
    frames_per_event: u32,
) -> Vec<ReplayStep> {
    let mut view = SessionView::new();
    let mut music = MusicDirector::new();
    let mut proceedings = ProceedingsLog::new();
    let mut steps = Vec::with_capacity(events.len());

    for event in events {
        let name = event.name();
        view.apply(event);
        proceedings.update(&view);
        if let Some(cue) = music.update(&view) {
            log::debug!("music cue -> {}", cue.name());
        }

        let phase = view.phase();
        for _ in 0..frames_per_event {
            host.frame(phase, REPLAY_DT);
        }

        steps.push(ReplayStep {
            event: name,
            phase,
            camera: *host.scene().camera(),
            music: MusicCue::for_view(&view),
            status: host.status().clone(),
        });
    }
    steps
}

/// Load the courtroom from `source`, replay `events` and log each step.
pub fn replay_session(
    config: &CourtConfig,
    source: Arc<dyn AssetSource>,
    events: Vec<SessionEvent>,
    frames_per_event: u32,
    load_timeout: Duration,
) -> Result<Vec<ReplayStep>, AppError> {
    let manifest = AssetManifest::from_paths(&config.assets);
    let mut host = RenderLoopHost::new(
        HeadlessEngine::new(REPLAY_WIDTH, REPLAY_HEIGHT),
        source,
        manifest,
        config,
    )?;

    if let Err(err) = wait_until_loaded(&mut host, load_timeout) {
        host.dispose();
        return Err(err);
    }
    let steps = replay(&mut host, events, frames_per_event);

    for (index, step) in steps.iter().enumerate() {
        let camera = step.camera;
        log::info!(
            "#{index} {:<14} phase={:<18} music={:<7} camera=({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2})",
            step.event,
            step.phase.name(),
            step.music.name(),
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.look_at.x,
            camera.look_at.y,
            camera.look_at.z,
        );
    }

    let status = host.status().clone();
    log::info!("Replay finished after {} frames", host.engine().frames());
    host.dispose();

    match status {
        HostStatus::Failed(message) => Err(AppError::Bootstrap(message)),
        _ => Ok(steps),
    }
}

/// `circuit-court replay`: run the recorded session headless and log each step.
pub fn run(args: ReplayArgs) -> Result<(), AppError> {
    let config = args.scene.load_config()?;
    let source = args.scene.asset_source(&config);

    let file = File::open(&args.events).map_err(|source| AppError::Events {
        path: args.events.display().to_string(),
        source,
    })?;
    let events = read_events(BufReader::new(file)).map_err(|source| AppError::Events {
        path: args.events.display().to_string(),
        source,
    })?;
    log::info!(
        "Replaying {} events from {}",
        events.len(),
        args.events.display()
    );

    replay_session(
        &config,
        source,
        events,
        args.frames_per_event,
        Duration::from_secs(args.load_timeout),
    )?;
    Ok(())
}
