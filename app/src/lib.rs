//! # Circuit Court App
//!
//! Hosts for the courtroom scene:
//!
//! - [`window`] - winit window with a flat-shaded wgpu engine (`circuit-court play`)
//! - [`replay`] - headless run over a recorded event log (`circuit-court replay`)
//!
//! Both drive the same [`RenderLoopHost`](circuit_court_scene::RenderLoopHost),
//! feeding it the phase derived from session events read by [`feed`].
//! [`proceedings`] writes the session's text side to the log.

pub mod args;
pub mod error;
pub mod feed;
pub mod input;
pub mod proceedings;
pub mod replay;
pub mod wgpu_engine;
pub mod window;

pub use args::{Cli, Command, PlayArgs, ReplayArgs, SceneArgs};
pub use error::AppError;

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the app version.
pub fn init() {
    log::info!("Circuit Court App v{} initialized", VERSION);
}
