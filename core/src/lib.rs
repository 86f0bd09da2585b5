//! # Circuit Court Core
//!
//! Pure, window-free logic behind the courtroom scene:
//!
//! - [`phase`] - whose speech is currently on screen
//! - [`camera`] - camera poses, the per-phase rig table and the frame blend
//! - [`session`] - events from the realtime session server and the view derived from them
//! - [`config`] - TOML configuration for the scene

pub mod camera;
pub mod config;
pub mod phase;
pub mod session;

pub use camera::{
    CameraInput, CameraInterpolator, CameraPose, CameraRig, CameraState, InterpolationError,
    RigError,
};
pub use config::{AssetPaths, CameraEntry, ConfigError, CourtConfig};
pub use phase::{Phase, UnrecognizedPhase};
pub use session::{MusicCue, MusicDirector, SessionEvent, SessionView};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("Circuit Court Core v{} initialized", VERSION);
}
