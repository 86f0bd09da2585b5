//! # Circuit Court Scene
//!
//! Everything between the core camera logic and a window:
//!
//! - [`assets`] - asset sources (memory, directory, HTTP) returning cooperative futures
//! - [`model`] - glTF model decoding
//! - [`graph`] - the scene graph the courtroom is assembled into
//! - [`animation`] - judge idle/talking clip playback
//! - [`bootstrap`] - asynchronous courtroom loading
//! - [`runtime`] - the per-frame courtroom scene
//! - [`host`] - the render loop host and the [`RenderEngine`] seam
//!
//! # Frame flow
//!
//! ```text
//! RenderLoopHost::frame(phase, dt)
//!     ├─ poll bootstrap future once (while loading)
//!     ├─ CourtroomScene::update(phase, dt)
//!     │     ├─ free-look input
//!     │     ├─ camera blend toward rig pose
//!     │     └─ judge animation
//!     └─ RenderEngine::draw(graph, view)
//! ```

pub mod animation;
pub mod assets;
pub mod bootstrap;
pub mod cancel;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod graph;
pub mod headless;
pub mod host;
pub mod model;
mod poll;
pub mod runtime;

pub use animation::{AnimationPlayer, JudgeAnimator};
pub use assets::{AssetError, AssetFuture, AssetSource, DirectoryAssets, MemoryAssets};
#[cfg(feature = "http")]
pub use assets::HttpAssets;
pub use bootstrap::{AssetManifest, BootstrapError, LoadedCourtroom, load_courtroom};
pub use cancel::{CancellationToken, Cancelled};
pub use graph::{Handedness, Light, LightKind, MeshInstance, NodeId, SceneGraph, Transform};
pub use headless::HeadlessEngine;
pub use host::{
    CameraView, EngineError, FrameOutcome, HostStatus, RenderEngine, RenderLoopHost,
};
pub use model::{AnimationClip, MeshData, ModelAsset, ModelError};
pub use runtime::{CourtroomScene, FrameUpdate};

/// Scene library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the scene library version.
pub fn init() {
    log::info!("Circuit Court Scene v{} initialized", VERSION);
}
