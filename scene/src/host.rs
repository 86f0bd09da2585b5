//! Render loop host.
//!
//! [`RenderLoopHost`] owns a [`RenderEngine`] and the [`CourtroomScene`] and is
//! driven by whoever owns the window: once per frame with the current phase,
//! plus resize notifications and a final [`dispose`](RenderLoopHost::dispose).
//!
//! Bootstrap runs as a boxed future that the host polls once per frame. Until
//! it completes the engine keeps drawing the empty scene, and a failed
//! bootstrap leaves the loop running with an error status.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;

use circuit_court_core::{CameraInput, CameraRig, ConfigError, CourtConfig, Phase};
use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::assets::AssetSource;
use crate::bootstrap::{AssetManifest, BootstrapError, LoadedCourtroom, load_courtroom};
use crate::cancel::CancellationToken;
use crate::graph::{Handedness, SceneGraph};
use crate::poll::poll_once;
use crate::runtime::CourtroomScene;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;
const MIN_LOOK_DISTANCE: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("surface error: {0}")]
    Surface(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("render engine already disposed")]
    Disposed,
}

/// What the renderer needs to know about the camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in radians.
    pub field_of_view: f32,
    pub handedness: Handedness,
}

impl CameraView {
    /// World-to-view matrix.
    ///
    /// A camera whose target coincides with its position (the pre-bootstrap
    /// origin state) looks along -Z instead of producing NaNs.
    pub fn view_matrix(&self) -> Mat4 {
        let offset = self.look_at - self.position;
        let direction = if offset.length_squared() < MIN_LOOK_DISTANCE * MIN_LOOK_DISTANCE {
            Vec3::NEG_Z
        } else {
            offset.normalize()
        };
        // Looking straight up or down leaves Y undefined as the up vector.
        let up = if direction.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        match self.handedness {
            Handedness::Right => Mat4::look_to_rh(self.position, direction, up),
            Handedness::Left => Mat4::look_to_lh(self.position, direction, up),
        }
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        match self.handedness {
            Handedness::Right => {
                Mat4::perspective_rh(self.field_of_view, aspect, NEAR_PLANE, FAR_PLANE)
            }
            Handedness::Left => {
                Mat4::perspective_lh(self.field_of_view, aspect, NEAR_PLANE, FAR_PLANE)
            }
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}

/// The seam between the host and whatever puts pixels on screen.
pub trait RenderEngine {
    /// The drawable area changed size (physical pixels).
    fn resize(&mut self, width: u32, height: u32);

    fn draw(&mut self, scene: &SceneGraph, view: &CameraView) -> Result<(), EngineError>;

    /// Release GPU and window resources. Called at most once by the host.
    fn dispose(&mut self) -> Result<(), EngineError>;
}

/// Lifecycle of the host, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostStatus {
    Loading,
    Ready,
    Failed(String),
    Disposed,
}

/// Result of one [`RenderLoopHost::frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Bootstrap still in flight; the empty scene was drawn.
    Loading,
    Rendered,
    /// Bootstrap failed; the loop keeps running until retried or disposed.
    Failed,
    /// The host was disposed; nothing was done.
    Stopped,
}

type BootstrapFuture = Pin<Box<dyn Future<Output = Result<LoadedCourtroom, BootstrapError>> + Send>>;

pub struct RenderLoopHost<E: RenderEngine> {
    engine: E,
    scene: CourtroomScene,
    source: Arc<dyn AssetSource>,
    manifest: AssetManifest,
    rig: CameraRig,
    field_of_view: f32,

    token: CancellationToken,
    pending: Option<BootstrapFuture>,
    status: HostStatus,

    resize_attached: bool,
    size: (u32, u32),
}

impl<E: RenderEngine> RenderLoopHost<E> {
    /// Validate `config`, then start bootstrapping from `source`.
    pub fn new(
        engine: E,
        source: Arc<dyn AssetSource>,
        manifest: AssetManifest,
        config: &CourtConfig,
    ) -> Result<Self, ConfigError> {
        let rig = config.rig()?;
        let interpolator = config.interpolator()?;
        let field_of_view = config.field_of_view_radians()?;

        let mut host = Self {
            engine,
            scene: CourtroomScene::new(interpolator),
            source,
            manifest,
            rig,
            field_of_view,
            token: CancellationToken::new(),
            pending: None,
            status: HostStatus::Loading,
            resize_attached: true,
            size: (0, 0),
        };
        host.start_bootstrap();
        Ok(host)
    }

    fn start_bootstrap(&mut self) {
        self.token = CancellationToken::new();
        self.pending = Some(Box::pin(load_courtroom(
            self.source.clone(),
            self.manifest.clone(),
            self.token.clone(),
        )));
        self.status = HostStatus::Loading;
    }

    /// Run one frame: advance bootstrap, update the scene, draw.
    pub fn frame(&mut self, phase: Phase, dt: f32) -> FrameOutcome {
        if self.status == HostStatus::Disposed {
            return FrameOutcome::Stopped;
        }

        self.poll_bootstrap();
        self.scene.update(phase, dt);

        let view = self.camera_view();
        if let Err(err) = self.engine.draw(self.scene.graph(), &view) {
            log::error!("Frame draw failed: {err}");
        }

        match self.status {
            HostStatus::Loading => FrameOutcome::Loading,
            HostStatus::Ready => FrameOutcome::Rendered,
            HostStatus::Failed(_) => FrameOutcome::Failed,
            HostStatus::Disposed => FrameOutcome::Stopped,
        }
    }

    fn poll_bootstrap(&mut self) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        let Poll::Ready(result) = poll_once(pending) else {
            return;
        };
        self.pending = None;

        match result {
            Ok(loaded) => {
                self.scene.install(loaded, self.rig.clone());
                self.status = HostStatus::Ready;
            }
            Err(err) => {
                log::error!("Courtroom bootstrap failed: {err}");
                self.status = HostStatus::Failed(err.to_string());
            }
        }
    }

    /// Start bootstrap again after a failure. Returns whether it restarted.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.status, HostStatus::Failed(_)) {
            return false;
        }
        log::info!("Retrying courtroom bootstrap");
        self.scene.reset();
        self.start_bootstrap();
        true
    }

    /// Forward a resize to the engine while the listener is attached.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.resize_attached {
            return;
        }
        self.size = (width, height);
        self.engine.resize(width, height);
    }

    /// Tear everything down. Safe to call more than once.
    ///
    /// Cancels and drops an in-flight bootstrap, stops forwarding resizes and
    /// disposes the engine. Disposal errors are logged, never returned.
    pub fn dispose(&mut self) {
        if self.status == HostStatus::Disposed {
            return;
        }
        self.token.cancel();
        self.pending = None;
        self.resize_attached = false;
        self.scene.reset();

        if let Err(err) = self.engine.dispose() {
            log::error!("EngineDisposalError: {err}");
        }
        self.status = HostStatus::Disposed;
        log::info!("Render loop host disposed");
    }

    pub fn status(&self) -> &HostStatus {
        &self.status
    }

    pub fn camera_view(&self) -> CameraView {
        let camera = self.scene.camera();
        CameraView {
            position: camera.position,
            look_at: camera.look_at,
            field_of_view: self.field_of_view,
            handedness: self.scene.graph().handedness,
        }
    }

    pub fn scene(&self) -> &CourtroomScene {
        &self.scene
    }

    /// Free-look input; attached once the courtroom is installed.
    pub fn input_mut(&mut self) -> &mut CameraInput {
        self.scene.input_mut()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Last size forwarded to the engine.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl<E: RenderEngine> Drop for RenderLoopHost<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}
