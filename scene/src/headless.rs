//! Render engine that draws nothing.
//!
//! Records what it was asked to do so tests and the `replay` command can run
//! the full host without a GPU.

use glam::Mat4;

use crate::graph::SceneGraph;
use crate::host::{CameraView, EngineError, RenderEngine};

#[derive(Debug, Default)]
pub struct HeadlessEngine {
    frames: u64,
    size: (u32, u32),
    last_view_projection: Option<Mat4>,
    last_clear_color: Option<[f32; 4]>,
    last_mesh_count: usize,
    fail_draws: bool,
    disposed: bool,
}

impl HeadlessEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    /// Make every following draw fail (or succeed again).
    pub fn set_fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    /// Number of successful draws.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn last_view_projection(&self) -> Option<Mat4> {
        self.last_view_projection
    }

    pub fn last_clear_color(&self) -> Option<[f32; 4]> {
        self.last_clear_color
    }

    /// Meshes the last successful draw would have submitted.
    pub fn last_mesh_count(&self) -> usize {
        self.last_mesh_count
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn aspect(&self) -> f32 {
        let (width, height) = self.size;
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

impl RenderEngine for HeadlessEngine {
    fn resize(&mut self, width: u32, height: u32) {
        log::trace!("HeadlessEngine: resize {width}x{height}");
        self.size = (width, height);
    }

    fn draw(&mut self, scene: &SceneGraph, view: &CameraView) -> Result<(), EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        if self.fail_draws {
            return Err(EngineError::Device("simulated draw failure".into()));
        }
        self.last_view_projection = Some(view.view_projection(self.aspect()));
        self.last_clear_color = Some(scene.clear_color);
        self.last_mesh_count = scene.visible_meshes().len();
        self.frames += 1;
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        self.disposed = true;
        Ok(())
    }
}
