use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A camera framing: where the camera sits and what it looks at.
///
/// Poses are interpolation endpoints and never change once the rig is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    pub const fn new(position: Vec3, look_at: Vec3) -> Self {
        Self { position, look_at }
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.look_at.is_finite()
    }
}

/// The live camera transform, mutated once per frame on the render tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraState {
    pub const fn new(position: Vec3, look_at: Vec3) -> Self {
        Self { position, look_at }
    }

    /// Snap the state onto a pose.
    pub fn set_pose(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.look_at = pose.look_at;
    }

    /// The larger of the position and look-at distances to `pose`.
    pub fn distance_to(&self, pose: &CameraPose) -> f32 {
        self.position
            .distance(pose.position)
            .max(self.look_at.distance(pose.look_at))
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.look_at.is_finite()
    }
}

impl From<CameraPose> for CameraState {
    fn from(pose: CameraPose) -> Self {
        Self::new(pose.position, pose.look_at)
    }
}
