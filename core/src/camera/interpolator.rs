use thiserror::Error;

use super::{CameraPose, CameraState};

/// Fraction of the remaining distance closed per frame.
pub const DEFAULT_BLEND_FACTOR: f32 = 0.05;

/// Errors from a single blend step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    #[error("blend factor {0} is outside (0, 1]")]
    InvalidFactor(f32),
    /// The blended state would contain NaN or infinite coordinates.
    /// The live camera is left untouched.
    #[error("camera blend produced non-finite coordinates")]
    NonFinite,
}

/// Per-frame exponential-decay blend toward a target pose.
///
/// Each step moves position and look-at independently by
/// `current + (target - current) * factor`, so the distance to the target
/// shrinks by `(1 - factor)` per frame. No velocity is carried between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInterpolator {
    factor: f32,
}

impl CameraInterpolator {
    /// Create an interpolator; `factor` must lie in `(0, 1]`.
    pub fn new(factor: f32) -> Result<Self, InterpolationError> {
        if factor.is_finite() && factor > 0.0 && factor <= 1.0 {
            Ok(Self { factor })
        } else {
            Err(InterpolationError::InvalidFactor(factor))
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Blend `state` one step toward `target`.
    ///
    /// The candidate is committed only when every coordinate is finite.
    pub fn step(
        &self,
        state: &mut CameraState,
        target: &CameraPose,
    ) -> Result<(), InterpolationError> {
        let position = state.position + (target.position - state.position) * self.factor;
        let look_at = state.look_at + (target.look_at - state.look_at) * self.factor;

        if !position.is_finite() || !look_at.is_finite() {
            return Err(InterpolationError::NonFinite);
        }

        state.position = position;
        state.look_at = look_at;
        Ok(())
    }
}

impl Default for CameraInterpolator {
    fn default() -> Self {
        Self {
            factor: DEFAULT_BLEND_FACTOR,
        }
    }
}
