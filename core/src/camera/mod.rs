//! Cinematic camera for the courtroom.
//!
//! The camera is a reactive follower: each frame it looks up the pose for the
//! current [`Phase`](crate::Phase) in the [`CameraRig`] and moves the live
//! [`CameraState`] a fixed fraction of the remaining distance toward it.
//!
//! - [`CameraPose`] / [`CameraState`] - position + look-at target
//! - [`CameraRig`] - total phase → pose table
//! - [`CameraInterpolator`] - memoryless exponential-decay blend
//! - [`CameraInput`] - user free-look nudges applied before the blend

mod input;
mod interpolator;
mod pose;
mod rig;

pub use input::{CameraInput, MoveDirection};
pub use interpolator::{CameraInterpolator, DEFAULT_BLEND_FACTOR, InterpolationError};
pub use pose::{CameraPose, CameraState};
pub use rig::{CameraRig, RigError};
