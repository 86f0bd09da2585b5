use glam::{Quat, Vec2, Vec3};

use super::CameraState;

/// Direction of a held movement key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// User free-look control over the live camera.
///
/// While attached, pointer drags turn the camera, the wheel dollies it along the
/// view direction and held movement keys translate it. The nudges are applied
/// to [`CameraState`] before the phase blend, so the rig always pulls the camera
/// back toward the framing of the current phase.
#[derive(Debug, Clone)]
pub struct CameraInput {
    attached: bool,
    looking: bool,
    held: [bool; 6],

    /// Pointer movement since the last frame (in pixels), accumulated while looking.
    look_delta: Vec2,
    /// Wheel movement since the last frame (positive = toward the target).
    scroll_delta: f32,

    /// Radians of turn per pixel of drag.
    pub look_sensitivity: f32,
    /// World units per second for held movement keys.
    pub move_speed: f32,
    /// World units per wheel notch.
    pub dolly_step: f32,
    /// Closest the dolly may bring the camera to its look-at target.
    pub min_distance: f32,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            attached: false,
            looking: false,
            held: [false; 6],
            look_delta: Vec2::ZERO,
            scroll_delta: 0.0,
            look_sensitivity: 0.003,
            move_speed: 5.0,
            dolly_step: 0.5,
            min_distance: 0.5,
        }
    }
}

impl CameraInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting input.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop accepting input and drop anything pending.
    pub fn detach(&mut self) {
        *self = Self {
            look_sensitivity: self.look_sensitivity,
            move_speed: self.move_speed,
            dolly_step: self.dolly_step,
            min_distance: self.min_distance,
            ..Self::default()
        };
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Pointer button held (drag-to-look).
    pub fn set_looking(&mut self, looking: bool) {
        if self.attached {
            self.looking = looking;
        }
    }

    /// Pointer moved by `(dx, dy)` pixels.
    pub fn pointer_moved(&mut self, dx: f32, dy: f32) {
        if self.attached && self.looking && dx.is_finite() && dy.is_finite() {
            self.look_delta += Vec2::new(dx, dy);
        }
    }

    /// Wheel scrolled by `delta` notches.
    pub fn scrolled(&mut self, delta: f32) {
        if self.attached && delta.is_finite() {
            self.scroll_delta += delta;
        }
    }

    /// Movement key pressed or released.
    pub fn set_moving(&mut self, direction: MoveDirection, pressed: bool) {
        if self.attached || !pressed {
            self.held[direction as usize] = pressed;
        }
    }

    fn is_held(&self, direction: MoveDirection) -> bool {
        self.held[direction as usize]
    }

    /// Whether applying now would change the camera.
    pub fn has_pending(&self) -> bool {
        self.attached
            && (self.look_delta != Vec2::ZERO
                || self.scroll_delta != 0.0
                || self.held.iter().any(|&h| h))
    }

    /// Nudge `state` by the input gathered since the last frame, then reset
    /// the per-frame deltas.
    pub fn apply(&mut self, state: &mut CameraState, dt: f32) {
        if !self.has_pending() {
            self.reset_deltas();
            return;
        }

        let mut offset = state.look_at - state.position;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            self.reset_deltas();
            return;
        }

        if self.look_delta != Vec2::ZERO {
            let yaw = Quat::from_rotation_y(-self.look_delta.x * self.look_sensitivity);
            offset = yaw * offset;

            let right = offset.cross(Vec3::Y);
            if right.length_squared() > f32::EPSILON {
                let pitch = Quat::from_axis_angle(
                    right.normalize(),
                    -self.look_delta.y * self.look_sensitivity,
                );
                let pitched = pitch * offset;
                // Refuse to pitch through straight up/down.
                if pitched.cross(Vec3::Y).length_squared() > f32::EPSILON {
                    offset = pitched;
                }
            }
        }

        let forward = offset.normalize();
        let right = forward.cross(Vec3::Y).normalize_or_zero();

        let mut velocity = Vec3::ZERO;
        if self.is_held(MoveDirection::Forward) {
            velocity += forward;
        }
        if self.is_held(MoveDirection::Backward) {
            velocity -= forward;
        }
        if self.is_held(MoveDirection::Right) {
            velocity += right;
        }
        if self.is_held(MoveDirection::Left) {
            velocity -= right;
        }
        if self.is_held(MoveDirection::Up) {
            velocity += Vec3::Y;
        }
        if self.is_held(MoveDirection::Down) {
            velocity -= Vec3::Y;
        }
        let translation = velocity.normalize_or_zero() * self.move_speed * dt.max(0.0);

        let dolly = (self.scroll_delta * self.dolly_step).min(distance - self.min_distance);
        let position = state.position + translation + forward * dolly.max(-distance * 4.0);
        let look_at = state.position + translation + offset;

        if position.is_finite() && look_at.is_finite() {
            state.position = position;
            state.look_at = look_at;
        }
        self.reset_deltas();
    }

    fn reset_deltas(&mut self) {
        self.look_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }
}
