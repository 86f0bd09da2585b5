//! Keyboard mapping for the window host.

use circuit_court_core::camera::MoveDirection;
use winit::keyboard::KeyCode;

/// Movement direction bound to `key`, if any.
///
/// WASD (or arrows) move on the ground plane, E and Q raise and lower.
pub fn move_direction(key: KeyCode) -> Option<MoveDirection> {
    Some(match key {
        KeyCode::KeyW | KeyCode::ArrowUp => MoveDirection::Forward,
        KeyCode::KeyS | KeyCode::ArrowDown => MoveDirection::Backward,
        KeyCode::KeyA | KeyCode::ArrowLeft => MoveDirection::Left,
        KeyCode::KeyD | KeyCode::ArrowRight => MoveDirection::Right,
        KeyCode::KeyE => MoveDirection::Up,
        KeyCode::KeyQ => MoveDirection::Down,
        _ => return None,
    })
}
