use glam::Vec2;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::camera::arcball::ArcballCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Rotating,
    Panning,
}

/// Keyboard intent and mouse drag state, written by the window layer and read by the
/// camera every frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    pub rotating: bool,
    pub panning: bool,
    pub last_cursor: Option<Vec2>,
}

/// The axis and direction a movement key drives.
fn key_axis(key: KeyCode) -> Option<(Axis, f32)> {
    match key {
        KeyCode::KeyW => Some((Axis::Z, -1.0)),
        KeyCode::KeyS => Some((Axis::Z, 1.0)),
        KeyCode::KeyD => Some((Axis::X, 1.0)),
        KeyCode::KeyA => Some((Axis::X, -1.0)),
        KeyCode::KeyR => Some((Axis::Y, 1.0)),
        KeyCode::KeyF => Some((Axis::Y, -1.0)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

impl InputState {
    pub fn drag_state(&self) -> DragState {
        if self.rotating {
            DragState::Rotating
        } else if self.panning {
            DragState::Panning
        } else {
            DragState::Idle
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::X => &mut self.dx,
            Axis::Y => &mut self.dy,
            Axis::Z => &mut self.dz,
        }
    }

    /// Returns whether the key drives the camera.
    pub fn key_down(&mut self, key: KeyCode) -> bool {
        match key_axis(key) {
            Some((axis, direction)) => {
                *self.axis_mut(axis) = direction;
                true
            }
            None => false,
        }
    }

    /// Clears the key's axis, unless another key has taken it over since.
    pub fn key_up(&mut self, key: KeyCode) -> bool {
        match key_axis(key) {
            Some((axis, direction)) => {
                let value = self.axis_mut(axis);
                if *value == direction {
                    *value = 0.0;
                }
                true
            }
            None => false,
        }
    }

    pub fn mouse_down(&mut self, button: MouseButton) {
        match button {
            MouseButton::Left => self.rotating = true,
            MouseButton::Right => self.panning = true,
            _ => {}
        }
    }

    pub fn mouse_up(&mut self, button: MouseButton) {
        match button {
            MouseButton::Left => self.rotating = false,
            MouseButton::Right => self.panning = false,
            _ => {}
        }
    }

    /// Applies an ongoing drag to the camera and remembers the cursor.
    pub fn cursor_moved(&mut self, position: Vec2, camera: &mut ArcballCamera) {
        if let Some(previous) = self.last_cursor {
            if self.rotating {
                camera.rotate(previous, position);
            }
            if self.panning {
                let delta = position - previous;
                camera.pan(Vec2::new(delta.x, -delta.y));
            }
        }

        self.last_cursor = Some(position);
    }

    /// Drops every drag and all keyboard intent; key-up events are lost while unfocused.
    pub fn on_focus_lost(&mut self) {
        *self = Self {
            last_cursor: self.last_cursor,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::arcball::ArcballSettings;
    use glam::Vec3;

    fn camera() -> ArcballCamera {
        ArcballCamera::looking_at(
            5.0,
            Vec3::ZERO,
            40f32.to_radians(),
            (800, 600),
            0.1,
            1000.0,
            ArcballSettings::default(),
        )
    }

    #[test]
    fn keys_map_to_axes() {
        let mut input = InputState::default();

        assert!(input.key_down(KeyCode::KeyW));
        assert!(input.key_down(KeyCode::KeyD));
        assert!(input.key_down(KeyCode::KeyF));
        assert_eq!((input.dx, input.dy, input.dz), (1.0, -1.0, -1.0));

        assert!(input.key_down(KeyCode::KeyS));
        assert!(input.key_down(KeyCode::KeyA));
        assert!(input.key_down(KeyCode::KeyR));
        assert_eq!((input.dx, input.dy, input.dz), (-1.0, 1.0, 1.0));

        assert!(!input.key_down(KeyCode::KeyQ));
    }

    #[test]
    fn releasing_a_key_clears_only_its_own_axis() {
        let mut input = InputState::default();
        input.key_down(KeyCode::KeyW);
        input.key_down(KeyCode::KeyD);

        input.key_up(KeyCode::KeyW);
        assert_eq!((input.dx, input.dz), (1.0, 0.0));

        // S took over the Z axis, so releasing W later must not stop it.
        input.key_down(KeyCode::KeyW);
        input.key_down(KeyCode::KeyS);
        input.key_up(KeyCode::KeyW);
        assert_eq!(input.dz, 1.0);
    }

    #[test]
    fn buttons_drive_the_drag_state() {
        let mut input = InputState::default();
        assert_eq!(input.drag_state(), DragState::Idle);

        input.mouse_down(MouseButton::Right);
        assert_eq!(input.drag_state(), DragState::Panning);

        input.mouse_down(MouseButton::Left);
        assert_eq!(input.drag_state(), DragState::Rotating);

        input.mouse_up(MouseButton::Left);
        input.mouse_up(MouseButton::Right);
        assert_eq!(input.drag_state(), DragState::Idle);
    }

    #[test]
    fn losing_focus_clears_everything_but_the_cursor() {
        let mut input = InputState::default();
        input.key_down(KeyCode::KeyA);
        input.mouse_down(MouseButton::Left);
        input.last_cursor = Some(Vec2::new(3.0, 4.0));

        input.on_focus_lost();

        assert_eq!(input.drag_state(), DragState::Idle);
        assert_eq!(input.dx, 0.0);
        assert_eq!(input.last_cursor, Some(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn right_drag_pans_with_screen_y_flipped() {
        let mut camera = camera();
        let mut input = InputState::default();
        input.cursor_moved(Vec2::new(400.0, 300.0), &mut camera);
        input.mouse_down(MouseButton::Right);

        // Cursor moves up the screen by 60 of 600 pixels.
        input.cursor_moved(Vec2::new(400.0, 240.0), &mut camera);

        assert!(camera.target().abs_diff_eq(Vec3::new(0.0, -0.3, 0.0), 1e-5));
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, -0.3, 5.0), 1e-5));
        assert_eq!(input.last_cursor, Some(Vec2::new(400.0, 240.0)));
    }

    #[test]
    fn left_drag_rotates_around_the_target() {
        let mut camera = camera();
        let mut input = InputState::default();
        input.cursor_moved(Vec2::new(400.0, 300.0), &mut camera);
        input.mouse_down(MouseButton::Left);

        input.cursor_moved(Vec2::new(480.0, 300.0), &mut camera);

        assert_eq!(camera.target(), Vec3::ZERO);
        assert!(!camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-3));
        assert!((camera.position().length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn moves_without_a_button_only_track_the_cursor() {
        let mut camera = camera();
        let mut input = InputState::default();

        input.cursor_moved(Vec2::new(10.0, 10.0), &mut camera);
        input.cursor_moved(Vec2::new(200.0, 150.0), &mut camera);

        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));
        assert_eq!(input.last_cursor, Some(Vec2::new(200.0, 150.0)));
    }

    #[test]
    fn the_first_move_after_losing_focus_does_nothing() {
        let mut camera = camera();
        let mut input = InputState::default();
        input.cursor_moved(Vec2::new(400.0, 300.0), &mut camera);
        input.mouse_down(MouseButton::Right);
        input.mouse_down(MouseButton::Left);

        input.on_focus_lost();
        input.cursor_moved(Vec2::new(500.0, 100.0), &mut camera);

        assert_eq!(camera.target(), Vec3::ZERO);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));
    }
}
