//! Orbit camera driven by mouse drags, the wheel and WASDRF movement.
//!
//! Cursor positions are projected onto a virtual unit hemisphere in front of the screen;
//! dragging from one point of the ball to another rotates the camera around its target.

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::camera::input::InputState;
use crate::camera::{Camera, Projection};
use crate::math::trs;

/// Smallest step taken when zooming out from the zoom floor.
const MIN_ZOOM_STEP: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcballSettings {
    /// Keyboard movement, in units per second.
    pub speed: f32,
    pub pan_speed: f32,
    pub zoom_sensitivity: f32,
    /// Radius around the target the camera never zooms into.
    pub zoom_floor: f32,
}

impl ArcballSettings {
    /// Sensitivity as used by [`ArcballCamera::zoom`], never zero or negative.
    pub fn effective_zoom_sensitivity(&self) -> f32 {
        self.zoom_sensitivity.max(f32::EPSILON)
    }
}

impl Default for ArcballSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pan_speed: 3.0,
            zoom_sensitivity: 30.2,
            zoom_floor: 1.0,
        }
    }
}

pub struct ArcballCamera {
    pub camera: Camera,
    pub settings: ArcballSettings,
    screen: Vec2,
    inv_screen: Vec2,
    last_frame_ms: Option<f64>,
    model_matrix: Mat4,
}

impl ArcballCamera {
    pub fn new(
        camera: Camera,
        settings: ArcballSettings,
        width: u32,
        height: u32,
    ) -> Self {
        let settings = ArcballSettings {
            zoom_sensitivity: settings.effective_zoom_sensitivity(),
            ..settings
        };
        let mut arcball = Self {
            model_matrix: Mat4::from_rotation_translation(camera.rotation, camera.position),
            camera,
            settings,
            screen: Vec2::ONE,
            inv_screen: Vec2::ONE,
            last_frame_ms: None,
        };
        arcball.set_viewport(width, height);
        arcball
    }

    /// A perspective camera `distance` units in front of `target`, looking at it.
    pub fn looking_at(
        distance: f32,
        target: Vec3,
        fov_y_radians: f32,
        (width, height): (u32, u32),
        near: f32,
        far: f32,
        settings: ArcballSettings,
    ) -> Self {
        let projection = Projection::Perspective {
            fov_y_radians,
            aspect: width.max(1) as f32 / height.max(1) as f32,
            near,
            far,
        };
        let camera = Camera::new(target + Vec3::Z * distance, target, Vec3::Y, projection);
        Self::new(camera, settings, width, height)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.screen = Vec2::new(width as f32, height as f32);
        self.inv_screen = self.screen.recip();
        self.camera.set_aspect(width, height);
    }

    pub fn position(&self) -> Vec3 {
        self.camera.position
    }

    pub fn target(&self) -> Vec3 {
        self.camera.target
    }

    pub fn up(&self) -> Vec3 {
        self.camera.up
    }

    pub fn rotation(&self) -> Quat {
        self.camera.rotation
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// Maps a cursor position in pixels to [-1, 1], flipped on both axes.
    fn normalize_cursor(&self, cursor: Vec2) -> Vec2 {
        Vec2::new(
            -(cursor.x * 2.0 * self.inv_screen.x - 1.0).clamp(-1.0, 1.0),
            -(1.0 - cursor.y * 2.0 * self.inv_screen.y).clamp(-1.0, 1.0),
        )
    }

    /// The ball points of both cursors as pure quaternions, rotated into world space.
    fn ball_quaternions(&self, prev: Vec2, cur: Vec2) -> (Quat, Quat) {
        let to_world = |cursor: Vec2| {
            let point = self.camera.rotation * screen_to_arcball(self.normalize_cursor(cursor));
            Quat::from_xyzw(point.x, point.y, point.z, 0.0)
        };
        (to_world(prev), to_world(cur))
    }

    /// The rotation a drag from `prev` to `cur` applies, `cur_ball · prev_ball`.
    pub(crate) fn arcball_delta(&self, prev: Vec2, cur: Vec2) -> Quat {
        let (prev_ball, cur_ball) = self.ball_quaternions(prev, cur);
        cur_ball * prev_ball
    }

    pub fn rotate(&mut self, prev: Vec2, cur: Vec2) {
        let (prev_ball, cur_ball) = self.ball_quaternions(prev, cur);
        let previous = self.camera.rotation;

        let mut rotation = prev_ball * previous;
        rotation = cur_ball * rotation;
        rotation = rotation.normalize();
        if rotation.dot(previous) < 0.0 {
            rotation = -rotation;
        }

        let offset = self.camera.position - self.camera.target;
        let offset = cur_ball * (prev_ball * offset);

        self.camera.rotation = rotation;
        self.camera.position = self.camera.target + offset;
        self.camera.up = rotation * Vec3::Y;
    }

    pub fn pan(&mut self, delta: Vec2) {
        let delta = Vec3::new(
            -delta.x * self.inv_screen.x * self.settings.pan_speed,
            -delta.y * self.inv_screen.y * self.settings.pan_speed,
            0.0,
        );
        self.translate(self.camera.rotation * delta);
    }

    /// Moves toward the target for a positive `wheel`, away from it otherwise.
    pub fn zoom(&mut self, wheel: f32) {
        if wheel == 0.0 || !wheel.is_finite() {
            return;
        }

        let offset = self.camera.target - self.camera.position;
        let distance = offset.length();
        let Some(forward) = offset.try_normalize() else {
            return;
        };

        let room = distance - self.settings.zoom_floor;
        let step = room / self.settings.effective_zoom_sensitivity();

        let movement = if wheel > 0.0 {
            if room <= 0.0 {
                return;
            }
            step.min(room)
        } else {
            -step.max(MIN_ZOOM_STEP)
        };

        self.camera.position += forward * movement;
    }

    fn translate(&mut self, delta: Vec3) {
        self.camera.position += delta;
        self.camera.target += delta;
    }

    /// Per-frame tick: applies keyboard movement and rebuilds the view matrix.
    pub fn update(&mut self, now_ms: f64, input: &InputState) {
        let elapsed = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        let intent = Vec3::new(input.dx, input.dy, input.dz);
        self.translate(self.camera.rotation * (intent * elapsed * self.settings.speed));

        if let Some(rotation) =
            trs::target_to_rotation(self.camera.position, self.camera.target, self.camera.up)
        {
            self.camera.rotation = rotation;
        }

        self.model_matrix =
            Mat4::from_rotation_translation(self.camera.rotation, self.camera.position);
        self.camera.view_matrix = self.model_matrix.inverse();
    }
}

/// Projects a normalized screen point onto the unit hemisphere, or its rim when outside.
fn screen_to_arcball(point: Vec2) -> Vec3 {
    let distance = point.length_squared();
    if distance <= 1.0 {
        Vec3::new(point.x, point.y, (1.0 - distance).sqrt())
    } else {
        point.normalize().extend(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcball() -> ArcballCamera {
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

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.abs_diff_eq(b, 1e-5) || a.abs_diff_eq(-b, 1e-5)
    }

    #[test]
    fn screen_points_land_on_the_ball() {
        assert_eq!(screen_to_arcball(Vec2::ZERO), Vec3::Z);
        assert!(screen_to_arcball(Vec2::new(0.6, 0.0))
            .abs_diff_eq(Vec3::new(0.6, 0.0, 0.8), 1e-6));
        assert!(screen_to_arcball(Vec2::new(3.0, 4.0))
            .abs_diff_eq(Vec3::new(0.6, 0.8, 0.0), 1e-6));
    }

    #[test]
    fn cursor_normalization_flips_and_clamps() {
        let camera = arcball();
        assert!(camera
            .normalize_cursor(Vec2::new(400.0, 300.0))
            .abs_diff_eq(Vec2::ZERO, 1e-6));
        assert_eq!(camera.normalize_cursor(Vec2::new(0.0, 0.0)), Vec2::new(1.0, -1.0));
        assert_eq!(
            camera.normalize_cursor(Vec2::new(5000.0, -5000.0)),
            Vec2::new(-1.0, -1.0)
        );
    }

    #[test]
    fn dragging_in_place_changes_nothing() {
        let mut camera = arcball();
        camera.rotate(Vec2::new(100.0, 400.0), Vec2::new(300.0, 100.0));
        let (rotation, position, up) = (camera.rotation(), camera.position(), camera.up());

        camera.rotate(Vec2::new(250.0, 250.0), Vec2::new(250.0, 250.0));

        assert!(camera.rotation().abs_diff_eq(rotation, 1e-5));
        assert!(camera.position().abs_diff_eq(position, 1e-4));
        assert!(camera.up().abs_diff_eq(up, 1e-5));
    }

    #[test]
    fn sequential_rotations_compose_in_order() {
        let mut camera = arcball();
        let original = camera.rotation();

        let (a_from, a_to) = (Vec2::new(400.0, 300.0), Vec2::new(500.0, 300.0));
        let (b_from, b_to) = (Vec2::new(400.0, 300.0), Vec2::new(400.0, 200.0));

        let a = camera.arcball_delta(a_from, a_to);
        camera.rotate(a_from, a_to);
        let b = camera.arcball_delta(b_from, b_to);
        camera.rotate(b_from, b_to);

        assert!(same_rotation(camera.rotation(), b * a * original));
        assert!(!same_rotation(camera.rotation(), a * b * original));
    }

    #[test]
    fn rotation_orbits_around_the_target() {
        let mut camera = arcball();
        camera.camera.target = Vec3::new(1.0, 0.0, 0.0);
        camera.camera.position = Vec3::new(1.0, 0.0, 5.0);

        camera.rotate(Vec2::new(400.0, 300.0), Vec2::new(600.0, 300.0));

        assert!((camera.position().distance(camera.target()) - 5.0).abs() < 1e-4);
        assert!((camera.up().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn wheel_up_approaches_the_target_without_crossing_it() {
        let mut camera = arcball();
        let direction = (camera.target() - camera.position()).normalize();
        let mut distance = camera.position().distance(camera.target());

        for _ in 0..500 {
            camera.zoom(120.0);
            let next = camera.position().distance(camera.target());
            assert!(next <= distance);
            assert!(next > camera.settings.zoom_floor);
            distance = next;

            let now = (camera.target() - camera.position()).normalize();
            assert!(now.abs_diff_eq(direction, 1e-5));
        }
        assert!(distance < 1.1);
    }

    #[test]
    fn wheel_down_backs_away_even_from_the_floor() {
        let mut camera = arcball();
        camera.camera.position = Vec3::new(0.0, 0.0, 1.0);

        camera.zoom(-1.0);
        assert!(camera.position().z > 1.0);

        camera.zoom(1.0);
        assert!(camera.position().z > 1.0);
    }

    #[test]
    fn pan_moves_position_and_target_together() {
        let mut camera = arcball();
        let offset = camera.position() - camera.target();

        camera.pan(Vec2::new(80.0, -60.0));

        assert!((camera.position() - camera.target()).abs_diff_eq(offset, 1e-6));
        assert!(camera.target().abs_diff_eq(Vec3::new(-0.3, 0.3, 0.0), 1e-6));
    }

    #[test]
    fn keyboard_intent_moves_the_rig_over_time() {
        let mut camera = arcball();
        let mut input = InputState::default();
        input.dz = -1.0;

        camera.update(1000.0, &input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));

        camera.update(1500.0, &input);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 4.5), 1e-5));
        assert!(camera.target().abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-5));

        let expected = Mat4::look_at_rh(camera.position(), camera.target(), Vec3::Y);
        assert!(camera.camera.view_matrix.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn zero_zoom_sensitivity_still_zooms_by_finite_steps() {
        let mut camera = ArcballCamera::looking_at(
            5.0,
            Vec3::ZERO,
            40f32.to_radians(),
            (800, 600),
            0.1,
            1000.0,
            ArcballSettings {
                zoom_sensitivity: 0.0,
                ..ArcballSettings::default()
            },
        );
        assert_eq!(camera.settings.zoom_sensitivity, f32::EPSILON);

        camera.settings.zoom_sensitivity = 0.0;
        camera.zoom(-1.0);
        assert!(camera.position().is_finite());
        let zoomed_out = camera.camera.distance();
        assert!(zoomed_out > 5.0);

        camera.zoom(1.0);
        assert!(camera.position().is_finite());
        assert!(camera.camera.distance() < zoomed_out);
    }
}
