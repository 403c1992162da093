pub mod arcball;
pub mod input;

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::math::trs;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        half_height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov_y_radians,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y_radians, aspect, near, far),
            Projection::Orthographic {
                half_height,
                aspect,
                near,
                far,
            } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    pub fn set_aspect(&mut self, new_aspect: f32) {
        match self {
            Projection::Perspective { aspect, .. } | Projection::Orthographic { aspect, .. } => {
                *aspect = new_aspect
            }
        }
    }
}

pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Orientation of the camera in world space, derived from the view matrix.
    pub rotation: Quat,
    pub view_matrix: Mat4,
    pub projection: Projection,
    pub projection_matrix: Mat4,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, up: Vec3, projection: Projection) -> Self {
        let mut camera = Self {
            position,
            target,
            up: up.normalize_or(Vec3::Y),
            rotation: Quat::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection,
            projection_matrix: projection.matrix(),
        };
        camera.look_at();
        camera
    }

    /// Rebuilds the view matrix and orientation from position, target and up.
    ///
    /// A degenerate configuration (eye on the target, or up along the view axis) keeps
    /// the previous view.
    pub fn look_at(&mut self) {
        if trs::target_to_rotation(self.position, self.target, self.up).is_none() {
            return;
        }

        self.view_matrix = Mat4::look_at_rh(self.position, self.target, self.up);
        let (_, view_rotation, _) = trs::decompose(&self.view_matrix);
        self.rotation = view_rotation.inverse();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.look_at();
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.projection.set_aspect(width as f32 / height as f32);
        self.projection_matrix = self.projection.matrix();
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

/// Inverse of `projection · view` with the view's translation removed. Takes clip space
/// positions to world space directions, for the skybox.
pub fn sky_view_projection_inverse(view: Mat4, projection: Mat4) -> Mat4 {
    let mut view_rotation = view;
    view_rotation.w_axis = Vec4::W;
    (projection * view_rotation).inverse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perspective() -> Projection {
        Projection::Perspective {
            fov_y_radians: 40f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    #[test]
    fn looking_down_negative_z_is_a_translation() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, perspective());

        let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        assert!(camera.view_matrix.abs_diff_eq(expected, 1e-6));
        assert!(camera.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn rotation_is_the_inverse_of_the_view_rotation() {
        let camera = Camera::new(
            Vec3::new(3.0, 4.0, 5.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::Y,
            perspective(),
        );

        let forward = camera.rotation * Vec3::NEG_Z;
        let expected = (camera.target - camera.position).normalize();
        assert!(forward.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn degenerate_look_at_keeps_the_previous_view() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, perspective());
        let view = camera.view_matrix;

        camera.set_position(Vec3::ZERO);
        assert_eq!(camera.view_matrix, view);
        assert!(camera.view_matrix.is_finite());
    }

    #[test]
    fn aspect_changes_only_the_projection() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, perspective());
        let view = camera.view_matrix;
        let before = camera.projection_matrix;

        camera.set_aspect(1920, 1080);
        assert_ne!(camera.projection_matrix, before);
        assert_eq!(camera.view_matrix, view);

        camera.set_aspect(0, 1080);
        assert!(camera.projection_matrix.is_finite());
    }

    #[test]
    fn sky_directions_ignore_the_camera_position() {
        let near = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, perspective());
        let far = Camera::new(
            Vec3::new(0.0, 0.0, 50.0),
            Vec3::new(0.0, 0.0, 45.0),
            Vec3::Y,
            perspective(),
        );

        let center = Vec4::new(0.0, 0.0, 1.0, 1.0);
        let a = sky_view_projection_inverse(near.view_matrix, near.projection_matrix) * center;
        let b = sky_view_projection_inverse(far.view_matrix, far.projection_matrix) * center;

        let a = (a.truncate() / a.w).normalize();
        let b = (b.truncate() / b.w).normalize();
        assert!(a.abs_diff_eq(Vec3::NEG_Z, 1e-4));
        assert!(a.abs_diff_eq(b, 1e-5));
    }
}
