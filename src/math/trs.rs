use glam::{Mat3, Mat4, Quat, Vec3};

/// Composes a translation, a rotation and a per-axis scale into `T · R · S`.
///
/// The matrices are multiplied onto an accumulator in translate, rotate, scale order,
/// so points are scaled first, then rotated, then translated.
pub fn compose(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    compose_onto(Mat4::IDENTITY, translation, rotation, scale)
}

/// Same as [`compose`], but starts from `base` instead of the identity (`base · T · R · S`).
pub fn compose_onto(base: Mat4, translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    let mut matrix = base;
    matrix *= Mat4::from_translation(translation);
    matrix *= Mat4::from_quat(rotation);
    matrix *= Mat4::from_scale(scale);
    matrix
}

/// Splits an affine matrix back into translation, rotation and scale.
///
/// Translation is the last column, scale the length of each basis column and rotation
/// the basis with the scale divided out. A mirrored basis (negative determinant) comes
/// back as a negative x scale. Shear is not recovered.
pub fn decompose(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = matrix.w_axis.truncate();

    let x_axis = matrix.x_axis.truncate();
    let y_axis = matrix.y_axis.truncate();
    let z_axis = matrix.z_axis.truncate();

    let mut scale = Vec3::new(x_axis.length(), y_axis.length(), z_axis.length());
    if Mat3::from_cols(x_axis, y_axis, z_axis).determinant() < 0.0 {
        scale.x = -scale.x;
    }

    let basis = Mat3::from_cols(
        safe_div(x_axis, scale.x),
        safe_div(y_axis, scale.y),
        safe_div(z_axis, scale.z),
    );
    let rotation = Quat::from_mat3(&basis).normalize();

    (translation, rotation, scale)
}

fn safe_div(axis: Vec3, length: f32) -> Vec3 {
    if length > f32::EPSILON {
        axis / length
    } else {
        Vec3::ZERO
    }
}

/// Builds a rotation from Euler angles in degrees, applied X first, then Y, then Z
/// (`q = qz · qy · qx`).
pub fn quat_from_euler_degrees(x: f32, y: f32, z: f32) -> Quat {
    let qx = Quat::from_rotation_x(x.to_radians());
    let qy = Quat::from_rotation_y(y.to_radians());
    let qz = Quat::from_rotation_z(z.to_radians());
    qz * qy * qx
}

/// Reads a row-major 4x4 matrix, as found in the assimp JSON export.
pub fn mat4_from_row_major(values: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(values).transpose()
}

/// The rotation part of a "target to" matrix: the orientation of an object at `eye`
/// facing `target`, with its local +Z pointing away from the target.
///
/// Returns `None` when the eye sits on the target or `up` is parallel to the view axis.
pub fn target_to_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Option<Quat> {
    let z_axis = (eye - target).try_normalize()?;
    let x_axis = up.cross(z_axis).try_normalize()?;
    let y_axis = z_axis.cross(x_axis);

    Some(Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, z_axis)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f32::consts::FRAC_PI_2;

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn compose_scales_then_rotates_then_translates() {
        let matrix = compose(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::new(2.0, 1.0, 1.0),
        );

        // (1,0,0) -> scaled (2,0,0) -> rotated (0,2,0) -> translated (10,2,0)
        let point = matrix.transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(10.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn compose_onto_premultiplies_base() {
        let base = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let local = compose(Vec3::X, Quat::IDENTITY, Vec3::ONE);
        let combined = compose_onto(base, Vec3::X, Quat::IDENTITY, Vec3::ONE);
        assert!(combined.abs_diff_eq(base * local, 1e-6));
    }

    #[test]
    fn decompose_roundtrips_random_transforms() {
        let mut rng = StdRng::seed_from_u64(0x7ab1e);

        for _ in 0..200 {
            let translation = Vec3::new(
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
                rng.gen_range(-50.0..50.0),
            );
            let axis = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .try_normalize()
            .unwrap_or(Vec3::Y);
            let rotation = Quat::from_axis_angle(axis, rng.gen_range(-3.0..3.0));
            let scale = Vec3::new(
                rng.gen_range(0.05..10.0),
                rng.gen_range(0.05..10.0),
                rng.gen_range(0.05..10.0),
            );

            let (t, r, s) = decompose(&compose(translation, rotation, scale));

            assert!(t.abs_diff_eq(translation, 1e-3), "{t} != {translation}");
            assert!(same_rotation(r, rotation), "{r} != {rotation}");
            assert!(s.abs_diff_eq(scale, 1e-3), "{s} != {scale}");
        }
    }

    #[test]
    fn mirrored_matrices_keep_their_reflection() {
        let mirrored = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
            * Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
            * Mat4::from_rotation_y(0.3);

        let (t, r, s) = decompose(&mirrored);

        assert!(s.x < 0.0);
        assert!(compose(t, r, s).abs_diff_eq(mirrored, 1e-5));
    }

    #[test]
    fn euler_degrees_match_axis_rotations() {
        let q = quat_from_euler_degrees(0.0, 90.0, 0.0);
        assert!(same_rotation(q, Quat::from_rotation_y(FRAC_PI_2)));

        // X is applied before Z.
        let q = quat_from_euler_degrees(90.0, 0.0, 90.0);
        let expected = Quat::from_rotation_z(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2);
        assert!(same_rotation(q, expected));
        assert!((q * Vec3::Y).abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn row_major_translation_lands_in_last_column() {
        #[rustfmt::skip]
        let values = [
            1.0, 0.0, 0.0, 3.0,
            0.0, 1.0, 0.0, 4.0,
            0.0, 0.0, 1.0, 5.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        let matrix = mat4_from_row_major(&values);
        assert_eq!(matrix.w_axis.truncate(), Vec3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn target_to_faces_the_target() {
        let rotation = target_to_rotation(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .expect("valid look direction");
        assert!(same_rotation(rotation, Quat::IDENTITY));

        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn target_to_rejects_degenerate_input() {
        assert!(target_to_rotation(Vec3::ZERO, Vec3::ZERO, Vec3::Y).is_none());
        assert!(target_to_rotation(Vec3::Y, Vec3::ZERO, Vec3::Y).is_none());
    }
}
