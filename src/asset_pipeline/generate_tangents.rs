// Tangents are accumulated per triangle and normalized once per vertex, so a vertex
// shared by several triangles ends up with the average direction of all of them.

use glam::{Vec2, Vec3};
use log::warn;

use crate::error::DegenerateTriangle;

/// Below this the UV mapping of a triangle is treated as singular.
const MIN_UV_DETERMINANT: f32 = 1e-8;

/// Used for degenerate triangles and for vertices whose accumulated tangent cancels out.
pub const FALLBACK_TANGENT: Vec3 = Vec3::X;

#[derive(Debug, Clone, Default)]
pub struct TangentOutput {
    pub tangents: Vec<Vec3>,
    pub degenerate: Vec<DegenerateTriangle>,
}

/// Generates one unit tangent per vertex of an indexed triangle list.
///
/// Triangles referencing vertices outside `positions` or `uvs` are skipped.
pub fn generate_tangents(positions: &[Vec3], uvs: &[Vec2], indices: &[u32]) -> TangentOutput {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    let mut degenerate = Vec::new();

    for (triangle, face) in indices.chunks_exact(3).enumerate() {
        let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];

        let (Some(&p0), Some(&p1), Some(&p2)) =
            (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (Some(&uv0), Some(&uv1), Some(&uv2)) = (uvs.get(a), uvs.get(b), uvs.get(c)) else {
            continue;
        };

        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let determinant = delta_uv1.x * delta_uv2.y - delta_uv2.x * delta_uv1.y;

        let tangent = if determinant.is_finite() && determinant.abs() >= MIN_UV_DETERMINANT {
            let r = 1.0 / determinant;
            (edge1 * delta_uv2.y - edge2 * delta_uv1.y) * r
        } else {
            degenerate.push(DegenerateTriangle {
                triangle,
                determinant,
            });
            FALLBACK_TANGENT
        };

        if !tangent.is_finite() {
            continue;
        }

        sums[a] += tangent;
        sums[b] += tangent;
        sums[c] += tangent;
    }

    if !degenerate.is_empty() {
        warn!(
            "{} of {} triangles have a singular UV mapping, using the fallback tangent",
            degenerate.len(),
            indices.len() / 3
        );
    }

    let tangents = sums
        .into_iter()
        .map(|sum| sum.try_normalize().unwrap_or(FALLBACK_TANGENT))
        .collect();

    TangentOutput {
        tangents,
        degenerate,
    }
}
