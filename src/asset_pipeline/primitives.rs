//! Procedural meshes. Everything is unit sized and centered on the origin; scale the
//! node to resize.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3, Vec4};

use crate::scene_graph::geometry::MeshData;

fn mesh(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> MeshData {
    MeshData {
        colors: vec![Vec4::ONE; positions.len()],
        positions,
        normals,
        uvs: Some(uvs),
        tangents: None,
        indices,
    }
}

/// An axis aligned cube with `size` long edges. Faces don't share vertices.
pub fn cube(size: f32) -> MeshData {
    let half = size * 0.5;
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, right, up) in faces {
        let base = positions.len() as u32;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let corner = normal + right * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0);
            positions.push(corner * half);
            normals.push(normal);
            uvs.push(Vec2::new(u, 1.0 - v));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh(positions, normals, uvs, indices)
}

/// A latitude/longitude sphere of radius one with `divisions` rings and segments.
pub fn uv_sphere(divisions: u32) -> MeshData {
    let divisions = divisions.max(3);
    let mut positions = Vec::new();
    let mut uvs = Vec::new();

    for ring in 0..=divisions {
        let v = ring as f32 / divisions as f32;
        let theta = v * PI;
        for segment in 0..=divisions {
            let u = segment as f32 / divisions as f32;
            let phi = u * TAU;
            positions.push(Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            ));
            uvs.push(Vec2::new(u, v));
        }
    }

    let row = divisions + 1;
    let mut indices = Vec::new();
    for ring in 0..divisions {
        for segment in 0..divisions {
            let a = ring * row + segment;
            let b = a + row;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    let normals = positions.clone();
    mesh(positions, normals, uvs, indices)
}

const ICOSAHEDRON_X: f32 = 0.525_731_1;
const ICOSAHEDRON_Z: f32 = 0.850_650_8;

const ICOSAHEDRON_TRIANGLES: [[usize; 3]; 20] = [
    [1, 4, 0], [4, 9, 0], [4, 5, 9], [8, 5, 4], [1, 8, 4],
    [1, 10, 8], [10, 3, 8], [8, 3, 5], [3, 2, 5], [3, 7, 2],
    [3, 10, 7], [10, 6, 7], [6, 11, 7], [6, 0, 11], [6, 1, 0],
    [10, 1, 6], [11, 0, 9], [2, 11, 9], [5, 2, 9], [11, 2, 7],
];

/// Horizontal texture distance above which a triangle is considered to wrap the seam.
const SEAM_THRESHOLD: f32 = 0.7;

/// A sphere built by splitting every icosahedron face into four, `subdivisions` times.
/// Each triangle has its own three vertices.
pub fn icosphere(subdivisions: u32) -> MeshData {
    let (x, z) = (ICOSAHEDRON_X, ICOSAHEDRON_Z);
    let corners = [
        Vec3::new(-x, 0.0, z),
        Vec3::new(x, 0.0, z),
        Vec3::new(-x, 0.0, -z),
        Vec3::new(x, 0.0, -z),
        Vec3::new(0.0, z, x),
        Vec3::new(0.0, z, -x),
        Vec3::new(0.0, -z, x),
        Vec3::new(0.0, -z, -x),
        Vec3::new(z, x, 0.0),
        Vec3::new(-z, x, 0.0),
        Vec3::new(z, -x, 0.0),
        Vec3::new(-z, -x, 0.0),
    ];

    let mut positions = Vec::new();
    for [a, b, c] in ICOSAHEDRON_TRIANGLES {
        subdivide(corners[a], corners[b], corners[c], subdivisions, &mut positions);
    }

    let uvs = positions
        .chunks_exact(3)
        .flat_map(|triangle| spherical_uvs([triangle[0], triangle[1], triangle[2]]))
        .collect();
    let indices = (0..positions.len() as u32).collect();
    let normals = positions.clone();

    mesh(positions, normals, uvs, indices)
}

fn subdivide(v1: Vec3, v2: Vec3, v3: Vec3, depth: u32, out: &mut Vec<Vec3>) {
    if depth == 0 {
        out.extend_from_slice(&[v1, v2, v3]);
        return;
    }

    let v12 = ((v1 + v2) * 0.5).normalize();
    let v23 = ((v2 + v3) * 0.5).normalize();
    let v31 = ((v3 + v1) * 0.5).normalize();

    subdivide(v1, v12, v31, depth - 1, out);
    subdivide(v2, v23, v12, depth - 1, out);
    subdivide(v3, v31, v23, depth - 1, out);
    subdivide(v12, v23, v31, depth - 1, out);
}

/// Spherical projection of one triangle, shifting a corner by a full turn when the
/// triangle straddles the seam.
fn spherical_uvs(triangle: [Vec3; 3]) -> [Vec2; 3] {
    let mut uv = triangle.map(|p| {
        Vec2::new(
            0.5 + p.x.atan2(p.z) / TAU,
            0.5 + p.y.clamp(-1.0, 1.0).asin() / PI,
        )
    });

    let [u1, u2, u3] = [uv[0].x, uv[1].x, uv[2].x];
    let wraps = (u1 - u2).abs() > SEAM_THRESHOLD
        || (u1 - u3).abs() > SEAM_THRESHOLD
        || (u2 - u3).abs() > SEAM_THRESHOLD;

    if wraps {
        let high = [u1, u2, u3].map(|u| u > SEAM_THRESHOLD);
        match high {
            // Two corners past the seam: pull the third one over.
            [true, true, _] => uv[2].x += 1.0,
            [true, false, true] => uv[1].x += 1.0,
            [false, true, true] => uv[0].x += 1.0,
            // A single corner past the seam: push it back.
            [true, false, false] => uv[0].x -= 1.0,
            [false, true, false] => uv[1].x -= 1.0,
            [false, false, true] => uv[2].x -= 1.0,
            [false, false, false] => {}
        }
    }

    uv
}

/// A unit disk in the XY plane facing +Z: a center vertex and a fan of `divisions`
/// triangles around the rim.
pub fn disk(divisions: u32) -> MeshData {
    let divisions = divisions.max(3);

    let mut positions = vec![Vec3::ZERO];
    for segment in 0..divisions {
        let angle = segment as f32 / divisions as f32 * TAU;
        positions.push(Vec3::new(angle.cos(), angle.sin(), 0.0));
    }

    let mut indices = Vec::with_capacity(divisions as usize * 3);
    for segment in 0..divisions {
        let next = (segment + 1) % divisions;
        indices.extend_from_slice(&[0, segment + 1, next + 1]);
    }

    let uvs = positions
        .iter()
        .map(|p| Vec2::new(p.x * 0.5 + 0.5, 0.5 - p.y * 0.5))
        .collect();
    let normals = vec![Vec3::Z; positions.len()];

    mesh(positions, normals, uvs, indices)
}

/// A unit square in the XY plane facing +Z, made of two triangles.
pub fn quad() -> MeshData {
    let positions = vec![
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(-0.5, 0.5, 0.0),
    ];
    let uvs = vec![
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];

    mesh(positions, vec![Vec3::Z; 4], uvs, vec![0, 1, 2, 0, 2, 3])
}
