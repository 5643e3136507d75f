//! Quad-field mesh generation.
//!
//! Builds flat attribute buffers for `instance_count` independent quads. Each
//! quad carries one random triple and its ordinal, replicated across its four
//! corners so the shader can animate every quad as a unit.

use rand::Rng;

use crate::error::{FieldError, Result};

/// Corners per quad.
pub const CORNERS: usize = 4;
/// Triangle-list indices per quad.
pub const INDICES_PER_QUAD: usize = 6;

/// Corner UVs in emission order: top-left, top-right, bottom-left, bottom-right.
const CORNER_UVS: [[f32; 2]; CORNERS] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

/// Two counter-clockwise triangles over the corner order above.
const QUAD_INDICES: [u32; INDICES_PER_QUAD] = [0, 2, 1, 2, 3, 1];

/// Validated builder input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadFieldDescriptor {
    quad_size: f32,
    instance_count: usize,
}

impl QuadFieldDescriptor {
    /// Reject non-positive sizes, negative counts, and counts whose corner
    /// indices would not fit in a `u32` index buffer.
    pub fn new(quad_size: f32, instance_count: i64) -> Result<Self> {
        if !(quad_size > 0.0) || !quad_size.is_finite() {
            return Err(FieldError::InvalidQuadSize(quad_size));
        }
        if instance_count < 0 {
            return Err(FieldError::NegativeInstanceCount(instance_count));
        }
        let corners = instance_count.checked_mul(CORNERS as i64);
        if corners.map_or(true, |corners| corners > i64::from(u32::MAX)) {
            return Err(FieldError::TooManyInstances(instance_count));
        }
        Ok(Self {
            quad_size,
            instance_count: instance_count as usize,
        })
    }

    pub fn quad_size(&self) -> f32 {
        self.quad_size
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }
}

/// Output of the builder. Built once, never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadFieldBuffers {
    /// Local corner offsets, 3 floats per corner (z = 0).
    pub positions: Vec<f32>,
    /// Per-instance random triple in [0, 1), 3 floats per corner.
    pub random_seeds: Vec<f32>,
    /// Instance ordinal, one per corner.
    pub instance_indices: Vec<u32>,
    /// Unit-square UV, 2 floats per corner.
    pub tex_coords: Vec<f32>,
    /// Triangle list, 6 per instance.
    pub triangle_indices: Vec<u32>,
    /// Smooth vertex normals, 3 floats per corner.
    pub normals: Vec<f32>,
}

impl QuadFieldBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn instance_count(&self) -> usize {
        self.vertex_count() / CORNERS
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_indices.is_empty()
    }

    /// Corner positions of instance `i`.
    pub fn corners(&self, i: usize) -> [[f32; 3]; CORNERS] {
        let mut out = [[0.0; 3]; CORNERS];
        for (c, corner) in out.iter_mut().enumerate() {
            let base = (i * CORNERS + c) * 3;
            corner.copy_from_slice(&self.positions[base..base + 3]);
        }
        out
    }

    /// Random triple of instance `i` (read from its first corner).
    pub fn seed(&self, i: usize) -> [f32; 3] {
        let base = i * CORNERS * 3;
        [
            self.random_seeds[base],
            self.random_seeds[base + 1],
            self.random_seeds[base + 2],
        ]
    }
}

/// Build a quad field seeded from the thread-local RNG.
pub fn build(quad_size: f32, instance_count: i64) -> Result<QuadFieldBuffers> {
    let descriptor = QuadFieldDescriptor::new(quad_size, instance_count)?;
    Ok(build_with(&descriptor, &mut rand::thread_rng()))
}

/// Build a quad field drawing seeds from `rng`.
pub fn build_with<R: Rng>(
    descriptor: &QuadFieldDescriptor,
    rng: &mut R,
) -> QuadFieldBuffers {
    let n = descriptor.instance_count;
    let half = descriptor.quad_size / 2.0;
    let corner_offsets: [[f32; 3]; CORNERS] = [
        [-half, half, 0.0],
        [half, half, 0.0],
        [-half, -half, 0.0],
        [half, -half, 0.0],
    ];

    let mut buffers = QuadFieldBuffers {
        positions: Vec::with_capacity(n * CORNERS * 3),
        random_seeds: Vec::with_capacity(n * CORNERS * 3),
        instance_indices: Vec::with_capacity(n * CORNERS),
        tex_coords: Vec::with_capacity(n * CORNERS * 2),
        triangle_indices: Vec::with_capacity(n * INDICES_PER_QUAD),
        normals: Vec::new(),
    };

    for i in 0..n {
        let seed: [f32; 3] = [rng.gen(), rng.gen(), rng.gen()];
        let ordinal = i as u32;

        for (offset, uv) in corner_offsets.iter().zip(CORNER_UVS.iter()) {
            buffers.positions.extend_from_slice(offset);
            buffers.tex_coords.extend_from_slice(uv);
            buffers.instance_indices.push(ordinal);
            buffers.random_seeds.extend_from_slice(&seed);
        }

        let base = ordinal * CORNERS as u32;
        buffers
            .triangle_indices
            .extend(QUAD_INDICES.iter().map(|k| base + k));
    }

    buffers.normals = compute_vertex_normals(&buffers.positions, &buffers.triangle_indices);
    buffers
}

/// Smooth normals: accumulate face normals per vertex, then normalise.
pub fn compute_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];
    let vertex = |k: u32| {
        let b = k as usize * 3;
        [positions[b], positions[b + 1], positions[b + 2]]
    };

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
        let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let face = [
            ab[1] * ac[2] - ab[2] * ac[1],
            ab[2] * ac[0] - ab[0] * ac[2],
            ab[0] * ac[1] - ab[1] * ac[0],
        ];
        for &k in tri {
            let n = &mut normals[k as usize * 3..k as usize * 3 + 3];
            n[0] += face[0];
            n[1] += face[1];
            n[2] += face[2];
        }
    }

    for n in normals.chunks_exact_mut(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > 0.0 {
            n[0] /= len;
            n[1] /= len;
            n[2] /= len;
        }
    }
    normals
}
