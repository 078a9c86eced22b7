//! Geometry Assembler
//!
//! Turns raw vertex/face arrays into the flat buffers a renderer uploads:
//! - positions: `[x0, y0, z0, x1, ...]`
//! - indices:   `[a0, b0, c0, a1, ...]`
//! - normals:   one smooth-shading normal per vertex
//!
//! Face indices are validated here so a broken payload never reaches the GPU.

use serde::Serialize;

use crate::error::{Result, ViewerError};

/// A surface point [x, y, z]
pub type Point3 = [f32; 3];

/// A triangle as three indices into the vertex array
pub type Triangle = [u32; 3];

/// Render-ready, immutable mesh buffers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderMesh {
    positions: Vec<f32>,
    indices: Vec<u32>,
    normals: Vec<f32>,
}

/// Axis-aligned bounding box of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds {
    pub fn center(&self) -> Point3 {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Largest side length, used to back the camera off far enough
    pub fn max_extent(&self) -> f32 {
        (self.max[0] - self.min[0])
            .max(self.max[1] - self.min[1])
            .max(self.max[2] - self.min[2])
    }
}

/// Build a render mesh from raw arrays.
///
/// Fails with `MissingGeometry` when either array is empty and with
/// `InvalidTopology` on the first face index outside `[0, vertices.len())`.
pub fn assemble(vertices: &[Point3], faces: &[Triangle]) -> Result<RenderMesh> {
    if vertices.is_empty() || faces.is_empty() {
        return Err(ViewerError::MissingGeometry);
    }

    validate_topology(vertices.len(), faces)?;

    let positions: Vec<f32> = vertices.iter().flatten().copied().collect();
    let indices: Vec<u32> = faces.iter().flatten().copied().collect();
    let normals = vertex_normals(vertices, faces);

    tracing::debug!(
        vertices = vertices.len(),
        faces = faces.len(),
        "Assembled render mesh"
    );

    Ok(RenderMesh {
        positions,
        indices,
        normals,
    })
}

fn validate_topology(vertex_count: usize, faces: &[Triangle]) -> Result<()> {
    for (face, tri) in faces.iter().enumerate() {
        if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ViewerError::InvalidTopology {
                face,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Area-weighted average of adjacent face normals.
///
/// Vertices referenced by no face (or only by degenerate faces) keep a zero
/// normal.
fn vertex_normals(vertices: &[Point3], faces: &[Triangle]) -> Vec<f32> {
    let mut acc = vec![[0.0f32; 3]; vertices.len()];

    for &[a, b, c] in faces {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let n = cross(
            sub(vertices[b], vertices[a]),
            sub(vertices[c], vertices[a]),
        );
        for v in [a, b, c] {
            acc[v][0] += n[0];
            acc[v][1] += n[1];
            acc[v][2] += n[2];
        }
    }

    acc.iter()
        .flat_map(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > 0.0 {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0; 3]
            }
        })
        .collect()
}

impl RenderMesh {
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, index: usize) -> Option<Point3> {
        let start = index.checked_mul(3)?;
        let chunk = self.positions.get(start..start.checked_add(3)?)?;
        Some([chunk[0], chunk[1], chunk[2]])
    }

    pub fn bounds(&self) -> Bounds {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in self.positions.chunks_exact(3) {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Bounds { min, max }
    }
}
