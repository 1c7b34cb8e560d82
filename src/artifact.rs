//! Pipeline artifacts.
//!
//! Every intermediate the coordinate pipeline produces is one of the variants
//! of [`Artifact`]. Vertex references are always global mesh indices.

use serde::Serialize;

use crate::error::{Result, UacError};
use crate::mesh::{FaceId, VertexId};
use crate::store::ArtifactKind;

/// An ordered vertex curve on the mesh.
///
/// Closed paths do not repeat their first vertex at the end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawPath {
    /// Vertices in traversal order.
    pub vertices: Vec<VertexId>,
    /// Whether the last vertex connects back to the first.
    pub closed: bool,
}

impl RawPath {
    /// An open path.
    pub fn open(vertices: Vec<VertexId>) -> Self {
        Self { vertices, closed: false }
    }

    /// A closed loop.
    pub fn closed(vertices: Vec<VertexId>) -> Self {
        Self { vertices, closed: true }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A single named mesh vertex.
pub type Marker = VertexId;

/// A path with a relative arc-length value per vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedPath {
    /// Vertices in parameterization order.
    pub vertices: Vec<VertexId>,
    /// Relative length in `[0, 1]`, non-decreasing.
    pub relative_lengths: Vec<f64>,
}

/// A parameterized path with explicit UAC values per vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatePath {
    /// Vertices in parameterization order.
    pub vertices: Vec<VertexId>,
    /// Relative length per vertex.
    pub relative_lengths: Vec<f64>,
    /// First coordinate component.
    pub alpha: Vec<f64>,
    /// Second coordinate component.
    pub beta: Vec<f64>,
}

impl CoordinatePath {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the path has no entries.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Keep the entries whose relative length lies in `[lo, hi]`.
    pub fn portion(&self, lo: f64, hi: f64) -> Result<CoordinatePath> {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| lo <= self.relative_lengths[i] && self.relative_lengths[i] <= hi)
            .collect();
        if keep.is_empty() {
            return Err(UacError::malformed(format!(
                "portion [{lo}, {hi}] selects no vertices"
            )));
        }
        Ok(CoordinatePath {
            vertices: keep.iter().map(|&i| self.vertices[i]).collect(),
            relative_lengths: keep.iter().map(|&i| self.relative_lengths[i]).collect(),
            alpha: keep.iter().map(|&i| self.alpha[i]).collect(),
            beta: keep.iter().map(|&i| self.beta[i]).collect(),
        })
    }

    /// Reverse all parallel arrays in place.
    pub fn reverse(&mut self) {
        self.vertices.reverse();
        self.relative_lengths.reverse();
        self.alpha.reverse();
        self.beta.reverse();
    }
}

/// A closed loop of unique vertices with UAC values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmeshBoundary {
    /// Loop vertices; the last connects back to the first.
    pub vertices: Vec<VertexId>,
    /// First coordinate component.
    pub alpha: Vec<f64>,
    /// Second coordinate component.
    pub beta: Vec<f64>,
}

/// A connected face region cut out of the mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submesh {
    /// Global indices of the submesh vertices, ascending. Position `i` is local vertex `i`.
    pub vertices: Vec<VertexId>,
    /// Triangles in local vertex indices.
    pub faces: Vec<[usize; 3]>,
    /// Global index of every submesh face.
    pub face_indices: Vec<FaceId>,
}

impl Submesh {
    /// Local index of a global vertex, if it belongs to the submesh.
    pub fn local_index(&self, v: VertexId) -> Option<usize> {
        self.vertices.binary_search(&v).ok()
    }
}

/// A submesh with UAC values on every vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateSubmesh {
    /// The region.
    pub submesh: Submesh,
    /// First coordinate component per local vertex.
    pub alpha: Vec<f64>,
    /// Second coordinate component per local vertex.
    pub beta: Vec<f64>,
}

/// Any pipeline artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// An ordered vertex curve.
    RawPath(RawPath),
    /// A single vertex.
    Marker {
        /// The marked vertex.
        vertex: Marker,
    },
    /// A path with relative lengths.
    ParameterizedPath(ParameterizedPath),
    /// A path with UAC values.
    CoordinatePath(CoordinatePath),
    /// A stitched closed loop.
    SubmeshBoundary(SubmeshBoundary),
    /// An extracted region.
    Submesh(Submesh),
    /// A region with UAC values.
    CoordinateSubmesh(CoordinateSubmesh),
}

impl Artifact {
    /// The namespace this artifact lives in.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::RawPath(_) => ArtifactKind::RawPath,
            Artifact::Marker { .. } => ArtifactKind::Marker,
            Artifact::ParameterizedPath(_) => ArtifactKind::ParameterizedPath,
            Artifact::CoordinatePath(_) => ArtifactKind::CoordinatePath,
            Artifact::SubmeshBoundary(_) => ArtifactKind::SubmeshBoundary,
            Artifact::Submesh(_) => ArtifactKind::Submesh,
            Artifact::CoordinateSubmesh(_) => ArtifactKind::CoordinateSubmesh,
        }
    }
}
