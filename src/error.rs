//! Error types for atrium.
//!
//! This module defines all error types used throughout the library. Every
//! pipeline failure is surfaced immediately; there is no silent recovery and
//! no partial artifact is committed for a failing key.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::{ArtifactKind, KeyPath};
use crate::workflow::StageKind;

/// Result type alias using [`UacError`].
pub type Result<T> = std::result::Result<T, UacError>;

/// Errors that can occur while building meshes or deriving coordinates.
#[derive(Error, Debug)]
pub enum UacError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge is used by more than one face.
    #[error("edge ({v0}, {v1}) is shared by more than two faces or has inconsistent orientation")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// The mesh carries no anatomical tags.
    #[error("mesh has no anatomical tags")]
    MissingTags,

    /// The tag array does not match the number of mesh elements.
    #[error("tag array has {found} entries but the mesh has {expected} {element}")]
    TagCountMismatch {
        /// Element kind the tags are attached to.
        element: &'static str,
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        found: usize,
    },

    /// A stage referenced a key that the schema never declared.
    #[error("{kind} {key} is not declared in the schema")]
    UnknownKey {
        /// The artifact namespace that was searched.
        kind: ArtifactKind,
        /// The offending key path.
        key: KeyPath,
    },

    /// A stage referenced an artifact that has not been produced yet.
    #[error("{kind} {key} has not been constructed yet")]
    MissingArtifact {
        /// The artifact namespace that was searched.
        kind: ArtifactKind,
        /// The offending key path.
        key: KeyPath,
    },

    /// An artifact slot holds a different variant than requested.
    #[error("{key} holds a {found}, expected a {expected}")]
    ArtifactKindMismatch {
        /// The key path.
        key: KeyPath,
        /// Requested variant.
        expected: ArtifactKind,
        /// Stored variant.
        found: ArtifactKind,
    },

    /// An index-mode marker position lies outside its path.
    #[error("index {position} out of bounds for path of length {len}")]
    IndexOutOfBounds {
        /// Requested (possibly negative) position.
        position: i64,
        /// Length of the path.
        len: usize,
    },

    /// A relative position has no matching entry on a parameterized path.
    #[error("relative position {position} not found on path (maximum relative length {max})")]
    UnresolvedRelativePosition {
        /// Requested relative position.
        position: f64,
        /// Largest relative length present on the path.
        max: f64,
    },

    /// No admissible path connects the two vertex subsets.
    #[error("no admissible path connects the {start_count} start vertices to the {end_count} end vertices")]
    DisconnectedSubsets {
        /// Number of start vertices.
        start_count: usize,
        /// Number of end vertices.
        end_count: usize,
    },

    /// Boundary loop segments do not close.
    #[error("boundary segments do not form a closed loop ({remaining} segments left unattached)")]
    OpenLoop {
        /// Number of segments that could not be attached.
        remaining: usize,
    },

    /// A boundary could not be ordered into a simple path or cycle.
    #[error("malformed boundary: {reason}")]
    MalformedBoundary {
        /// Description of the defect.
        reason: String,
    },

    /// Marker order is inconsistent with any orientation of the path.
    #[error("marker order is inconsistent with the path: {reason}")]
    InconsistentMarkers {
        /// Description of the inconsistency.
        reason: String,
    },

    /// A marker vertex does not lie on the path being parameterized.
    #[error("marker vertex {vertex} does not lie on the path")]
    MarkerNotOnPath {
        /// The global vertex index.
        vertex: usize,
    },

    /// No region lies on the inside of a boundary loop.
    #[error("no region found inside the boundary loop: {reason}")]
    RegionNotFound {
        /// Description of the failure.
        reason: String,
    },

    /// A boundary vertex is not part of the submesh it constrains.
    #[error("boundary vertex {vertex} is not a member of the submesh")]
    BoundaryVertexOutsideSubmesh {
        /// The global vertex index.
        vertex: usize,
    },

    /// A pipeline stage failed for a specific key.
    #[error("{stage} failed for {key}: {source}")]
    Stage {
        /// The stage that failed.
        stage: StageKind,
        /// The key being processed.
        key: KeyPath,
        /// Underlying failure.
        #[source]
        source: Box<UacError>,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving results to file.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// A configuration, schema or workflow file could not be parsed or is inconsistent.
    #[error("invalid configuration in {path}: {message}")]
    Config {
        /// The file path (or a descriptive label for in-memory sources).
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Algorithm failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl UacError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        UacError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a malformed boundary error.
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        UacError::MalformedBoundary {
            reason: reason.into(),
        }
    }

    /// Attach stage and key context to an error.
    pub fn in_stage(self, stage: StageKind, key: &KeyPath) -> Self {
        UacError::Stage {
            stage,
            key: key.clone(),
            source: Box::new(self),
        }
    }

    /// Strip any stage context and return the underlying error.
    pub fn root_cause(&self) -> &UacError {
        match self {
            UacError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
