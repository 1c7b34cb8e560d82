//! # Atrium
//!
//! Universal atrial coordinates on tagged triangle surface meshes.
//!
//! Atrium assigns every vertex of a left-atrial surface mesh a pair of
//! coordinates `(alpha, beta)` in the unit square. Anatomical features (mitral
//! valve, pulmonary veins, appendage) are recovered from integer tags, joined
//! by constrained shortest paths, parameterized by arc length, and the interior
//! of each resulting region is filled by a harmonic extension.
//!
//! ## Pipeline
//!
//! A declarative [`schema::Schema`] names every artifact of a run; a
//! [`workflow::Workflow`] orders the segmentation stages. The
//! [`construct::UacConstructor`] executes both against an
//! [`store::ArtifactStore`]:
//!
//! 1. Feature extraction and shortest paths ([`algo::boundary`], [`algo::route`])
//! 2. Markers ([`algo::marker`])
//! 3. Parameterization and coordinate assignment ([`algo::parameterize`],
//!    [`algo::coordinates`])
//! 4. Submesh boundaries, submeshes and harmonic extension ([`algo::stitch`],
//!    [`algo::region`], [`algo::harmonic`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use atrium::prelude::*;
//! use atrium::mesh::TagAssociation;
//! use std::collections::BTreeMap;
//!
//! let mesh = atrium::io::load_tagged("atrium.ply", "anatomical_tags", TagAssociation::Face).unwrap();
//! let schema = Schema::left_atrium().unwrap();
//! let workflow = Workflow::left_atrium().unwrap();
//!
//! let tags: BTreeMap<String, i32> = [("MV", 1), ("LAA", 2), ("LIPV", 3), ("LSPV", 4), ("RSPV", 5), ("RIPV", 6)]
//!     .into_iter()
//!     .map(|(name, tag)| (name.to_string(), tag))
//!     .collect();
//! let mut constructor = UacConstructor::new(&mesh, &schema).with_feature_tags(tags);
//! constructor.construct_segmentation(&workflow).unwrap();
//! constructor.construct_uacs().unwrap();
//!
//! atrium::io::save_results(&mesh, constructor.store(), "output").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use atrium::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh = build_from_triangles(&vertices, &faces)
//!     .unwrap()
//!     .with_tags(AnatomicalTags::Face(vec![1, 2]))
//!     .unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod artifact;
pub mod config;
pub mod construct;
pub mod error;
pub mod io;
pub mod mesh;
pub mod schema;
pub mod store;
pub mod workflow;

/// Prelude module for convenient imports.
///
/// ```
/// use atrium::prelude::*;
/// ```
pub mod prelude {
    pub use crate::artifact::Artifact;
    pub use crate::construct::UacConstructor;
    pub use crate::error::{Result, UacError};
    pub use crate::mesh::{
        build_from_triangles, AnatomicalTags, FaceId, HalfEdgeId, HalfEdgeMesh, VertexId,
    };
    pub use crate::schema::Schema;
    pub use crate::store::{ArtifactKind, ArtifactStore, KeyPath};
    pub use crate::workflow::Workflow;
}

// Re-export nalgebra types for convenience
pub use nalgebra;
