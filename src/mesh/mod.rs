//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation, the anatomical tag
//! field attached to it, and the connectivity queries the coordinate pipeline
//! is built on.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a triangle mesh using
//! a half-edge (doubly-connected edge list) data structure. The mesh is read-only
//! once built; every stage of the pipeline borrows it immutably.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex; this is the global index used by all artifacts
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! ```
//! use atrium::mesh::{AnatomicalTags, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh = build_from_triangles(&vertices, &faces)
//!     .unwrap()
//!     .with_tags(AnatomicalTags::Face(vec![1]))
//!     .unwrap();
//! assert_eq!(mesh.tags().unwrap().len(), 1);
//! ```

mod builder;
mod halfedge;
mod index;
mod query;
mod tags;

#[cfg(test)]
pub(crate) mod test_meshes;

pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
pub use index::{vertex_ids, FaceId, HalfEdgeId, VertexId};
pub use query::{boundary_edges_of_faces, edge_set, mesh_boundary_vertices, vertex_components};
pub use tags::{AnatomicalTags, TagAssociation};
