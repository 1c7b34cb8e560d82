//! Anatomical tag fields.
//!
//! Input meshes carry one integer per vertex or per face naming the anatomical
//! structure the element belongs to (mitral valve, pulmonary veins, appendage).
//! Feature boundaries are recovered from these tags.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, VertexId};

/// Mesh element a tag field is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAssociation {
    /// One tag per vertex.
    Vertex,
    /// One tag per face.
    #[default]
    Face,
}

/// Integer anatomical tags, per vertex or per face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnatomicalTags {
    /// One tag per vertex.
    Vertex(Vec<i32>),
    /// One tag per face.
    Face(Vec<i32>),
}

impl AnatomicalTags {
    /// Wrap a raw tag array for the given association.
    pub fn new(association: TagAssociation, values: Vec<i32>) -> Self {
        match association {
            TagAssociation::Vertex => AnatomicalTags::Vertex(values),
            TagAssociation::Face => AnatomicalTags::Face(values),
        }
    }

    /// Number of tag entries.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether the tag array is empty.
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// The raw tag values.
    pub fn values(&self) -> &[i32] {
        match self {
            AnatomicalTags::Vertex(v) | AnatomicalTags::Face(v) => v,
        }
    }

    /// The element kind the tags are attached to.
    pub fn association(&self) -> TagAssociation {
        match self {
            AnatomicalTags::Vertex(_) => TagAssociation::Vertex,
            AnatomicalTags::Face(_) => TagAssociation::Face,
        }
    }

    /// Faces that belong to the feature with the given tag.
    ///
    /// With vertex tags a face belongs to the feature when any of its corners
    /// carries the tag.
    pub fn tagged_faces(&self, mesh: &HalfEdgeMesh, tag: i32) -> Vec<FaceId> {
        match self {
            AnatomicalTags::Face(values) => values
                .iter()
                .enumerate()
                .filter(|&(_, &t)| t == tag)
                .map(|(i, _)| FaceId::new(i))
                .collect(),
            AnatomicalTags::Vertex(values) => mesh
                .face_ids()
                .filter(|&f| mesh.face_triangle(f).iter().any(|v| values[v.index()] == tag))
                .collect(),
        }
    }

    /// Vertices touched by the feature with the given tag.
    pub fn tagged_vertices(&self, mesh: &HalfEdgeMesh, tag: i32) -> BTreeSet<VertexId> {
        self.tagged_faces(mesh, tag)
            .into_iter()
            .flat_map(|f| mesh.face_triangle(f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{grid_mesh, tagged_grid, HOLE_TAG, MV_TAG};

    #[test]
    fn test_face_tags() {
        let mesh = tagged_grid();
        let tags = mesh.tags().unwrap();
        assert_eq!(tags.association(), TagAssociation::Face);
        assert_eq!(tags.len(), mesh.num_faces());

        let hole = tags.tagged_faces(&mesh, HOLE_TAG);
        assert_eq!(hole.len(), 8);
        let mv = tags.tagged_faces(&mesh, MV_TAG);
        assert_eq!(mv.len() + hole.len(), mesh.num_faces());

        let hole_vertices: Vec<usize> = tags
            .tagged_vertices(&mesh, HOLE_TAG)
            .into_iter()
            .map(|v| v.index())
            .collect();
        assert_eq!(hole_vertices, vec![16, 17, 18, 23, 24, 25, 30, 31, 32]);
    }

    #[test]
    fn test_vertex_tags() {
        let mesh = grid_mesh(2);
        // Only the centre vertex is tagged: every face touches it.
        let mut values = vec![0; 9];
        values[4] = 7;
        let tags = AnatomicalTags::new(TagAssociation::Vertex, values);
        assert_eq!(tags.tagged_faces(&mesh, 7).len(), mesh.num_faces());
        assert!(tags.tagged_faces(&mesh, 3).is_empty());
    }

    #[test]
    fn test_tag_count_mismatch() {
        let mesh = grid_mesh(2);
        let result = mesh.with_tags(AnatomicalTags::Face(vec![1, 2, 3]));
        assert!(matches!(
            result,
            Err(crate::error::UacError::TagCountMismatch { expected: 8, found: 3, .. })
        ));
    }
}
