//! Connectivity queries over a half-edge mesh.
//!
//! These are the read-only set operations the coordinate pipeline needs:
//! unique edges, boundary vertices of the mesh or of a face subset, and
//! vertex-connected components once a vertex set has been cut out.

use std::collections::{BTreeSet, HashSet, VecDeque};

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, VertexId};

/// Every undirected edge of the mesh as an `(origin, destination)` pair.
pub fn edge_set(mesh: &HalfEdgeMesh) -> Vec<(VertexId, VertexId)> {
    mesh.edges().map(|he| (mesh.origin(he), mesh.dest(he))).collect()
}

/// Vertices on the boundary of the whole mesh.
pub fn mesh_boundary_vertices(mesh: &HalfEdgeMesh) -> BTreeSet<VertexId> {
    mesh.halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .map(|he| mesh.origin(he))
        .collect()
}

/// Edges that belong to exactly one face of the given face subset.
pub fn boundary_edges_of_faces(mesh: &HalfEdgeMesh, faces: &[FaceId]) -> Vec<(VertexId, VertexId)> {
    let members: HashSet<FaceId> = faces.iter().copied().collect();
    let mut edges = Vec::new();
    for &f in faces {
        for he in mesh.face_halfedges(f) {
            let across = mesh.face_of(mesh.twin(he));
            if !members.contains(&across) {
                edges.push((mesh.origin(he), mesh.dest(he)));
            }
        }
    }
    edges
}

/// Connected components of the vertex graph after removing `removed`.
///
/// Components are returned in order of their smallest vertex index and each
/// component is sorted.
pub fn vertex_components(mesh: &HalfEdgeMesh, removed: &HashSet<VertexId>) -> Vec<Vec<VertexId>> {
    let mut component_of = vec![usize::MAX; mesh.num_vertices()];
    let mut components = Vec::new();

    for seed in mesh.vertex_ids() {
        if removed.contains(&seed) || component_of[seed.index()] != usize::MAX {
            continue;
        }
        let id = components.len();
        let mut members = vec![seed];
        let mut queue = VecDeque::from([seed]);
        component_of[seed.index()] = id;

        while let Some(v) = queue.pop_front() {
            for n in mesh.vertex_neighbors(v) {
                if removed.contains(&n) || component_of[n.index()] != usize::MAX {
                    continue;
                }
                component_of[n.index()] = id;
                members.push(n);
                queue.push_back(n);
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{grid_mesh, tagged_grid, HOLE_TAG};

    #[test]
    fn test_mesh_boundary_of_grid() {
        let mesh = grid_mesh(3);
        let boundary = mesh_boundary_vertices(&mesh);
        assert_eq!(boundary.len(), 12);
        assert!(!boundary.contains(&VertexId::new(5)));
        assert!(!boundary.contains(&VertexId::new(10)));
    }

    #[test]
    fn test_edge_set_is_unique() {
        let mesh = grid_mesh(3);
        let edges = edge_set(&mesh);
        let mut keys: Vec<(VertexId, VertexId)> = edges
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), edges.len());
        // V - E + F = 1 for a disc
        assert_eq!(16 - edges.len() as i64 + 18, 1);
    }

    #[test]
    fn test_boundary_edges_of_tagged_faces() {
        let mesh = tagged_grid();
        let faces = mesh.tags().unwrap().tagged_faces(&mesh, HOLE_TAG);
        let edges = boundary_edges_of_faces(&mesh, &faces);
        assert_eq!(edges.len(), 8);

        let vertices: BTreeSet<usize> = edges
            .iter()
            .flat_map(|&(a, b)| [a.index(), b.index()])
            .collect();
        assert_eq!(
            vertices.into_iter().collect::<Vec<_>>(),
            vec![16, 17, 18, 23, 25, 30, 31, 32]
        );
    }

    #[test]
    fn test_components_after_cut() {
        let mesh = tagged_grid();
        let ring: HashSet<VertexId> = [16, 17, 18, 25, 32, 31, 30, 23]
            .into_iter()
            .map(VertexId::new)
            .collect();
        let components = vertex_components(&mesh, &ring);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 49 - 8 - 1);
        assert_eq!(components[1], vec![VertexId::new(24)]);
    }
}
