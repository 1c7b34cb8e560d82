//! Extraction of the face region enclosed by a boundary loop.
//!
//! The inside of the loop is found topologically: with the loop vertices cut
//! out, the mesh falls apart into vertex components, and the inside is a
//! component that does not contain a vertex known to lie outside. A face
//! touching that component seeds a flood fill that may cross any edge except
//! the loop's own edges.

use std::collections::HashSet;

use crate::artifact::Submesh;
use crate::error::{Result, UacError};
use crate::mesh::{vertex_components, FaceId, HalfEdgeMesh, VertexId};

#[inline]
fn undirected(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Pick a face inside `boundary`, using `outside` to tell the sides apart.
pub fn inside_seed(mesh: &HalfEdgeMesh, boundary: &[VertexId], outside: VertexId) -> Result<FaceId> {
    let removed: HashSet<VertexId> = boundary.iter().copied().collect();
    if removed.contains(&outside) {
        return Err(UacError::RegionNotFound {
            reason: format!("outside reference {outside} lies on the boundary loop"),
        });
    }

    let components = vertex_components(mesh, &removed);
    log::debug!(
        "boundary of {} vertices splits the mesh into {} components",
        boundary.len(),
        components.len()
    );
    let inside = components
        .iter()
        .find(|c| c.binary_search(&outside).is_err())
        .ok_or_else(|| UacError::RegionNotFound {
            reason: format!(
                "all {} components contain the outside reference {outside}",
                components.len()
            ),
        })?;

    inside
        .iter()
        .find_map(|&v| mesh.vertex_faces(v).next())
        .ok_or_else(|| UacError::RegionNotFound {
            reason: "inside component touches no face".to_string(),
        })
}

/// Flood-fill the faces reachable from `seed` without crossing a loop edge.
///
/// Uses an explicit stack. Returned faces are sorted by index.
pub fn flood_fill(mesh: &HalfEdgeMesh, boundary: &[VertexId], seed: FaceId) -> Vec<FaceId> {
    let n = boundary.len();
    let barrier: HashSet<(VertexId, VertexId)> = (0..n)
        .map(|i| undirected(boundary[i], boundary[(i + 1) % n]))
        .collect();

    let mut visited = vec![false; mesh.num_faces()];
    let mut region = Vec::new();
    let mut stack = vec![seed];
    visited[seed.index()] = true;

    while let Some(f) = stack.pop() {
        region.push(f);
        for he in mesh.face_halfedges(f) {
            if barrier.contains(&undirected(mesh.origin(he), mesh.dest(he))) {
                continue;
            }
            let across = mesh.face_of(mesh.twin(he));
            if across.is_valid() && !visited[across.index()] {
                visited[across.index()] = true;
                stack.push(across);
            }
        }
    }

    region.sort_unstable();
    region
}

/// Build a submesh from a set of faces, renumbering its vertices locally.
pub fn submesh_from_faces(mesh: &HalfEdgeMesh, faces: Vec<FaceId>) -> Submesh {
    let mut vertices: Vec<VertexId> = faces
        .iter()
        .flat_map(|&f| mesh.face_triangle(f))
        .collect();
    vertices.sort_unstable();
    vertices.dedup();

    let local = |v: VertexId| vertices.binary_search(&v).unwrap_or_default();
    let local_faces = faces
        .iter()
        .map(|&f| {
            let [a, b, c] = mesh.face_triangle(f);
            [local(a), local(b), local(c)]
        })
        .collect();

    Submesh {
        vertices,
        faces: local_faces,
        face_indices: faces,
    }
}

/// Extract the submesh enclosed by `boundary`.
pub fn extract_region(mesh: &HalfEdgeMesh, boundary: &[VertexId], outside: VertexId) -> Result<Submesh> {
    if boundary.len() < 3 {
        return Err(UacError::malformed(format!(
            "a boundary loop needs at least 3 vertices, got {}",
            boundary.len()
        )));
    }
    let seed = inside_seed(mesh, boundary, outside)?;
    let faces = flood_fill(mesh, boundary, seed);
    log::debug!("flood fill from face {:?} reached {} faces", seed, faces.len());
    Ok(submesh_from_faces(mesh, faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{grid_mesh, tagged_grid, HOLE_TAG};
    use crate::mesh::vertex_ids;

    fn hole_loop() -> Vec<VertexId> {
        vertex_ids(&[16, 17, 18, 25, 32, 31, 30, 23])
    }

    #[test]
    fn test_inner_square() {
        let mesh = tagged_grid();
        let sub = extract_region(&mesh, &hole_loop(), VertexId::new(0)).unwrap();

        let expected = mesh.tags().unwrap().tagged_faces(&mesh, HOLE_TAG);
        assert_eq!(sub.face_indices, expected);
        assert_eq!(sub.faces.len(), 8);
        assert_eq!(
            sub.vertices,
            vertex_ids(&[16, 17, 18, 23, 24, 25, 30, 31, 32])
        );
        // Local faces point back at the same global vertices.
        for (local, &f) in sub.faces.iter().zip(&sub.face_indices) {
            let global = mesh.face_triangle(f);
            for k in 0..3 {
                assert_eq!(sub.vertices[local[k]], global[k]);
            }
        }
    }

    #[test]
    fn test_complement_partitions_faces() {
        let mesh = tagged_grid();
        let loop_vertices = hole_loop();

        // Outside reference inside the hole selects the outer ring.
        let outer = extract_region(&mesh, &loop_vertices, VertexId::new(24)).unwrap();
        let inner = extract_region(&mesh, &loop_vertices, VertexId::new(0)).unwrap();
        assert_eq!(outer.faces.len() + inner.faces.len(), mesh.num_faces());

        let inner_set: HashSet<FaceId> = inner.face_indices.iter().copied().collect();
        assert!(outer.face_indices.iter().all(|f| !inner_set.contains(f)));
    }

    #[test]
    fn test_open_cut_has_no_inside() {
        let mesh = grid_mesh(3);
        // A single boundary row does not separate anything.
        let result = extract_region(&mesh, &vertex_ids(&[0, 1, 2, 3]), VertexId::new(15));
        assert!(matches!(result, Err(UacError::RegionNotFound { .. })));
    }

    #[test]
    fn test_outside_reference_on_loop() {
        let mesh = tagged_grid();
        let result = extract_region(&mesh, &hole_loop(), VertexId::new(16));
        assert!(matches!(result, Err(UacError::RegionNotFound { .. })));
    }

    #[test]
    fn test_large_grid_does_not_recurse() {
        let mesh = grid_mesh(120);
        // Whole-perimeter loop.
        let n = 120;
        let stride = n + 1;
        let mut perimeter: Vec<usize> = (0..=n).collect();
        perimeter.extend((1..=n).map(|j| j * stride + n));
        perimeter.extend((0..n).rev().map(|i| n * stride + i));
        perimeter.extend((1..n).rev().map(|j| j * stride));
        let perimeter = vertex_ids(&perimeter);

        let seed = mesh.vertex_faces(VertexId::new(stride + 1)).next().unwrap();
        let faces = flood_fill(&mesh, &perimeter, seed);
        assert_eq!(faces.len(), mesh.num_faces());
    }
}
