//! Ordered boundaries of tagged regions.
//!
//! The boundary of a feature is found as a vertex set first: the vertices on
//! edges that belong to exactly one tagged face, intersected with the mesh
//! boundary (for features that reach the mesh boundary, such as the mitral
//! valve) or with the mesh boundary removed (for features whose rim lies inside
//! the surface). The set is then ordered by walking the edges the mesh has
//! between its members.

use std::collections::{BTreeMap, BTreeSet};

use crate::artifact::RawPath;
use crate::error::{Result, UacError};
use crate::mesh::{boundary_edges_of_faces, mesh_boundary_vertices, HalfEdgeMesh, VertexId};

/// Extract the ordered boundary of the faces carrying `tag`.
pub fn feature_boundary(mesh: &HalfEdgeMesh, tag: i32, coincides_with_mesh_boundary: bool) -> Result<RawPath> {
    let tags = mesh.tags().ok_or(UacError::MissingTags)?;
    let faces = tags.tagged_faces(mesh, tag);
    if faces.is_empty() {
        return Err(UacError::malformed(format!("no faces carry tag {tag}")));
    }

    let feature_points: BTreeSet<VertexId> = boundary_edges_of_faces(mesh, &faces)
        .into_iter()
        .flat_map(|(a, b)| [a, b])
        .collect();
    let mesh_points = mesh_boundary_vertices(mesh);

    let points: BTreeSet<VertexId> = if coincides_with_mesh_boundary {
        feature_points.intersection(&mesh_points).copied().collect()
    } else {
        feature_points.difference(&mesh_points).copied().collect()
    };
    log::debug!(
        "feature {} has {} boundary vertices ({} on the mesh boundary)",
        tag,
        points.len(),
        feature_points.len() - feature_points.difference(&mesh_points).count()
    );

    order_boundary(mesh, &points)
}

/// Order a vertex set into a single path along mesh edges.
///
/// The edges of the mesh with both endpoints in `points` must form one simple
/// cycle or one simple chain. A cycle starts at its smallest vertex; a chain
/// starts at its smaller endpoint. Ties between neighbours are walked in
/// ascending order.
pub fn order_boundary(mesh: &HalfEdgeMesh, points: &BTreeSet<VertexId>) -> Result<RawPath> {
    let first = *points
        .first()
        .ok_or_else(|| UacError::malformed("boundary vertex set is empty"))?;
    if points.len() == 1 {
        return Ok(RawPath::open(vec![first]));
    }

    let mut neighbors: BTreeMap<VertexId, BTreeSet<VertexId>> =
        points.iter().map(|&v| (v, BTreeSet::new())).collect();
    for he in mesh.edges() {
        let (a, b) = (mesh.origin(he), mesh.dest(he));
        if points.contains(&a) && points.contains(&b) {
            neighbors.entry(a).or_default().insert(b);
            neighbors.entry(b).or_default().insert(a);
        }
    }

    if let Some((v, n)) = neighbors.iter().find(|(_, n)| n.len() > 2) {
        return Err(UacError::malformed(format!(
            "vertex {} has {} boundary neighbours",
            v,
            n.len()
        )));
    }
    let endpoints: Vec<VertexId> = neighbors
        .iter()
        .filter(|(_, n)| n.len() < 2)
        .map(|(&v, _)| v)
        .collect();
    let closed = match endpoints.len() {
        0 => true,
        2 => false,
        k => {
            return Err(UacError::malformed(format!(
                "boundary has {k} chain ends, expected a single cycle or chain"
            )))
        }
    };

    let start = if closed { first } else { endpoints[0] };

    // Iterative depth-first walk.
    let mut visited: BTreeSet<VertexId> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(points.len());
    let mut stack = vec![start];
    while let Some(v) = stack.pop() {
        if !visited.insert(v) {
            continue;
        }
        ordered.push(v);
        // Reverse so the smallest unvisited neighbour is popped first.
        for &n in neighbors[&v].iter().rev() {
            if !visited.contains(&n) {
                stack.push(n);
            }
        }
    }

    if ordered.len() != points.len() {
        return Err(UacError::malformed(format!(
            "boundary is disconnected: reached {} of {} vertices",
            ordered.len(),
            points.len()
        )));
    }

    Ok(RawPath {
        vertices: ordered,
        closed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{grid_mesh, tagged_grid, HOLE_TAG, MV_TAG};
    use crate::mesh::vertex_ids;

    #[test]
    fn test_inner_feature_boundary() {
        let mesh = tagged_grid();
        let path = feature_boundary(&mesh, HOLE_TAG, false).unwrap();
        assert!(path.closed);
        assert_eq!(path.vertices, vertex_ids(&[16, 17, 18, 25, 32, 31, 30, 23]));
    }

    #[test]
    fn test_feature_on_mesh_boundary() {
        let mesh = tagged_grid();
        let path = feature_boundary(&mesh, MV_TAG, true).unwrap();
        assert!(path.closed);
        assert_eq!(path.len(), 24);
        assert_eq!(&path.vertices[..8], &vertex_ids(&[0, 1, 2, 3, 4, 5, 6, 13])[..]);
        assert_eq!(path.vertices[23], VertexId::new(7));

        // Consecutive vertices are mesh neighbours, including the closing pair.
        for i in 0..path.len() {
            let a = path.vertices[i];
            let b = path.vertices[(i + 1) % path.len()];
            assert!(mesh.vertex_neighbors(a).any(|n| n == b));
        }
    }

    #[test]
    fn test_open_chain() {
        let mesh = grid_mesh(3);
        let points: BTreeSet<VertexId> = vertex_ids(&[3, 2, 1, 0]).into_iter().collect();
        let path = order_boundary(&mesh, &points).unwrap();
        assert!(!path.closed);
        assert_eq!(path.vertices, vertex_ids(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_branching_set_is_malformed() {
        let mesh = grid_mesh(3);
        // A T shape: 1 has three neighbours in the set.
        let points: BTreeSet<VertexId> = vertex_ids(&[0, 1, 2, 5]).into_iter().collect();
        let result = order_boundary(&mesh, &points);
        assert!(matches!(result, Err(UacError::MalformedBoundary { .. })));
    }

    #[test]
    fn test_missing_tag() {
        let mesh = tagged_grid();
        assert!(matches!(
            feature_boundary(&mesh, 99, false),
            Err(UacError::MalformedBoundary { .. })
        ));
        assert!(matches!(
            feature_boundary(&grid_mesh(2), 1, false),
            Err(UacError::MissingTags)
        ));
    }
}
