//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists as commonly found
//! in mesh file formats.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{Result, UacError};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid. Non-manifold and
/// inconsistently oriented surfaces are rejected.
///
/// # Example
/// ```
/// use atrium::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<HalfEdgeMesh> {
    if faces.is_empty() {
        return Err(UacError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(UacError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(UacError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    // Map from directed edge (v0, v1) to half-edge ID
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::with_capacity(faces.len() * 3);

    // First pass: create all half-edges and faces
    for face in faces {
        let base = mesh.num_halfedges();
        let ids = [
            HalfEdgeId::new(base),
            HalfEdgeId::new(base + 1),
            HalfEdgeId::new(base + 2),
        ];
        mesh.halfedges.extend([HalfEdge::new(); 3]);

        let face_id = FaceId::new(mesh.num_faces());
        mesh.faces.push(Face::new(ids[0]));

        for k in 0..3 {
            let (from, to) = (face[k], face[(k + 1) % 3]);
            {
                let he = mesh.halfedge_mut(ids[k]);
                he.origin = vertex_ids[from];
                he.next = ids[(k + 1) % 3];
                he.prev = ids[(k + 2) % 3];
                he.face = face_id;
            }
            // Will be overwritten for shared vertices
            mesh.vertex_mut(vertex_ids[from]).halfedge = ids[k];

            if edge_map.insert((from, to), ids[k]).is_some() {
                return Err(UacError::NonManifoldEdge { v0: from, v1: to });
            }
        }
    }

    // Second pass: link twins. Sorted so boundary half-edge ids are deterministic.
    let mut directed: Vec<((usize, usize), HalfEdgeId)> = edge_map.iter().map(|(&k, &v)| (k, v)).collect();
    directed.sort_unstable_by_key(|&(_, he)| he);

    for ((v0, v1), he) in directed {
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary_he = HalfEdgeId::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge::new());

            mesh.halfedge_mut(he).twin = boundary_he;
            let bhe = mesh.halfedge_mut(boundary_he);
            bhe.origin = vertex_ids[v1];
            bhe.twin = he;
        }
    }

    link_boundary_loops(&mut mesh);
    fix_boundary_vertex_halfedges(&mut mesh);

    Ok(mesh)
}

/// Link boundary half-edges into proper loops.
fn link_boundary_loops(mesh: &mut HalfEdgeMesh) {
    let boundary_hes: Vec<HalfEdgeId> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<usize, HalfEdgeId> = HashMap::new();
    for &he in &boundary_hes {
        outgoing.insert(mesh.origin(he).index(), he);
    }

    for &he in &boundary_hes {
        let dest = mesh.dest(he).index();
        if let Some(&next_he) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }
}

/// Ensure boundary vertices point to a boundary half-edge.
fn fix_boundary_vertex_halfedges(mesh: &mut HalfEdgeMesh) {
    for vid in mesh.vertex_ids().collect::<Vec<_>>() {
        let start_he = mesh.vertex(vid).halfedge;
        if !start_he.is_valid() {
            continue;
        }

        let mut he = start_he;
        loop {
            let twin = mesh.twin(he);
            if mesh.is_boundary_halfedge(twin) {
                // `twin` ends at vid; the boundary half-edge leaving vid follows it.
                let out = mesh.next(twin);
                if out.is_valid() {
                    mesh.vertex_mut(vid).halfedge = out;
                }
                break;
            }
            he = mesh.next(twin);
            if he == start_he {
                break;
            }
        }
    }
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns (vertices, faces) tuple.
pub fn to_face_vertex(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [v0.index(), v1.index(), v2.index()]
        })
        .collect();

    (vertices, faces)
}
