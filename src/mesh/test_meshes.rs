//! Small procedural meshes shared by unit tests.

use nalgebra::Point3;

use super::builder::build_from_triangles;
use super::halfedge::HalfEdgeMesh;
use super::tags::AnatomicalTags;

/// Tag of the outer feature on [`tagged_grid`].
pub const MV_TAG: i32 = 1;
/// Tag of the inner square feature on [`tagged_grid`].
pub const HOLE_TAG: i32 = 2;

/// Vertices and faces of an `n`x`n` unit-cell grid in the z = 0 plane.
///
/// Vertex `(i, j)` has index `j * (n + 1) + i`. Cell diagonals alternate with
/// the cell parity so that no triangle edge connects two corner-adjacent
/// boundary vertices across a corner.
pub fn grid(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let stride = n + 1;
    let vertices = (0..stride)
        .flat_map(|j| (0..stride).map(move |i| Point3::new(i as f64, j as f64, 0.0)))
        .collect();

    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * stride + i;
            let v10 = v00 + 1;
            let v01 = v00 + stride;
            let v11 = v01 + 1;
            if (i + j) % 2 == 0 {
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            } else {
                faces.push([v00, v10, v01]);
                faces.push([v10, v11, v01]);
            }
        }
    }
    (vertices, faces)
}

/// Build the grid of [`grid`] as a half-edge mesh.
pub fn grid_mesh(n: usize) -> HalfEdgeMesh {
    let (vertices, faces) = grid(n);
    build_from_triangles(&vertices, &faces).unwrap()
}

/// A 6x6 grid tagged [`MV_TAG`] everywhere except the central 2x2 cells,
/// which carry [`HOLE_TAG`].
///
/// The hole boundary is the 8-vertex square 16, 17, 18, 25, 32, 31, 30, 23
/// around the centre vertex 24.
pub fn tagged_grid() -> HalfEdgeMesh {
    let n = 6;
    let (vertices, faces) = grid(n);
    let tags = (0..n)
        .flat_map(|j| (0..n).map(move |i| (i, j)))
        .flat_map(|(i, j)| {
            let tag = if (2..4).contains(&i) && (2..4).contains(&j) {
                HOLE_TAG
            } else {
                MV_TAG
            };
            [tag, tag]
        })
        .collect();

    build_from_triangles(&vertices, &faces)
        .unwrap()
        .with_tags(AnatomicalTags::Face(tags))
        .unwrap()
}
