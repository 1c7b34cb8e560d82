//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for triangle meshes. The structure gives O(1) adjacency queries, which is what
//! the boundary, routing and flood-fill algorithms lean on.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions
//! - Each half-edge knows its **twin** (opposite half-edge), **next** (next half-edge
//!   around the face), **origin vertex**, and **incident face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one half-edge on its boundary
//!
//! # Boundary Handling
//!
//! Boundary half-edges (on mesh boundaries) have an invalid face ID. Their twins
//! are the interior half-edges. Boundary loops can be traversed using the `next`
//! pointer on boundary half-edges.
//!
//! The mesh is immutable once built: the coordinate pipeline only reads it.

use nalgebra::Point3;

use super::index::{FaceId, HalfEdgeId, VertexId};
use super::tags::AnatomicalTags;
use crate::error::{Result, UacError};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    pub halfedge: HalfEdgeId,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId,

    /// The previous half-edge around the face (clockwise).
    pub prev: HalfEdgeId,

    /// The face this half-edge belongs to.
    /// Invalid for boundary half-edges.
    pub face: FaceId,
}

impl HalfEdge {
    /// Create a new uninitialized half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId,
}

impl Face {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId) -> Self {
        Self { halfedge }
    }
}

/// A half-edge mesh for tagged triangle surfaces.
///
/// Besides connectivity and positions, the mesh optionally carries the
/// anatomical tag field used to extract feature boundaries.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    /// All vertices in the mesh.
    pub(crate) vertices: Vec<Vertex>,

    /// All half-edges in the mesh.
    pub(crate) halfedges: Vec<HalfEdge>,

    /// All faces in the mesh.
    pub(crate) faces: Vec<Face>,

    /// Anatomical tags, per vertex or per face.
    pub(crate) tags: Option<AnatomicalTags>,
}

impl HalfEdgeMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed mesh: HE = 3F; leave slack for boundary half-edges.
        let num_halfedges = num_faces * 3 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
            tags: None,
        }
    }

    /// Attach an anatomical tag field to the mesh.
    ///
    /// Fails if the number of tags does not match the element count.
    pub fn with_tags(mut self, tags: AnatomicalTags) -> Result<Self> {
        let (element, expected) = match &tags {
            AnatomicalTags::Vertex(_) => ("vertices", self.num_vertices()),
            AnatomicalTags::Face(_) => ("faces", self.num_faces()),
        };
        if tags.len() != expected {
            return Err(UacError::TagCountMismatch {
                element,
                expected,
                found: tags.len(),
            });
        }
        self.tags = Some(tags);
        Ok(self)
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the anatomical tags, if any.
    #[inline]
    pub fn tags(&self) -> Option<&AnatomicalTags> {
        self.tags.as_ref()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.twin(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId) -> FaceId {
        self.halfedge(he).face
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true; // Isolated vertex
        }
        // Boundary vertices always point at their boundary half-edge.
        self.is_boundary_halfedge(start) || self.vertex_halfedges(v).any(|he| self.is_boundary_halfedge(he))
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over every undirected edge exactly once.
    ///
    /// Each edge is represented by the half-edge with the lower index, so the
    /// order is deterministic for a given mesh.
    pub fn edges(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.halfedge_ids()
            .filter(move |&he| he.index() < self.twin(he).index())
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId) -> VertexHalfEdgeIter<'_> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId) -> FaceHalfEdgeIter<'_> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Get the three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId) -> [VertexId; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the faces across each edge of a face, in half-edge order.
    ///
    /// Entries are `None` where the edge lies on the mesh boundary.
    pub fn face_neighbors(&self, f: FaceId) -> [Option<FaceId>; 3] {
        let mut neighbors = [None; 3];
        for (slot, he) in neighbors.iter_mut().zip(self.face_halfedges(f)) {
            let across = self.face_of(self.twin(he));
            if across.is_valid() {
                *slot = Some(across);
            }
        }
        neighbors
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId) -> f64 {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        (p1 - p0).norm()
    }

    /// Euclidean distance between two vertices.
    #[inline]
    pub fn distance(&self, a: VertexId, b: VertexId) -> f64 {
        (self.position(b) - self.position(a)).norm()
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub(crate) fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        for (i, v) in self.vertices.iter().enumerate() {
            if v.halfedge.is_valid() && self.halfedge(v.halfedge).origin != VertexId::new(i) {
                return false;
            }
        }

        for (i, he) in self.halfedges.iter().enumerate() {
            let id = HalfEdgeId::new(i);
            if he.twin.is_valid() && self.halfedge(he.twin).twin != id {
                return false;
            }
            if he.next.is_valid() && self.halfedge(he.next).prev != id {
                return false;
            }
            if he.prev.is_valid() && self.halfedge(he.prev).next != id {
                return false;
            }
        }

        self.faces.iter().all(|f| f.halfedge.is_valid())
    }
}

/// Iterator over half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> VertexHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, v: VertexId) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for VertexHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // twin(he) ends at v; the half-edge after it in its face leaves v again.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> FaceHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, f: FaceId) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for FaceHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::grid_mesh;

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_valid());
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_unique_edges() {
        // 2x2 cells: 12 unique edges on the lattice plus 4 diagonals.
        let mesh = grid_mesh(2);
        assert_eq!(mesh.edges().count(), 16);
        for he in mesh.edges() {
            assert!(he.index() < mesh.twin(he).index());
        }
    }

    #[test]
    fn test_boundary_vertices_of_grid() {
        let mesh = grid_mesh(2);
        let boundary: Vec<usize> = mesh
            .vertex_ids()
            .filter(|&v| mesh.is_boundary_vertex(v))
            .map(|v| v.index())
            .collect();
        assert_eq!(boundary, vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_face_neighbors() {
        let mesh = grid_mesh(2);
        for f in mesh.face_ids() {
            let neighbors = mesh.face_neighbors(f);
            let count = neighbors.iter().flatten().count();
            // Every grid triangle has at least one neighbour and at most three.
            assert!((1..=3).contains(&count), "face {:?} has {} neighbours", f, count);
            for n in neighbors.iter().flatten() {
                assert!(mesh.face_neighbors(*n).contains(&Some(f)));
            }
        }
    }

    #[test]
    fn test_surface_area() {
        let mesh = grid_mesh(3);
        assert!((mesh.surface_area() - 9.0).abs() < 1e-12);
    }
}
