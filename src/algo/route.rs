//! Constrained shortest paths between vertex subsets.
//!
//! Paths are searched on the edge graph of the mesh with Euclidean edge
//! lengths as weights. Two kinds of constraint remove edges before the search:
//!
//! - **contact**: an edge touching any contact vertex is removed, so the path
//!   never visits those vertices
//! - **along**: an edge whose two endpoints are both along-vertices is removed,
//!   so the path may cross such a curve but never run along it
//!
//! Among all (start, end) pairs the pair with the smallest distance wins. Ties
//! go to the first start vertex in the given order, then to the first end
//! vertex.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use rayon::prelude::*;
use serde::Deserialize;

use crate::artifact::RawPath;
use crate::error::{Result, UacError};
use crate::mesh::{HalfEdgeMesh, VertexId};

/// Options for the path router.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteOptions {
    /// Evaluate the single-source searches of different start vertices in parallel.
    pub parallel: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl RouteOptions {
    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Vertex sets that constrain which edges a path may use.
#[derive(Debug, Clone, Default)]
pub struct Admissibility {
    contact: HashSet<VertexId>,
    along: HashSet<VertexId>,
}

impl Admissibility {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbid every edge touching these vertices.
    pub fn with_contact<I: IntoIterator<Item = VertexId>>(mut self, vertices: I) -> Self {
        self.contact.extend(vertices);
        self
    }

    /// Forbid every edge with both endpoints among these vertices.
    pub fn with_along<I: IntoIterator<Item = VertexId>>(mut self, vertices: I) -> Self {
        self.along.extend(vertices);
        self
    }

    /// Whether the edge `(a, b)` may be used.
    #[inline]
    pub fn admits(&self, a: VertexId, b: VertexId) -> bool {
        if self.contact.contains(&a) || self.contact.contains(&b) {
            return false;
        }
        !(self.along.contains(&a) && self.along.contains(&b))
    }
}

/// An undirected weighted graph in adjacency-list form.
#[derive(Debug, Clone)]
pub struct EdgeGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    num_edges: usize,
}

impl EdgeGraph {
    /// Build a graph from `(a, b, weight)` edges over `num_vertices` vertices.
    pub fn new<I>(num_vertices: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut adjacency = vec![Vec::new(); num_vertices];
        let mut num_edges = 0;
        for (a, b, w) in edges {
            adjacency[a].push((b, w));
            adjacency[b].push((a, w));
            num_edges += 1;
        }
        Self { adjacency, num_edges }
    }

    /// Build the edge graph of a mesh, keeping only admissible edges.
    pub fn from_mesh(mesh: &HalfEdgeMesh, admissibility: &Admissibility) -> Self {
        let edges = mesh.edges().filter_map(|he| {
            let (a, b) = (mesh.origin(he), mesh.dest(he));
            admissibility
                .admits(a, b)
                .then(|| (a.index(), b.index(), mesh.edge_length(he)))
        });
        let graph = Self::new(mesh.num_vertices(), edges);
        log::debug!(
            "edge graph keeps {} of {} edges",
            graph.num_edges,
            mesh.edges().count()
        );
        graph
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Single-source shortest paths.
    fn dijkstra(&self, source: usize, store_predecessors: bool) -> ShortestPaths {
        let n = self.num_vertices();
        let mut distances = vec![f64::INFINITY; n];
        let mut predecessors = store_predecessors.then(|| vec![None; n]);
        let mut heap = BinaryHeap::new();

        distances[source] = 0.0;
        heap.push(HeapEntry::new(source, 0.0));

        while let Some(HeapEntry { vertex: u, distance }) = heap.pop() {
            // Stale entry
            if distance > distances[u] {
                continue;
            }
            for &(v, w) in &self.adjacency[u] {
                let candidate = distance + w;
                if candidate < distances[v] {
                    distances[v] = candidate;
                    if let Some(preds) = predecessors.as_mut() {
                        preds[v] = Some(u);
                    }
                    heap.push(HeapEntry::new(v, candidate));
                }
            }
        }

        ShortestPaths {
            distances,
            predecessors,
        }
    }
}

struct ShortestPaths {
    distances: Vec<f64>,
    predecessors: Option<Vec<Option<usize>>>,
}

impl ShortestPaths {
    /// Vertex sequence from the source to `target`.
    fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.distances[target].is_finite() {
            return None;
        }
        let preds = self.predecessors.as_ref()?;
        let mut path = vec![target];
        let mut current = target;
        while let Some(prev) = preds[current] {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        Some(path)
    }
}

/// Entry in the priority queue.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    vertex: usize,
    distance: f64,
}

impl HeapEntry {
    fn new(vertex: usize, distance: f64) -> Self {
        Self { vertex, distance }
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; lower vertex index first on equal distance
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

fn check_subset(name: &'static str, subset: &[VertexId], num_vertices: usize) -> Result<()> {
    if subset.is_empty() {
        return Err(UacError::invalid_param(name, "[]", "vertex set must not be empty"));
    }
    if let Some(v) = subset.iter().find(|v| v.index() >= num_vertices) {
        return Err(UacError::invalid_param(name, v, "vertex index out of range"));
    }
    Ok(())
}

/// Shortest path on `graph` from any vertex of `start` to any vertex of `end`.
///
/// Returns an open path beginning at the chosen start vertex.
pub fn shortest_path_between_subsets(
    graph: &EdgeGraph,
    start: &[VertexId],
    end: &[VertexId],
    options: &RouteOptions,
) -> Result<RawPath> {
    check_subset("start", start, graph.num_vertices())?;
    check_subset("end", end, graph.num_vertices())?;

    // Nearest end vertex per start vertex, first end wins on ties.
    let nearest_end = |s: &VertexId| -> Option<(usize, f64)> {
        let paths = graph.dijkstra(s.index(), false);
        let mut best: Option<(usize, f64)> = None;
        for (i, e) in end.iter().enumerate() {
            let d = paths.distances[e.index()];
            if d.is_finite() && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best
    };

    let candidates: Vec<Option<(usize, f64)>> = if options.parallel {
        start.par_iter().map(nearest_end).collect()
    } else {
        start.iter().map(nearest_end).collect()
    };

    let mut best: Option<(usize, usize, f64)> = None;
    for (si, candidate) in candidates.into_iter().enumerate() {
        if let Some((ei, d)) = candidate {
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((si, ei, d));
            }
        }
    }

    let (si, ei, distance) = best.ok_or(UacError::DisconnectedSubsets {
        start_count: start.len(),
        end_count: end.len(),
    })?;

    let source = start[si].index();
    let target = end[ei].index();
    let vertices = graph
        .dijkstra(source, true)
        .path_to(target)
        .ok_or(UacError::DisconnectedSubsets {
            start_count: start.len(),
            end_count: end.len(),
        })?;

    log::debug!(
        "shortest path {} -> {} has {} vertices, length {:.4}",
        source,
        target,
        vertices.len(),
        distance
    );
    Ok(RawPath::open(vertices.into_iter().map(VertexId::new).collect()))
}

/// Shortest admissible path on the mesh between two vertex subsets.
pub fn constrained_shortest_path(
    mesh: &HalfEdgeMesh,
    start: &[VertexId],
    end: &[VertexId],
    admissibility: &Admissibility,
    options: &RouteOptions,
) -> Result<RawPath> {
    let graph = EdgeGraph::from_mesh(mesh, admissibility);
    shortest_path_between_subsets(&graph, start, end, options)
}
