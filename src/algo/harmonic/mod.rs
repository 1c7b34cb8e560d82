//! Harmonic extension of boundary coordinates over a submesh.
//!
//! Given UAC values on a submesh's boundary loop, each coordinate component is
//! extended to the remaining vertices as the discrete harmonic function with
//! those Dirichlet values. Loop vertices are eliminated from the Laplacian and
//! the interior system is solved with conjugate gradient. Alpha and beta are
//! independent and solved concurrently.
//!
//! # Example
//!
//! ```
//! use atrium::algo::harmonic::{HarmonicOptions, LaplacianWeights};
//!
//! let options = HarmonicOptions::default()
//!     .with_weights(LaplacianWeights::Uniform)
//!     .with_tolerance(1e-12);
//! assert!(options.parallel);
//! ```

mod laplacian;
mod sparse;

pub use laplacian::{edge_weights, LaplacianWeights};
pub use sparse::{conjugate_gradient, CsrMatrix};

use nalgebra::{DVector, Point3};
use serde::Deserialize;

use crate::artifact::{CoordinateSubmesh, Submesh, SubmeshBoundary};
use crate::error::{Result, UacError};
use crate::mesh::HalfEdgeMesh;

/// Options for the harmonic solver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarmonicOptions {
    /// Laplacian edge weights.
    pub weights: LaplacianWeights,
    /// Conjugate gradient iteration limit.
    pub max_iterations: usize,
    /// Relative residual at which conjugate gradient stops.
    pub tolerance: f64,
    /// Solve both coordinate components concurrently.
    pub parallel: bool,
}

impl Default for HarmonicOptions {
    fn default() -> Self {
        Self {
            weights: LaplacianWeights::Cotangent,
            max_iterations: 10_000,
            tolerance: 1e-10,
            parallel: true,
        }
    }
}

impl HarmonicOptions {
    /// Set the Laplacian weighting.
    pub fn with_weights(mut self, weights: LaplacianWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable concurrent solves.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(UacError::invalid_param("max_iterations", 0, "must be positive"));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(UacError::invalid_param("tolerance", self.tolerance, "must be positive"));
        }
        Ok(())
    }
}

/// Dirichlet-reduced Laplace system over the free vertices of a submesh.
struct ReducedSystem {
    matrix: CsrMatrix,
    /// Local vertex index of every free unknown.
    free: Vec<usize>,
    /// Per-unknown right-hand side contributions `(local boundary vertex, weight)`.
    coupling: Vec<Vec<(usize, f64)>>,
}

impl ReducedSystem {
    fn assemble(
        positions: &[Point3<f64>],
        faces: &[[usize; 3]],
        fixed: &[Option<usize>],
        weights: LaplacianWeights,
    ) -> Self {
        let mut unknown = vec![usize::MAX; positions.len()];
        let mut free = Vec::new();
        for (v, slot) in unknown.iter_mut().enumerate() {
            if fixed[v].is_none() {
                *slot = free.len();
                free.push(v);
            }
        }

        let mut triplets = Vec::new();
        let mut coupling = vec![Vec::new(); free.len()];
        for (i, j, w) in edge_weights(positions, faces, weights) {
            for (a, b) in [(i, j), (j, i)] {
                let row = unknown[a];
                if row == usize::MAX {
                    continue;
                }
                triplets.push((row, row, w));
                match fixed[b] {
                    Some(_) => coupling[row].push((b, w)),
                    None => triplets.push((row, unknown[b], -w)),
                }
            }
        }

        Self {
            matrix: CsrMatrix::from_triplets(free.len(), free.len(), triplets),
            free,
            coupling,
        }
    }

    fn solve(&self, values: &[f64], options: &HarmonicOptions) -> Result<DVector<f64>> {
        let rhs = DVector::from_iterator(
            self.free.len(),
            self.coupling
                .iter()
                .map(|row| row.iter().map(|&(b, w)| w * values[b]).sum::<f64>()),
        );
        conjugate_gradient(&self.matrix, &rhs, options.max_iterations, options.tolerance)
    }
}

/// Extend the loop values of `boundary` harmonically over `submesh`.
pub fn harmonic_extension(
    mesh: &HalfEdgeMesh,
    submesh: &Submesh,
    boundary: &SubmeshBoundary,
    options: &HarmonicOptions,
) -> Result<CoordinateSubmesh> {
    options.validate()?;
    let n = submesh.vertices.len();

    // fixed[local] = position of the vertex in the boundary loop
    let mut fixed: Vec<Option<usize>> = vec![None; n];
    for (k, &v) in boundary.vertices.iter().enumerate() {
        let local = submesh
            .local_index(v)
            .ok_or(UacError::BoundaryVertexOutsideSubmesh { vertex: v.index() })?;
        fixed[local] = Some(k);
    }

    let mut alpha = vec![0.0; n];
    let mut beta = vec![0.0; n];
    for (local, k) in fixed.iter().enumerate() {
        if let Some(k) = *k {
            alpha[local] = boundary.alpha[k];
            beta[local] = boundary.beta[k];
        }
    }

    let interior = fixed.iter().filter(|f| f.is_none()).count();
    if interior > 0 {
        let positions: Vec<Point3<f64>> = submesh
            .vertices
            .iter()
            .map(|&v| *mesh.position(v))
            .collect();
        let system = ReducedSystem::assemble(&positions, &submesh.faces, &fixed, options.weights);
        log::debug!(
            "harmonic system: {} unknowns, {} boundary values, {} non-zeros",
            interior,
            n - interior,
            system.matrix.nnz()
        );

        let (solved_alpha, solved_beta) = if options.parallel {
            rayon::join(
                || system.solve(&alpha, options),
                || system.solve(&beta, options),
            )
        } else {
            (system.solve(&alpha, options), system.solve(&beta, options))
        };
        let (solved_alpha, solved_beta) = (solved_alpha?, solved_beta?);

        for (row, &local) in system.free.iter().enumerate() {
            alpha[local] = solved_alpha[row];
            beta[local] = solved_beta[row];
        }
    }

    Ok(CoordinateSubmesh {
        submesh: submesh.clone(),
        alpha,
        beta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::region::{extract_region, submesh_from_faces};
    use crate::mesh::test_meshes::{grid_mesh, tagged_grid};
    use crate::mesh::{vertex_ids, FaceId, VertexId};
    use approx::assert_relative_eq;

    /// Boundary values `alpha = (x - offset) / s`, `beta = (y - offset) / s`.
    fn linear_boundary(mesh: &HalfEdgeMesh, loop_vertices: &[VertexId], offset: f64, s: f64) -> SubmeshBoundary {
        SubmeshBoundary {
            vertices: loop_vertices.to_vec(),
            alpha: loop_vertices.iter().map(|&v| (mesh.position(v).x - offset) / s).collect(),
            beta: loop_vertices.iter().map(|&v| (mesh.position(v).y - offset) / s).collect(),
        }
    }

    #[test]
    fn test_hole_centre() {
        let mesh = tagged_grid();
        let loop_vertices = vertex_ids(&[16, 17, 18, 25, 32, 31, 30, 23]);
        let submesh = extract_region(&mesh, &loop_vertices, VertexId::new(0)).unwrap();
        let boundary = linear_boundary(&mesh, &loop_vertices, 2.0, 2.0);

        for weights in [LaplacianWeights::Cotangent, LaplacianWeights::Uniform] {
            let options = HarmonicOptions::default().with_weights(weights);
            let result = harmonic_extension(&mesh, &submesh, &boundary, &options).unwrap();
            let centre = submesh.local_index(VertexId::new(24)).unwrap();
            assert_relative_eq!(result.alpha[centre], 0.5, epsilon = 1e-9);
            assert_relative_eq!(result.beta[centre], 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_linear_field_is_reproduced() {
        let n = 8;
        let stride = n + 1;
        let mesh = grid_mesh(n);
        let mut perimeter: Vec<usize> = (0..=n).collect();
        perimeter.extend((1..=n).map(|j| j * stride + n));
        perimeter.extend((0..n).rev().map(|i| n * stride + i));
        perimeter.extend((1..n).rev().map(|j| j * stride));
        let perimeter = vertex_ids(&perimeter);

        let submesh = submesh_from_faces(&mesh, mesh.face_ids().collect());
        let boundary = linear_boundary(&mesh, &perimeter, 0.0, n as f64);
        let options = HarmonicOptions::default().with_parallel(false);
        let result = harmonic_extension(&mesh, &submesh, &boundary, &options).unwrap();

        for (local, &v) in submesh.vertices.iter().enumerate() {
            let p = mesh.position(v);
            assert_relative_eq!(result.alpha[local], p.x / n as f64, epsilon = 1e-8);
            assert_relative_eq!(result.beta[local], p.y / n as f64, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_no_interior_vertices() {
        let mesh = grid_mesh(1);
        let submesh = submesh_from_faces(&mesh, vec![FaceId::new(0)]);
        let loop_vertices = submesh.vertices.clone();
        let boundary = SubmeshBoundary {
            vertices: loop_vertices,
            alpha: vec![0.1, 0.2, 0.3],
            beta: vec![0.4, 0.5, 0.6],
        };
        let result = harmonic_extension(&mesh, &submesh, &boundary, &HarmonicOptions::default()).unwrap();
        assert_eq!(result.alpha, vec![0.1, 0.2, 0.3]);
        assert_eq!(result.beta, vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_boundary_vertex_outside_submesh() {
        let mesh = grid_mesh(2);
        let submesh = submesh_from_faces(&mesh, vec![FaceId::new(0)]);
        let boundary = SubmeshBoundary {
            vertices: vertex_ids(&[0, 8]),
            alpha: vec![0.0, 1.0],
            beta: vec![0.0, 1.0],
        };
        assert!(matches!(
            harmonic_extension(&mesh, &submesh, &boundary, &HarmonicOptions::default()),
            Err(UacError::BoundaryVertexOutsideSubmesh { vertex: 8 })
        ));
    }

    #[test]
    fn test_invalid_options() {
        let mesh = grid_mesh(1);
        let submesh = submesh_from_faces(&mesh, vec![FaceId::new(0)]);
        let boundary = SubmeshBoundary {
            vertices: submesh.vertices.clone(),
            alpha: vec![0.0; 3],
            beta: vec![0.0; 3],
        };
        let options = HarmonicOptions::default().with_tolerance(0.0);
        assert!(matches!(
            harmonic_extension(&mesh, &submesh, &boundary, &options),
            Err(UacError::InvalidParameter { name: "tolerance", .. })
        ));
    }
}
