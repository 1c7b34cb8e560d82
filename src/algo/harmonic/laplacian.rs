//! Discrete Laplacian edge weights.

use nalgebra::{Point3, Vector3};
use serde::Deserialize;

/// Edge weighting of the discrete Laplacian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaplacianWeights {
    /// Half the sum of the cotangents of the angles opposite an edge.
    #[default]
    Cotangent,
    /// Unit weight per edge.
    Uniform,
}

/// Cotangent of the angle between `u` and `v`.
///
/// Degenerate corners contribute nothing.
#[inline]
fn cotangent(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let sin = u.cross(v).norm();
    if sin < 1e-12 {
        0.0
    } else {
        u.dot(v) / sin
    }
}

/// Per-face edge weight contributions `(i, j, w)` with `i < j`.
///
/// An interior edge appears once for each adjacent face; summing the
/// contributions gives the full weight.
pub fn edge_weights(
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
    weights: LaplacianWeights,
) -> Vec<(usize, usize, f64)> {
    let mut out = Vec::with_capacity(3 * faces.len());
    for face in faces {
        for k in 0..3 {
            let (i, j, opposite) = (face[(k + 1) % 3], face[(k + 2) % 3], face[k]);
            let w = match weights {
                LaplacianWeights::Uniform => 0.5,
                LaplacianWeights::Cotangent => {
                    let o = &positions[opposite];
                    0.5 * cotangent(&(positions[i] - o), &(positions[j] - o))
                }
            };
            out.push((i.min(j), i.max(j), w));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn summed(contributions: Vec<(usize, usize, f64)>) -> BTreeMap<(usize, usize), f64> {
        let mut total = BTreeMap::new();
        for (i, j, w) in contributions {
            *total.entry((i, j)).or_insert(0.0) += w;
        }
        total
    }

    #[test]
    fn test_right_triangle_cotangents() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let w = summed(edge_weights(&positions, &[[0, 1, 2]], LaplacianWeights::Cotangent));
        // Right angle at 0 is opposite the hypotenuse.
        assert_relative_eq!(w[&(1, 2)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[&(0, 1)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[&(0, 2)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_interior_edge_sums_to_one() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = [[0, 1, 2], [0, 2, 3]];
        let w = summed(edge_weights(&positions, &faces, LaplacianWeights::Uniform));
        assert_eq!(w[&(0, 2)], 1.0);
        assert_eq!(w[&(0, 1)], 0.5);
        assert_eq!(w.len(), 5);
    }
}
