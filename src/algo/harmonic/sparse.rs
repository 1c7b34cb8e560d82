//! Compressed sparse row matrices and a conjugate gradient solver.

use nalgebra::DVector;

use crate::error::{Result, UacError};

/// A square or rectangular matrix in compressed sparse row form.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_start[i]..row_start[i + 1]` indexes the entries of row `i`.
    row_start: Vec<usize>,
    col: Vec<usize>,
    value: Vec<f64>,
}

impl CsrMatrix {
    /// Assemble a matrix from `(row, col, value)` triplets, summing duplicates.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut row_start = vec![0usize; rows + 1];
        let mut col: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut value: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in triplets {
            if last == Some((r, c)) {
                if let Some(acc) = value.last_mut() {
                    *acc += v;
                }
            } else {
                col.push(c);
                value.push(v);
                row_start[r + 1] += 1;
                last = Some((r, c));
            }
        }
        for r in 0..rows {
            row_start[r + 1] += row_start[r];
        }

        Self {
            rows,
            cols,
            row_start,
            col,
            value,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.value.len()
    }

    /// `A * x`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(x.len(), self.cols);
        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|r| {
                let span = self.row_start[r]..self.row_start[r + 1];
                self.col[span.clone()]
                    .iter()
                    .zip(&self.value[span])
                    .map(|(&c, &v)| v * x[c])
                    .sum::<f64>()
            }),
        )
    }
}

/// Solve `A x = b` for symmetric positive definite `A`.
///
/// Iterates until the residual norm relative to `|b|` drops below
/// `tolerance`, failing after `max_iterations` steps.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(UacError::invalid_param(
            "matrix",
            format!("{}x{}", a.nrows(), a.ncols()),
            "must be square and match the right-hand side",
        ));
    }

    let mut x = DVector::zeros(n);
    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(x);
    }

    let mut r = b.clone();
    let mut p = r.clone();
    let mut rr = r.dot(&r);

    for _ in 0..max_iterations {
        let ap = a.mul_vec(&p);
        let curvature = p.dot(&ap);
        if curvature.abs() < 1e-300 {
            break;
        }
        let step = rr / curvature;
        x.axpy(step, &p, 1.0);
        r.axpy(-step, &ap, 1.0);

        let rr_next = r.dot(&r);
        if rr_next.sqrt() / b_norm < tolerance {
            return Ok(x);
        }
        p = &r + (rr_next / rr) * &p;
        rr = rr_next;
    }

    Err(UacError::ConvergenceFailed {
        iterations: max_iterations,
    })
}
