//! Piecewise-linear coordinate assignment along parameterized paths.

use crate::artifact::{CoordinatePath, ParameterizedPath};
use crate::error::{Result, UacError};

/// Relative tolerance used when matching anchor positions to relative lengths.
const RTOL: f64 = 1e-5;
/// Absolute tolerance used when matching anchor positions to relative lengths.
const ATOL: f64 = 1e-8;

#[inline]
fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

fn anchor_index(path: &ParameterizedPath, position: f64) -> Result<usize> {
    path.relative_lengths
        .iter()
        .position(|&r| is_close(r, position))
        .ok_or_else(|| UacError::UnresolvedRelativePosition {
            position,
            max: path
                .relative_lengths
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        })
}

/// Assign UAC values along `path` from a list of anchors.
///
/// Anchor `i` places `coordinates[i]` at the first path entry whose relative
/// length matches `relative_positions[i]`. Between two anchors both coordinate
/// components are interpolated linearly in the relative length of the span.
/// Entries outside the first and last anchor are dropped.
pub fn assign_coordinates(
    path: &ParameterizedPath,
    relative_positions: &[f64],
    coordinates: &[[f64; 2]],
) -> Result<CoordinatePath> {
    if relative_positions.len() != coordinates.len() {
        return Err(UacError::invalid_param(
            "coordinates",
            coordinates.len(),
            "must have one coordinate per relative position",
        ));
    }
    if relative_positions.len() < 2 {
        return Err(UacError::invalid_param(
            "relative_positions",
            relative_positions.len(),
            "at least two anchors are required",
        ));
    }

    let indices = relative_positions
        .iter()
        .map(|&p| anchor_index(path, p))
        .collect::<Result<Vec<_>>>()?;

    let num_segments = indices.len() - 1;
    let mut out = CoordinatePath {
        vertices: Vec::with_capacity(path.vertices.len()),
        relative_lengths: Vec::with_capacity(path.vertices.len()),
        alpha: Vec::with_capacity(path.vertices.len()),
        beta: Vec::with_capacity(path.vertices.len()),
    };

    for segment in 0..num_segments {
        let (start, end) = (indices[segment], indices[segment + 1]);
        if end <= start {
            return Err(UacError::invalid_param(
                "relative_positions",
                relative_positions[segment + 1],
                "anchors must appear in path order",
            ));
        }
        let span = &path.relative_lengths[start..=end];
        let lo = span.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = span.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = hi - lo;
        if range <= 0.0 {
            return Err(UacError::invalid_param(
                "relative_positions",
                relative_positions[segment + 1],
                "anchors span zero relative length",
            ));
        }

        let [a0, b0] = coordinates[segment];
        let [a1, b1] = coordinates[segment + 1];
        // Junctions belong to the following segment.
        let last = if segment + 1 < num_segments { end - 1 } else { end };
        for k in start..=last {
            let t = (path.relative_lengths[k] - lo) / range;
            let (alpha, beta) = if k == start {
                (a0, b0)
            } else if k == end {
                (a1, b1)
            } else {
                (a0 + (a1 - a0) * t, b0 + (b1 - b0) * t)
            };
            out.vertices.push(path.vertices[k]);
            out.relative_lengths.push(path.relative_lengths[k]);
            out.alpha.push(alpha);
            out.beta.push(beta);
        }
    }

    Ok(out)
}
