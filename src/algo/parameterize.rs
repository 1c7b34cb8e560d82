//! Relative arc-length parameterization of paths.
//!
//! A raw path is oriented so that its markers appear in the order of their
//! target values, then every vertex receives a relative length. Between two
//! consecutive markers the relative length grows linearly with arc length and
//! hits each marker's target value exactly.
//!
//! Closed paths are rotated to start at the first marker and may be reversed
//! to match the marker order. When no marker sits at 1.0 the loop is closed by
//! repeating its first vertex at the end with relative length 1.0.
//!
//! Open paths keep their vertex sequence, reversed if the first marker sits at
//! the far end. When no marker sits at 1.0 the last vertex receives it.

use crate::artifact::{ParameterizedPath, RawPath};
use crate::error::{Result, UacError};
use crate::mesh::{HalfEdgeMesh, VertexId};

fn inconsistent<S: Into<String>>(reason: S) -> UacError {
    UacError::InconsistentMarkers {
        reason: reason.into(),
    }
}

fn check_targets(markers: &[VertexId], values: &[f64]) -> Result<()> {
    if markers.is_empty() {
        return Err(UacError::invalid_param("markers", "[]", "at least one marker is required"));
    }
    if markers.len() != values.len() {
        return Err(UacError::invalid_param(
            "marker_relative_positions",
            values.len(),
            "must have one value per marker",
        ));
    }
    if let Some(v) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        return Err(UacError::invalid_param(
            "marker_relative_positions",
            v,
            "values must lie in [0, 1]",
        ));
    }
    if values.windows(2).any(|w| w[0] >= w[1]) {
        return Err(inconsistent("target values are not strictly increasing"));
    }
    Ok(())
}

fn locate(path: &[VertexId], markers: &[VertexId]) -> Result<Vec<usize>> {
    markers
        .iter()
        .map(|m| {
            path.iter()
                .position(|v| v == m)
                .ok_or(UacError::MarkerNotOnPath { vertex: m.index() })
        })
        .collect()
}

#[inline]
fn strictly_increasing(indices: &[usize]) -> bool {
    indices.windows(2).all(|w| w[0] < w[1])
}

/// Orient a closed path: start at the first marker, reverse if needed.
fn orient_closed(path: &RawPath, markers: &[VertexId]) -> Result<(Vec<VertexId>, Vec<usize>)> {
    let start = locate(&path.vertices, &markers[..1])?[0];
    let mut ordered = path.vertices.clone();
    ordered.rotate_left(start);

    let mut indices = locate(&ordered, markers)?;
    if markers.len() > 2 && !strictly_increasing(&indices) {
        // Walk the loop the other way round, keeping the start vertex.
        ordered[1..].reverse();
        indices = locate(&ordered, markers)?;
    }
    if !strictly_increasing(&indices) {
        return Err(inconsistent(format!(
            "marker positions {indices:?} match neither direction of the loop"
        )));
    }
    Ok((ordered, indices))
}

/// Orient an open path: the first marker must be at one of its ends.
fn orient_open(path: &RawPath, markers: &[VertexId]) -> Result<(Vec<VertexId>, Vec<usize>)> {
    let mut ordered = path.vertices.clone();
    let first = locate(&ordered, &markers[..1])?[0];
    if first != 0 && first == ordered.len() - 1 {
        ordered.reverse();
    }
    let indices = locate(&ordered, markers)?;
    if indices[0] != 0 {
        return Err(inconsistent(format!(
            "first marker lies at index {} of an open path, not at an end",
            indices[0]
        )));
    }
    if !strictly_increasing(&indices) {
        return Err(inconsistent(format!(
            "marker positions {indices:?} are not ordered along the path"
        )));
    }
    Ok((ordered, indices))
}

/// Parameterize `path` so that `markers[i]` receives relative length `values[i]`.
///
/// `values` must be strictly increasing within `[0, 1]`.
pub fn parameterize_path(
    mesh: &HalfEdgeMesh,
    path: &RawPath,
    markers: &[VertexId],
    values: &[f64],
) -> Result<ParameterizedPath> {
    check_targets(markers, values)?;
    if path.is_empty() {
        return Err(UacError::malformed("cannot parameterize an empty path"));
    }

    let (mut vertices, mut indices) = if path.closed {
        orient_closed(path, markers)?
    } else {
        orient_open(path, markers)?
    };
    let mut values = values.to_vec();

    if values[values.len() - 1] < 1.0 {
        if path.closed {
            vertices.push(vertices[0]);
        } else if indices[indices.len() - 1] == vertices.len() - 1 {
            return Err(inconsistent(
                "last marker sits at the end of an open path but its target is below 1.0",
            ));
        }
        indices.push(vertices.len() - 1);
        values.push(1.0);
    } else if indices[indices.len() - 1] != vertices.len() - 1 {
        return Err(inconsistent(
            "vertices follow the marker with target 1.0",
        ));
    }

    let mut cumulative = Vec::with_capacity(vertices.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in vertices.windows(2) {
        total += mesh.distance(pair[0], pair[1]);
        cumulative.push(total);
    }

    let mut relative_lengths = vec![0.0; vertices.len()];
    for (segment, (idx, val)) in indices.windows(2).zip(values.windows(2)).enumerate() {
        let (start, end) = (idx[0], idx[1]);
        let (start_value, end_value) = (val[0], val[1]);
        let span = cumulative[end] - cumulative[start];
        if span <= 0.0 {
            return Err(UacError::invalid_param(
                "segment",
                segment,
                "markers are separated by zero arc length",
            ));
        }
        for k in start..=end {
            let t = (cumulative[k] - cumulative[start]) / span;
            relative_lengths[k] = start_value + (end_value - start_value) * t;
        }
        relative_lengths[start] = start_value;
        relative_lengths[end] = end_value;
    }

    Ok(ParameterizedPath {
        vertices,
        relative_lengths,
    })
}
