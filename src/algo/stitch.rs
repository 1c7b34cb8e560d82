//! Stitching of coordinate path portions into closed submesh boundaries.

use crate::artifact::{CoordinatePath, SubmeshBoundary};
use crate::error::{Result, UacError};

/// Concatenate `segments` into one closed loop.
///
/// Segments are joined at shared end vertices. The first segment fixes the
/// start and the orientation; every further segment is attached where its
/// first or last vertex equals the current end of the loop, reversed when
/// needed. The shared junction vertex appears once. A trailing vertex equal to
/// the first one is dropped.
pub fn stitch_boundary(segments: Vec<CoordinatePath>) -> Result<SubmeshBoundary> {
    let mut remaining = segments.into_iter();
    let mut loop_path = remaining
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| UacError::malformed("no boundary segments to stitch"))?;
    let mut remaining: Vec<CoordinatePath> = remaining.collect();

    if let Some(i) = remaining.iter().position(CoordinatePath::is_empty) {
        return Err(UacError::malformed(format!("boundary segment {} is empty", i + 1)));
    }

    while !remaining.is_empty() {
        let tail = loop_path.vertices[loop_path.len() - 1];
        let found = remaining.iter().position(|s| {
            s.vertices.first() == Some(&tail) || s.vertices.last() == Some(&tail)
        });
        let Some(i) = found else {
            return Err(UacError::OpenLoop {
                remaining: remaining.len(),
            });
        };

        let mut next = remaining.remove(i);
        if next.vertices[0] != tail {
            next.reverse();
        }
        loop_path.vertices.extend_from_slice(&next.vertices[1..]);
        loop_path.alpha.extend_from_slice(&next.alpha[1..]);
        loop_path.beta.extend_from_slice(&next.beta[1..]);
    }

    if loop_path.len() > 1 && loop_path.vertices[0] == loop_path.vertices[loop_path.len() - 1] {
        loop_path.vertices.pop();
        loop_path.alpha.pop();
        loop_path.beta.pop();
    }

    Ok(SubmeshBoundary {
        vertices: loop_path.vertices,
        alpha: loop_path.alpha,
        beta: loop_path.beta,
    })
}
