//! Marker resolution.
//!
//! A marker picks one vertex from a path, either by its index in a raw path or
//! by a relative arc-length threshold on a parameterized path.

use crate::artifact::{Marker, ParameterizedPath, RawPath};
use crate::error::{Result, UacError};

/// The vertex at `position` in `path`. Negative positions count from the end.
pub fn marker_at_index(path: &RawPath, position: i64) -> Result<Marker> {
    let len = path.len();
    let index = if position < 0 {
        (len as i64).checked_add(position)
    } else {
        Some(position)
    };
    match index {
        Some(i) if i >= 0 && (i as usize) < len => Ok(path.vertices[i as usize]),
        _ => Err(UacError::IndexOutOfBounds { position, len }),
    }
}

/// The first vertex whose relative length is at least `position`.
pub fn marker_at_relative(path: &ParameterizedPath, position: f64) -> Result<Marker> {
    path.relative_lengths
        .iter()
        .position(|&r| r >= position)
        .map(|i| path.vertices[i])
        .ok_or_else(|| UacError::UnresolvedRelativePosition {
            position,
            max: path
                .relative_lengths
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{vertex_ids, VertexId};

    #[test]
    fn test_index_mode() {
        let path = RawPath::open(vertex_ids(&[10, 11, 12, 13]));
        assert_eq!(marker_at_index(&path, 0).unwrap(), VertexId::new(10));
        assert_eq!(marker_at_index(&path, 2).unwrap(), VertexId::new(12));
        assert_eq!(marker_at_index(&path, -1).unwrap(), VertexId::new(13));
        assert_eq!(marker_at_index(&path, -4).unwrap(), VertexId::new(10));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let path = RawPath::open(vertex_ids(&[10, 11, 12]));
        assert!(matches!(
            marker_at_index(&path, 3),
            Err(UacError::IndexOutOfBounds { position: 3, len: 3 })
        ));
        assert!(matches!(
            marker_at_index(&path, -4),
            Err(UacError::IndexOutOfBounds { position: -4, len: 3 })
        ));
        assert!(marker_at_index(&RawPath::open(Vec::new()), 0).is_err());
    }

    #[test]
    fn test_relative_mode() {
        let path = ParameterizedPath {
            vertices: vertex_ids(&[5, 6, 7, 8]),
            relative_lengths: vec![0.0, 0.3, 0.6, 0.9],
        };
        assert_eq!(marker_at_relative(&path, 0.0).unwrap(), VertexId::new(5));
        assert_eq!(marker_at_relative(&path, 0.3).unwrap(), VertexId::new(6));
        assert_eq!(marker_at_relative(&path, 0.31).unwrap(), VertexId::new(7));

        let err = marker_at_relative(&path, 0.95).unwrap_err();
        assert!(matches!(err, UacError::UnresolvedRelativePosition { max, .. } if max == 0.9));
    }
}
