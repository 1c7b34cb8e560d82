//! Index types for mesh elements.
//!
//! Vertices, half-edges and faces are addressed by distinct newtypes so that a
//! face index can never be passed where a vertex index is expected. Vertex
//! indices are the stable global indices of the input mesh and are what every
//! path, marker and submesh artifact stores.

use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct FaceId(u32);

const INVALID: u32 = u32::MAX;

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(FaceId, "F");

impl Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convenience conversion for literal vertex lists in tests and configuration.
pub fn vertex_ids(indices: &[usize]) -> Vec<VertexId> {
    indices.iter().map(|&i| VertexId::new(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());
        assert!(!VertexId::invalid().is_valid());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(42)), "V(42)");
        assert_eq!(format!("{:?}", FaceId::invalid()), "F(INVALID)");
        assert_eq!(format!("{}", VertexId::new(7)), "7");
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&vertex_ids(&[3, 1, 4])).unwrap();
        assert_eq!(json, "[3,1,4]");
    }
}
