//! Coordinate pipeline algorithms.
//!
//! Each module implements one pipeline stage on plain mesh and artifact data:
//!
//! - **Boundaries**: ordered rims of tagged regions ([`boundary`])
//! - **Routing**: shortest paths between vertex subsets under admissibility
//!   constraints ([`route`])
//! - **Markers**: single vertices picked from paths ([`marker`])
//! - **Parameterization**: relative arc length along paths ([`parameterize`])
//! - **Coordinates**: piecewise-linear UAC values along paths ([`coordinates`])
//! - **Stitching**: closed loops from path portions ([`stitch`])
//! - **Regions**: flood-filled submeshes inside loops ([`region`])
//! - **Harmonic extension**: UAC values over submesh interiors ([`harmonic`])
//!
//! The pipeline driver in [`crate::construct`] reads stage inputs from the
//! artifact store and calls into these modules.

pub mod boundary;
pub mod coordinates;
pub mod harmonic;
pub mod marker;
pub mod parameterize;
pub mod progress;
pub mod region;
pub mod route;
pub mod stitch;

pub use progress::Progress;
