//! Grid mesh builder: a W×H vertex lattice centred on the origin and a
//! single triangle strip that snakes across it.
//!
//! # Invariants
//! - Vertex linear index is `i + j * width` (row-major, rows along Z).
//! - The strip never references an index `>= width * height`.
//! - Index count is `width * height + (width - 1) * (height - 2)`.
//! - Building is pure: the same dimensions always give identical bytes.

mod grid;
mod strip;

pub use grid::{GridMesh, MeshError, Vertex};
pub use strip::{StripStats, StripTriangles};
