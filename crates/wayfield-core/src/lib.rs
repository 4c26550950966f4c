//! **wayfield-core** — geometry and value-field primitives for the wayfield
//! least-cost-path engine.
//!
//! This crate provides the shared 2D coordinate space used by every other
//! wayfield component: integer [`Point`]s, half-open [`Range`]s, and the
//! owned row-major value grid [`Field`] that carries origin/target masks,
//! weight surfaces, distance fields, and path grids across the engine
//! boundary.

pub mod field;
pub mod geom;

pub use field::{Field, RaggedRows};
pub use geom::{Point, Range};
