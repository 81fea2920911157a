//! Pure math/data for the slipstream scroll core.
//!
//! Geometry primitives plus the axis algebra the scroll engine reasons
//! in: one active scroll axis, the other dimension passive.

mod axis;
mod geometry;

pub use axis::*;
pub use geometry::*;
