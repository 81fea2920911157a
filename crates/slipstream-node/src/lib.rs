//! The layout-host contract for slipstream.
//!
//! A generational arena of nodes with the narrow surface the scroll
//! core relies on: position, content size, anchor point, visibility,
//! z-ordered parenting, force-render marks and dirty bits. Parents are
//! held as plain ids, never owning references.

mod arena;
mod gesture;

pub use arena::*;
pub use gesture::*;
