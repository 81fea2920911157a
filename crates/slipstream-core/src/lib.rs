//! Runtime plumbing shared by the slipstream crates.
//!
//! Nothing here knows about scrolling: a dirty-flag subscription
//! primitive, a fixed-window moving average, and the single background
//! queue the slice pipeline assembles placements on.

mod moving_average;
mod subscription;
mod task_queue;

pub use moving_average::*;
pub use subscription::*;
pub use task_queue::*;
