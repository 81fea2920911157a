//! Hierarchical, asynchronously sliced data sources.
//!
//! A [`DataSource`] is a category tree addressable by a flattened
//! linear index. Consumers fetch single items or batched slices; slice
//! requests complete exactly once, after every constituent per-item
//! response has arrived.

mod id;
mod source;

pub use id::*;
pub use source::*;

/// Item values carried through the source. `Null` is a legal tombstone
/// and flows to factories unchanged.
pub type Value = serde_json::Value;
