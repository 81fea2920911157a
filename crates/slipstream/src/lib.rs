//! Facade over the slipstream workspace.
//!
//! Re-exports the public surface of the scroll core and its support
//! crates so applications depend on one crate.

pub use slipstream_animation as animation;
pub use slipstream_core as core;
pub use slipstream_data as data;
pub use slipstream_geometry as geometry;
pub use slipstream_node as node;
pub use slipstream_scroll as scroll;

pub mod prelude {
    pub use slipstream_data::{DataSource, Id, Value};
    pub use slipstream_geometry::{Axis, Padding, Rect, Size, Vec2};
    pub use slipstream_node::{GestureEvent, GesturePhase, NodeId, NodeTree, Swipe, Tap, Wheel};
    pub use slipstream_scroll::{
        FixedLayout, GridLayout, ItemNode, Movement, RecyclerScroll, Request, ScrollController,
        ScrollItemHandle, ScrollView, SliceHandler, SliceItem, SliceLayout, SlicedScroll,
    };
}
