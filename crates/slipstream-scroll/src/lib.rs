//! The virtualized scroll core.
//!
//! A data-driven scroll surface rendering a potentially unbounded
//! logical stream through a small recycled window of live nodes:
//!
//! - [`ScrollController`] — the placement registry and virtualisation
//!   window.
//! - [`ScrollView`] — viewport math, gesture handling, momentum and
//!   bounce physics.
//! - [`SlicedScroll`] — windowed paging over a
//!   [`slipstream_data::DataSource`].
//! - [`RecyclerScroll`] — swipe-to-remove with undo and compaction.

mod controller;
mod error;
mod handle;
mod handler;
mod indicator;
mod overscroll;
mod persist;
mod recycler;
mod sliced;
mod view;

pub use controller::*;
pub use error::*;
pub use handle::*;
pub use handler::*;
pub use indicator::*;
pub use overscroll::*;
pub use persist::*;
pub use recycler::*;
pub use sliced::*;
pub use view::*;
