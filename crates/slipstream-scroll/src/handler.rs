//! Slice layout handlers.
//!
//! A handler turns a slice's data map into placement items under the
//! current layout. It runs on the background worker, so handlers are
//! `Send` and touch no UI state; everything they need is captured in a
//! [`HandlerContext`] snapshot taken on the main loop.

use std::collections::BTreeMap;

use slipstream_data::{Id, Value};
use slipstream_geometry::{Axis, Padding, Size, Vec2};

/// What a slice request is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Discard everything, place a new slice centred on the origin id.
    Reset,
    /// Refresh the current slice in place.
    Update,
    /// Prepend the previous page.
    Front,
    /// Append the next page.
    Back,
}

pub type DataMap = BTreeMap<Id, Value>;
pub type ItemMap = BTreeMap<Id, SliceItem>;

/// One placed slice item.
#[derive(Clone, Debug)]
pub struct SliceItem {
    pub data: Value,
    pub position: Vec2,
    pub size: Size,
    /// Logical id, stamped after placement.
    pub id: u64,
    /// Index of the controller entry rendering this item.
    pub controller_id: usize,
}

impl SliceItem {
    pub fn new(data: Value, position: Vec2, size: Size) -> Self {
        Self {
            data,
            position,
            size,
            id: 0,
            controller_id: 0,
        }
    }
}

/// Layout snapshot a handler is built against.
#[derive(Clone, Copy, Debug)]
pub struct HandlerContext {
    pub axis: Axis,
    pub viewport: Size,
    pub padding: Padding,
    /// Position of the current first item.
    pub origin_front: Vec2,
    /// End position of the current last item.
    pub origin_back: Vec2,
}

pub trait SliceHandler: Send {
    /// Builds placements for a slice. Front requests stack backward
    /// from the current front; everything else stacks forward.
    fn run(&mut self, request: Request, data: DataMap) -> ItemMap;
}

fn request_origin(ctx: &HandlerContext, request: Request) -> Vec2 {
    match request {
        Request::Reset => Vec2::ZERO,
        Request::Update | Request::Front => ctx.origin_front,
        Request::Back => ctx.origin_back,
    }
}

// ── variable-size handler ────────────────────────────────────────────

pub type SliceItemCallback = Box<dyn FnMut(Value, Vec2) -> SliceItem + Send>;

/// Items whose sizes come from the data; positions accumulate.
pub struct SliceLayout {
    ctx: HandlerContext,
    item_cb: SliceItemCallback,
}

impl SliceLayout {
    pub fn new(ctx: HandlerContext, item_cb: SliceItemCallback) -> Self {
        Self { ctx, item_cb }
    }
}

impl SliceHandler for SliceLayout {
    fn run(&mut self, request: Request, data: DataMap) -> ItemMap {
        let mut ret = ItemMap::new();
        let axis = self.ctx.axis;
        let mut origin = request_origin(&self.ctx, request);

        if request == Request::Front {
            for (id, value) in data.into_iter().rev() {
                let mut item = (self.item_cb)(value, origin);
                let main = axis.main_size(item.size);
                item.position = match axis {
                    Axis::Vertical => Vec2::new(origin.x, origin.y - main),
                    Axis::Horizontal => Vec2::new(origin.x - main, origin.y),
                };
                origin = item.position;
                ret.insert(id, item);
            }
        } else {
            for (id, value) in data {
                let mut item = (self.item_cb)(value, origin);
                item.position = origin;
                let main = axis.main_size(item.size);
                origin += axis.position_for(main);
                ret.insert(id, item);
            }
        }
        ret
    }
}

// ── fixed-size handler ───────────────────────────────────────────────

/// All items share one axis extent; `position = id · size`.
pub struct FixedLayout {
    ctx: HandlerContext,
    item_size: f32,
}

impl FixedLayout {
    pub fn new(ctx: HandlerContext, item_size: f32) -> Self {
        Self { ctx, item_size }
    }
}

impl SliceHandler for FixedLayout {
    fn run(&mut self, _request: Request, data: DataMap) -> ItemMap {
        let axis = self.ctx.axis;
        let size = match axis {
            Axis::Vertical => Size::new(self.ctx.viewport.width, self.item_size),
            Axis::Horizontal => Size::new(self.item_size, self.ctx.viewport.height),
        };
        data.into_iter()
            .map(|(id, value)| {
                let origin = axis.position_for(id.get() as f32 * self.item_size);
                (id, SliceItem::new(value, origin, size))
            })
            .collect()
    }
}

// ── grid handler ─────────────────────────────────────────────────────

/// Fixed-aspect cells in as many columns as fit the viewport width.
pub struct GridLayout {
    ctx: HandlerContext,
    cell_min_width: f32,
    cell_aspect_ratio: f32,
    auto_paddings: bool,
}

impl GridLayout {
    pub fn new(ctx: HandlerContext, cell_min_width: f32, cell_aspect_ratio: f32) -> Self {
        Self {
            ctx,
            cell_min_width,
            cell_aspect_ratio,
            auto_paddings: false,
        }
    }

    pub fn with_auto_paddings(mut self, auto: bool) -> Self {
        self.auto_paddings = auto;
        self
    }
}

impl SliceHandler for GridLayout {
    fn run(&mut self, _request: Request, data: DataMap) -> ItemMap {
        let width = self.ctx.viewport.width - self.ctx.padding.horizontal();
        let cols = ((width / self.cell_min_width).floor() as u32).max(1);
        let cell_width = if self.auto_paddings {
            self.cell_min_width.min(width / cols as f32)
        } else {
            width / cols as f32
        };
        let cell_height = cell_width / self.cell_aspect_ratio;
        let cell = Size::new(cell_width, cell_height);
        let side = (self.ctx.viewport.width - cell_width * cols as f32) / 2.0;

        data.into_iter()
            .map(|(id, value)| {
                let row = id.get() / cols as u64;
                let col = id.get() % cols as u64;
                let pos = Vec2::new(
                    col as f32 * cell_width + side,
                    row as f32 * cell_height,
                );
                (id, SliceItem::new(value, pos, cell))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/handler_tests.rs"]
mod tests;
