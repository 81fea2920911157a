//! The sliced (windowed) scroll.
//!
//! Keeps one resident slice of a large [`DataSource`] plus loader
//! sentinels toward unfetched neighbours. Requests are stamped with a
//! monotonic `invalidate_after` instant; stale arrivals are dropped
//! without effect. Placement assembly runs on the background queue
//! through a [`SliceHandler`] built against the current layout.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use slipstream_core::TaskQueue;
use slipstream_data::{DataSource, Id, SourceListener};
use slipstream_geometry::{Axis, Size, Vec2};
use slipstream_node::{NodeId, NodeTree};
use web_time::Instant;

use crate::{
    DataMap, HandlerContext, ItemMap, ItemNode, PersistentState, Request, ScrollController,
    ScrollError, ScrollView, SliceHandler, SliceItem,
};

/// Default upper bound on resident items before slicing kicks in.
pub const DEFAULT_SLICE_MAX: usize = 24;
/// Default axis extent of a loader sentinel.
pub const DEFAULT_LOADER_SIZE: f32 = 48.0;
/// Default minimum service time so the loader UI never blinks.
pub const DEFAULT_MIN_LOAD_TIME: Duration = Duration::from_millis(600);

pub type SliceItemFactory = Rc<dyn Fn(&SliceItem, &mut NodeTree) -> Option<ItemNode>>;
pub type LoaderFactory = Rc<dyn Fn(Request, &mut NodeTree) -> NodeId>;
pub type HandlerFactory = Box<dyn Fn(&HandlerContext) -> Box<dyn SliceHandler>>;

/// State shared with factories and callbacks that outlive a borrow of
/// the scroll itself.
#[derive(Default)]
struct SliceShared {
    pending_requests: Vec<Request>,
    raw_slices: Vec<(DataMap, Instant, Request)>,
    /// `None` marks a handler failure during assembly.
    assembled: Vec<(Option<ItemMap>, Instant, Request)>,
    source_dirty: bool,
    /// `(slice_start, slice_len, items_count)` for overscroll gating.
    bounds: (u64, usize, usize),
}

pub struct SlicedScroll {
    view: ScrollView,
    listener: SourceListener,
    queue: TaskQueue,
    shared: Rc<RefCell<SliceShared>>,
    items: Rc<RefCell<ItemMap>>,

    handler_factory: HandlerFactory,
    item_factory: Option<SliceItemFactory>,
    loader_factory: Option<LoaderFactory>,

    lookup_level: u32,
    items_for_subcats: bool,
    category_dirty: bool,
    use_category_bounds: bool,

    current_slice_start: Id,
    current_slice_len: usize,
    slice_origin: Id,
    slice_max: usize,
    slice_size: usize,
    slices_count: usize,
    items_count: usize,

    invalidate_after: Instant,
    loader_size: f32,
    min_load_time: Duration,
    saved_cross_size: f32,
}

impl SlicedScroll {
    pub fn new(
        source: Option<DataSource>,
        axis: Axis,
        viewport: Size,
        handler_factory: HandlerFactory,
    ) -> Self {
        let mut view = ScrollView::new(axis, viewport);
        view.set_max_velocity(Some(5000.0));
        view.set_controller(Some(ScrollController::new(axis)));

        let shared: Rc<RefCell<SliceShared>> = Rc::new(RefCell::new(SliceShared::default()));

        let mut listener = SourceListener::new();
        let dirty_flag = shared.clone();
        listener.set_callback(move || dirty_flag.borrow_mut().source_dirty = true);
        listener.set_target(source);

        // Overscroll surfaces only at the true ends of the id space.
        let gate = shared.clone();
        view.set_overscroll_filter(move |delta| {
            let (start, len, total) = gate.borrow().bounds;
            if delta > 0.0 {
                start as usize + len == total
            } else {
                start == 0
            }
        });

        Self {
            view,
            listener,
            queue: TaskQueue::new(),
            shared,
            items: Rc::new(RefCell::new(ItemMap::new())),
            handler_factory,
            item_factory: None,
            loader_factory: None,
            lookup_level: 0,
            items_for_subcats: false,
            category_dirty: true,
            use_category_bounds: false,
            current_slice_start: Id(0),
            current_slice_len: 0,
            slice_origin: Id(0),
            slice_max: DEFAULT_SLICE_MAX,
            slice_size: 0,
            slices_count: 0,
            items_count: 0,
            invalidate_after: Instant::now(),
            loader_size: DEFAULT_LOADER_SIZE,
            min_load_time: DEFAULT_MIN_LOAD_TIME,
            saved_cross_size: f32::NAN,
        }
    }

    // ── accessors & configuration ────────────────────────────────────

    pub fn view(&self) -> &ScrollView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScrollView {
        &mut self.view
    }

    pub fn items(&self) -> std::cell::Ref<'_, ItemMap> {
        self.items.borrow()
    }

    pub fn source(&self) -> Option<DataSource> {
        self.listener.target().cloned()
    }

    pub fn set_source(&mut self, source: Option<DataSource>) {
        if self.listener.target() == source.as_ref() {
            return;
        }
        self.listener.set_target(source);
        self.category_dirty = true;
        self.invalidate_after = Instant::now();
        self.items.borrow_mut().clear();
        self.current_slice_start = Id(0);
        self.current_slice_len = 0;
        self.items_count = 0;

        let viewport = self.view.tree().content_size(self.view.container());
        if viewport != Size::ZERO {
            self.install_reset_loader();
            self.view.set_scroll_position(0.0);
        }
    }

    pub fn set_lookup_level(&mut self, level: u32) {
        self.lookup_level = level;
        self.category_dirty = true;
        self.listener.set_dirty();
    }

    pub fn lookup_level(&self) -> u32 {
        self.lookup_level
    }

    pub fn set_items_for_subcats(&mut self, value: bool) {
        self.items_for_subcats = value;
        self.category_dirty = true;
        self.listener.set_dirty();
    }

    pub fn is_items_for_subcats(&self) -> bool {
        self.items_for_subcats
    }

    pub fn set_category_bounds(&mut self, value: bool) {
        if self.use_category_bounds != value {
            self.use_category_bounds = value;
            self.category_dirty = true;
        }
    }

    pub fn has_category_bounds(&self) -> bool {
        self.use_category_bounds
    }

    pub fn set_max_size(&mut self, max: usize) {
        self.slice_max = max.max(1);
        self.category_dirty = true;
        self.listener.set_dirty();
    }

    pub fn max_size(&self) -> usize {
        self.slice_max
    }

    pub fn set_origin_id(&mut self, id: Id) {
        self.slice_origin = id;
    }

    pub fn origin_id(&self) -> Id {
        self.slice_origin
    }

    pub fn set_loader_size(&mut self, size: f32) {
        self.loader_size = size;
    }

    pub fn loader_size(&self) -> f32 {
        self.loader_size
    }

    pub fn set_min_load_time(&mut self, time: Duration) {
        self.min_load_time = time;
    }

    pub fn min_load_time(&self) -> Duration {
        self.min_load_time
    }

    pub fn set_item_factory(&mut self, factory: impl Fn(&SliceItem, &mut NodeTree) -> Option<ItemNode> + 'static) {
        self.item_factory = Some(Rc::new(factory));
    }

    pub fn set_loader_factory(&mut self, factory: impl Fn(Request, &mut NodeTree) -> NodeId + 'static) {
        self.loader_factory = Some(Rc::new(factory));
    }

    pub fn set_handler_factory(&mut self, factory: HandlerFactory) {
        self.handler_factory = factory;
    }

    pub fn slice_start(&self) -> Id {
        self.current_slice_start
    }

    pub fn slice_len(&self) -> usize {
        self.current_slice_len
    }

    pub fn items_count(&self) -> usize {
        self.items_count
    }

    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    pub fn max_id(&self) -> u64 {
        match self.listener.target() {
            Some(source) => {
                let count = source.count(self.lookup_level, self.items_for_subcats);
                count.saturating_sub(1) as u64
            }
            None => 0,
        }
    }

    pub fn source_category(&self, id: Id) -> Option<(DataSource, bool)> {
        self.listener
            .target()
            .map(|source| source.get_item_category(id, self.lookup_level, self.items_for_subcats))
    }

    // ── viewport & lifecycle ─────────────────────────────────────────

    pub fn set_viewport_size(&mut self, viewport: Size) {
        self.view.set_viewport_size(viewport);
        let cross = if self.view.axis().is_vertical() {
            viewport.width
        } else {
            viewport.height
        };
        if self.saved_cross_size.is_nan() || self.saved_cross_size != cross {
            self.saved_cross_size = cross;
            self.shared.borrow_mut().source_dirty = true;
        }
    }

    /// Repositions to the front of the range, keeping the slice.
    pub fn reset(&mut self) {
        {
            let mut parts = self.view.parts();
            if let Some(controller) = parts.controller.as_deref_mut() {
                controller.clear(parts.tree);
            }
        }
        match self.view.scroll_min_position() {
            Some(min) => self.view.set_scroll_position(min),
            None => {
                let front = self.view.axis().padding_front(&self.view.padding());
                self.view.set_scroll_position(-front);
            }
        }
    }

    // ── persistence ──────────────────────────────────────────────────

    pub fn save(&self) -> PersistentState {
        PersistentState {
            value: self.view.scroll_relative_position(),
            start: self.current_slice_start.get(),
            len: self.current_slice_len,
        }
    }

    pub fn save_value(&self) -> serde_json::Value {
        self.save().to_value()
    }

    pub fn load(&mut self, state: &PersistentState) {
        self.view.set_scroll_relative_position(state.value);
        self.current_slice_start = Id(state.start);
        self.current_slice_len = state.len;
        self.update_slice();
    }

    pub fn load_value(&mut self, value: &serde_json::Value) -> Result<(), ScrollError> {
        let state = PersistentState::from_value(value)?;
        self.load(&state);
        Ok(())
    }

    // ── per-frame drive ──────────────────────────────────────────────

    /// Advances the whole pipeline by `dt` seconds. Returns foreign
    /// action completions for wrappers.
    pub fn tick(&mut self, dt: f32) -> Vec<(NodeId, &'static str)> {
        self.listener.check();
        if std::mem::take(&mut self.shared.borrow_mut().source_dirty) {
            self.on_source_dirty();
        }

        self.queue.poll();

        let raw = std::mem::take(&mut self.shared.borrow_mut().raw_slices);
        for (data, time, request) in raw {
            self.on_slice_data(data, time, request);
        }

        let assembled = std::mem::take(&mut self.shared.borrow_mut().assembled);
        for (items, time, request) in assembled {
            match items {
                Some(items) => self.on_slice_items(items, time, request),
                None => self.on_handler_failure(time, request),
            }
        }

        let leftovers = self.view.tick(dt);

        let pending = std::mem::take(&mut self.shared.borrow_mut().pending_requests);
        for request in pending {
            match request {
                Request::Front => {
                    self.request_front_slice(0);
                }
                Request::Back => {
                    self.request_back_slice(0);
                }
                Request::Reset => {
                    self.reset_slice();
                }
                Request::Update => {
                    self.update_slice();
                }
            }
        }

        leftovers
    }

    /// Whether slice work (requests or assembly) is still in flight.
    pub fn is_idle(&self) -> bool {
        let shared = self.shared.borrow();
        self.queue.is_idle()
            && shared.pending_requests.is_empty()
            && shared.raw_slices.is_empty()
            && shared.assembled.is_empty()
    }

    // ── source bookkeeping ───────────────────────────────────────────

    fn on_source_dirty(&mut self) {
        let viewport = self.view.tree().content_size(self.view.container());
        let main = self.view.axis().main_size(viewport);
        if main == 0.0 {
            return;
        }

        if !self.listener.is_bound() || self.items.borrow().is_empty() {
            self.install_reset_loader();
        }
        let Some(source) = self.listener.target().cloned() else {
            return;
        };

        let init = self.items_count == 0;
        self.items_count = source.count(self.lookup_level, self.items_for_subcats);
        log::debug!(
            "source dirty: {} items (slice_max {})",
            self.items_count,
            self.slice_max
        );

        if self.items_count == 0 {
            self.category_dirty = true;
            self.current_slice_start = Id(0);
            self.current_slice_len = 0;
            self.sync_bounds();
            return;
        } else if self.items_count <= self.slice_max {
            self.slices_count = 1;
            self.slice_size = self.items_count;
        } else {
            self.slices_count = (self.items_count + self.slice_max - 1) / self.slice_max;
            self.slice_size = self.items_count / self.slices_count + 1;
        }

        if (!init && self.category_dirty) || self.current_slice_len == 0 {
            self.reset_slice();
        } else {
            self.update_slice();
        }

        self.view.set_scroll_dirty();
        self.category_dirty = false;
        self.sync_bounds();
    }

    fn sync_bounds(&self) {
        self.shared.borrow_mut().bounds = (
            self.current_slice_start.get(),
            self.current_slice_len,
            self.items_count,
        );
    }

    // ── request pipeline ─────────────────────────────────────────────

    fn request_slice(&mut self, first: Id, count: usize, request: Request) -> bool {
        let Some(source) = self.listener.target().cloned() else {
            return false;
        };
        if first.get() as usize >= self.items_count {
            return false;
        }

        let mut first = first;
        let mut count = count;
        if first.get() as usize + count > self.items_count {
            count = self.items_count - first.get() as usize;
        }
        if self.use_category_bounds {
            source.set_category_bounds(
                &mut first,
                &mut count,
                self.lookup_level,
                self.items_for_subcats,
            );
        }

        let stamp = Instant::now();
        self.invalidate_after = stamp;
        log::debug!("requesting {request:?} slice [{}, +{count})", first.get());

        let sink = self.shared.clone();
        source.get_slice_data(
            Box::new(move |data| {
                sink.borrow_mut().raw_slices.push((data, stamp, request));
            }),
            first,
            count,
            self.lookup_level,
            self.items_for_subcats,
        );
        true
    }

    pub fn update_slice(&mut self) -> bool {
        let mut size = self.current_slice_len.max(self.slice_size);
        let mut first = self.current_slice_start;
        if size > self.items_count {
            size = self.items_count;
        }
        if first.get() as usize > self.items_count.saturating_sub(size) {
            first = Id((self.items_count - size) as u64);
        }
        self.request_slice(first, size, Request::Update)
    }

    pub fn reset_slice(&mut self) -> bool {
        if !self.listener.is_bound() {
            return false;
        }
        let mut start = self.slice_origin.get() as i64 - self.slice_size as i64 / 2;
        if start + self.slice_size as i64 > self.items_count as i64 {
            start = self.items_count as i64 - self.slice_size as i64;
        }
        if start < 0 {
            start = 0;
        }
        self.request_slice(Id(start as u64), self.slice_size, Request::Reset)
    }

    pub fn request_front_slice(&mut self, size: usize) -> bool {
        let mut size = if size == 0 { self.slice_size } else { size };
        if !self.listener.is_bound() || self.current_slice_start.is_zero() {
            return false;
        }
        let first;
        if self.current_slice_start.get() > self.slice_size as u64 {
            first = Id(self.current_slice_start.get() - self.slice_size as u64);
        } else {
            first = Id(0);
            size = self.current_slice_start.get() as usize;
        }
        self.request_slice(first, size, Request::Front)
    }

    pub fn request_back_slice(&mut self, size: usize) -> bool {
        let size = if size == 0 { self.slice_size } else { size };
        if !self.listener.is_bound()
            || self.current_slice_start.get() as usize + self.current_slice_len == self.items_count
        {
            return false;
        }
        let first = Id(self.current_slice_start.get() + self.current_slice_len as u64);
        self.request_slice(first, size, Request::Back)
    }

    // ── slice arrival ────────────────────────────────────────────────

    fn handler_context(&self) -> HandlerContext {
        let axis = self.view.axis();
        let viewport = self.view.tree().content_size(self.view.container());
        let items = self.items.borrow();
        let (origin_front, origin_back) = match (items.values().next(), items.values().last()) {
            (Some(first), Some(last)) => {
                let end = last.position + axis.position_for(axis.main_size(last.size));
                (first.position, end)
            }
            _ => (Vec2::ZERO, Vec2::ZERO),
        };
        HandlerContext {
            axis,
            viewport,
            padding: self.view.padding(),
            origin_front,
            origin_back,
        }
    }

    /// Ships a slice's data to the worker for placement assembly.
    fn on_slice_data(&mut self, data: DataMap, time: Instant, request: Request) {
        if time < self.invalidate_after {
            log::debug!("dropping superseded {request:?} slice");
            return;
        }
        let request = if self.items.borrow().is_empty() && request != Request::Update {
            Request::Reset
        } else {
            request
        };

        let ctx = self.handler_context();
        let mut handler = (self.handler_factory)(&ctx);
        let min_load = if request == Request::Update {
            Duration::ZERO
        } else {
            self.min_load_time
        };
        let started = Instant::now();

        let sink = self.shared.clone();
        self.queue.perform(
            move || {
                let result =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                        let mut items = handler.run(request, data);
                        for (id, item) in items.iter_mut() {
                            item.id = id.get();
                        }
                        items
                    }));
                let elapsed = started.elapsed();
                if elapsed < min_load {
                    std::thread::sleep(min_load - elapsed);
                }
                result.ok()
            },
            move |items| {
                sink.borrow_mut().assembled.push((items, time, request));
            },
        );
    }

    /// A handler failure during placement is fatal for the slice: the
    /// controller reverts to the empty state.
    fn on_handler_failure(&mut self, time: Instant, request: Request) {
        if time < self.invalidate_after {
            return;
        }
        let error = ScrollError::HandlerFailed(format!("{request:?} placement panicked"));
        log::error!("{error}");
        self.items.borrow_mut().clear();
        self.current_slice_start = Id(0);
        self.current_slice_len = 0;
        self.sync_bounds();
        self.install_reset_loader();
    }

    /// Adopts assembled placements: merge, evict, rebuild, re-seek.
    fn on_slice_items(&mut self, mut items: ItemMap, time: Instant, request: Request) {
        if time < self.invalidate_after {
            return;
        }
        if items.is_empty() && request != Request::Update {
            return;
        }

        if request == Request::Front || request == Request::Back {
            // Retain at most one page of history; the map converges to
            // the most-recent window as further pages arrive. Evicting
            // ahead of the merge keeps the viewport inside the area
            // (dropping the page under it would clamp the scroll onto
            // the opposite loader and re-request what was just
            // evicted).
            let mut existing = self.items.borrow().clone();
            let limit = self.slice_size.max(1);
            if existing.len() > limit {
                match request {
                    Request::Back => {
                        while existing.len() > limit {
                            existing.pop_first();
                        }
                    }
                    Request::Front => {
                        while existing.len() > limit {
                            existing.pop_last();
                        }
                    }
                    _ => {}
                }
            }
            for (id, item) in existing {
                items.entry(id).or_insert(item);
            }
        }

        *self.items.borrow_mut() = items;
        {
            let items = self.items.borrow();
            if let (Some(first), Some(last)) = (items.keys().next(), items.keys().last()) {
                self.current_slice_start = *first;
                self.current_slice_len = (last.get() + 1 - first.get()) as usize;
            } else {
                self.current_slice_start = Id(0);
                self.current_slice_len = 0;
            }
        }
        self.sync_bounds();

        // Seed the scroll target before the rebuild so the window pass
        // already runs at the restored position; a pass at the stale
        // position would materialise a loader and file a phantom page
        // request.
        let relative = self.view.scroll_relative_position();
        match request {
            Request::Update => self.view.defer_relative_position(relative),
            Request::Reset => {
                let target = self.origin_relative_position().unwrap_or(0.0);
                self.view.defer_relative_position(target);
            }
            _ => {}
        }
        self.rebuild_items();
    }

    /// Relative position of the origin item inside the slice.
    fn origin_relative_position(&self) -> Option<f32> {
        if self.slice_origin.is_zero() {
            return None;
        }
        let items = self.items.borrow();
        let origin = items.get(&self.slice_origin)?;
        let first = items.values().next()?;
        let last = items.values().last()?;
        let axis = self.view.axis();
        let span = axis.main_pos(last.position) - axis.main_pos(first.position);
        if span == 0.0 {
            return None;
        }
        Some(((axis.main_pos(origin.position) - axis.main_pos(first.position)) / span).abs())
    }

    // ── controller rebuild ───────────────────────────────────────────

    fn install_reset_loader(&mut self) {
        let loader_size = self.loader_size;
        let loader_factory = self.loader_factory.clone();
        let mut parts = self.view.parts();
        let Some(controller) = parts.controller.as_deref_mut() else {
            return;
        };
        controller.clear(parts.tree);
        controller.add_item(
            Box::new(move |_, tree| {
                let node = match &loader_factory {
                    Some(factory) => factory(Request::Reset, tree),
                    None => tree.create(),
                };
                Some(ItemNode::plain(node))
            }),
            loader_size,
            0.0,
        );
    }

    fn loader_item_factory(&self, request: Request) -> crate::ItemFactory {
        let shared = self.shared.clone();
        let loader_factory = self.loader_factory.clone();
        Box::new(move |_, tree| {
            shared.borrow_mut().pending_requests.push(request);
            let node = match &loader_factory {
                Some(factory) => factory(request, tree),
                None => tree.create(),
            };
            Some(ItemNode::plain(node))
        })
    }

    fn slice_item_factory(&self, id: Id) -> crate::ItemFactory {
        let items = self.items.clone();
        let item_factory = self.item_factory.clone();
        let axis = self.view.axis();
        Box::new(move |entry, tree| {
            if axis.main_size(entry.size) <= 0.0 {
                return None;
            }
            let items = items.borrow();
            let slice_item = items.get(&id)?;
            match &item_factory {
                Some(factory) => factory(slice_item, tree),
                None => Some(ItemNode::plain(tree.create())),
            }
        })
    }

    /// Rebuilds the controller's list from the resident slice, with
    /// loader sentinels on uncovered ends.
    fn rebuild_items(&mut self) {
        let axis = self.view.axis();
        let snapshot: Vec<(Id, Vec2, Size)> = self
            .items
            .borrow()
            .iter()
            .map(|(id, item)| (*id, item.position, item.size))
            .collect();
        let loader_size = self.loader_size;
        let items_count = self.items_count;

        let front_loader = self.loader_item_factory(Request::Front);
        let back_loader = self.loader_item_factory(Request::Back);
        let reset_loader = self.loader_item_factory(Request::Reset);
        let factories: Vec<crate::ItemFactory> = snapshot
            .iter()
            .map(|(id, _, _)| self.slice_item_factory(*id))
            .collect();

        {
            let mut parts = self.view.parts();
            let Some(controller) = parts.controller.as_deref_mut() else {
                return;
            };
            controller.clear(parts.tree);

            if !snapshot.is_empty() {
                let (first_id, first_pos, _) = snapshot[0];
                if first_id.get() > 0 {
                    controller.add_item(
                        front_loader,
                        loader_size,
                        axis.main_pos(first_pos) - loader_size,
                    );
                }

                for ((id, pos, size), factory) in snapshot.iter().zip(factories) {
                    let controller_id = controller.add_item_at(factory, *size, *pos, 0, None);
                    if let Some(item) = self.items.borrow_mut().get_mut(id) {
                        item.controller_id = controller_id;
                    }
                }

                let (last_id, last_pos, last_size) = snapshot[snapshot.len() - 1];
                if (last_id.get() as usize) < items_count.saturating_sub(1) {
                    controller.add_item(
                        back_loader,
                        loader_size,
                        axis.main_pos(last_pos) + axis.main_size(last_size),
                    );
                }
            } else {
                controller.add_item(reset_loader, loader_size, 0.0);
            }
        }

        // Rebuild the window without treating the splice as motion.
        let movement = self.view.movement();
        self.view.set_movement(crate::Movement::None);
        self.view.on_scroll_position(true);
        self.view.set_movement(movement);

        self.update_indicator_range();
    }

    /// Replaces the slice with a compacted map after recycler removal:
    /// ids renumbered, the source notified, the controller rebuilt.
    pub(crate) fn apply_compaction(&mut self, compacted: ItemMap, removed: Vec<Id>) {
        if removed.is_empty() {
            return;
        }
        if let Some(source) = self.listener.target().cloned() {
            for id in &removed {
                source.remove_item(*id, self.lookup_level, self.items_for_subcats);
            }
        }
        self.items_count = self.items_count.saturating_sub(removed.len());
        *self.items.borrow_mut() = compacted;
        {
            let items = self.items.borrow();
            if let (Some(first), Some(last)) = (items.keys().next(), items.keys().last()) {
                self.current_slice_start = *first;
                self.current_slice_len = (last.get() + 1 - first.get()) as usize;
            } else {
                self.current_slice_start = Id(0);
                self.current_slice_len = 0;
            }
        }
        self.sync_bounds();
        self.rebuild_items();
        self.view.on_scroll_position(true);
    }

    pub(crate) fn items_rc(&self) -> Rc<RefCell<ItemMap>> {
        self.items.clone()
    }

    /// Extrapolates indicator bounds over the unfetched range.
    fn update_indicator_range(&mut self) {
        if self.current_slice_len == 0 || self.items_count == 0 {
            self.view.set_indicator_range(None);
            return;
        }
        let (Some(length), Some(min), Some(max)) = (
            self.view.scroll_length(),
            self.view.scroll_min_position(),
            self.view.scroll_max_position(),
        ) else {
            self.view.set_indicator_range(None);
            return;
        };
        let item_size = length / self.current_slice_len as f32;
        let total_length = item_size * self.items_count as f32;
        let start = self.current_slice_start.get() as f32;
        let tail = self
            .items_count
            .saturating_sub(self.current_slice_start.get() as usize)
            .saturating_sub(self.current_slice_len) as f32;
        self.view.set_indicator_range(Some((
            min - start * item_size,
            max + tail * item_size,
            total_length,
        )));
    }
}

#[cfg(test)]
#[path = "tests/sliced_tests.rs"]
mod tests;
