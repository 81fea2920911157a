//! Swipe-to-remove rows over a sliced scroll.
//!
//! Every materialised row wraps the user's content node in a container
//! hosting a holder layer (removal icon, placeholder text, undo
//! affordance). Removal is two-phase: a full swipe prepares the row,
//! a second swipe or a 5 s timeout commits it; undo restores it with
//! nothing else having moved. Commits collapse the row over 200 ms,
//! compact the slice, renumber ids and notify the data source.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slipstream_animation::{Action, BounceMotion, Easing, MotionProfile, ProgressAction};
use slipstream_data::{DataSource, Id};
use slipstream_geometry::{Axis, Size, Vec2};
use slipstream_node::{GestureEvent, GesturePhase, NodeId, NodeTree, Swipe};

use crate::{HandlerFactory, ItemMap, ItemNode, SliceItem, SlicedScroll};

const ROW_SWIPE_ACTION: &str = "recycler-swipe";
const ROW_RESTORE_ACTION: &str = "recycler-restore";
const CLEANUP_DELAY_ACTION: &str = "recycler-cleanup-delay";

/// Seconds a prepared row waits before its removal commits.
const CLEANUP_DELAY: f32 = 5.0;
/// Duration of the collapse/heal tween.
const CLEANUP_TWEEN: f32 = 0.2;
/// Duration of the undo restore tween.
const RESTORE_TWEEN: f32 = 0.35;
/// Row swipe deceleration, logical/s².
const ROW_DECELERATION: f32 = 5000.0;
/// Row swipe return-spring cap.
const ROW_SPRING_CAP: f32 = 50_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowPhase {
    Enabled,
    Prepared,
    Removed,
}

struct RowState {
    phase: RowPhase,
    /// Content offset as a fraction of row width while Enabled.
    enabled_progress: f32,
    /// Holder offset fraction while Prepared.
    prepared_progress: f32,
    item_id: Id,
    container: NodeId,
    content: NodeId,
    holder: NodeId,
}

type Rows = Rc<RefCell<HashMap<NodeId, RowState>>>;

struct TweenRect {
    controller_index: usize,
    start_pos: Vec2,
    start_size: Size,
    target_pos: Vec2,
    target_size: Size,
}

struct CleanupTween {
    elapsed: f32,
    rects: Vec<TweenRect>,
}

pub type RowFactory = Rc<dyn Fn(&SliceItem, &mut NodeTree) -> Option<ItemNode>>;

pub struct RecyclerScroll {
    scroll: SlicedScroll,
    rows: Rows,
    cleanup_tween: Option<CleanupTween>,
    /// Fraction targets pending per row swipe action, keyed by the
    /// animated node.
    swipe_targets: HashMap<NodeId, f32>,
    placeholder_text: String,
    placeholder_button_text: String,
}

impl RecyclerScroll {
    /// A vertical recycler over `source`; `row_factory` produces the
    /// content node for each slice item.
    pub fn new(
        source: Option<DataSource>,
        viewport: Size,
        handler_factory: HandlerFactory,
        row_factory: RowFactory,
    ) -> Self {
        let mut scroll = SlicedScroll::new(source, Axis::Vertical, viewport, handler_factory);

        let rows: Rows = Rc::new(RefCell::new(HashMap::new()));
        let factory_rows = rows.clone();
        scroll.set_item_factory(move |slice_item, tree| {
            let inner = row_factory(slice_item, tree)?;
            let container = tree.create();
            let holder = tree.create();
            tree.add_child(container, holder, 1);
            tree.add_child(container, inner.node, 2);
            tree.set_visible(holder, false);
            factory_rows.borrow_mut().insert(
                container,
                RowState {
                    phase: RowPhase::Enabled,
                    enabled_progress: 0.0,
                    prepared_progress: 0.0,
                    item_id: Id(slice_item.id),
                    container,
                    content: inner.node,
                    holder,
                },
            );
            Some(ItemNode {
                node: container,
                handle: inner.handle,
            })
        });

        Self {
            scroll,
            rows,
            cleanup_tween: None,
            swipe_targets: HashMap::new(),
            placeholder_text: String::from("Removed"),
            placeholder_button_text: String::from("Restore"),
        }
    }

    pub fn scroll(&self) -> &SlicedScroll {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut SlicedScroll {
        &mut self.scroll
    }

    pub fn set_placeholder_text(&mut self, text: impl Into<String>) {
        self.placeholder_text = text.into();
    }

    pub fn placeholder_text(&self) -> &str {
        &self.placeholder_text
    }

    pub fn set_placeholder_button_text(&mut self, text: impl Into<String>) {
        self.placeholder_button_text = text.into();
    }

    pub fn placeholder_button_text(&self) -> &str {
        &self.placeholder_button_text
    }

    pub fn row_phase(&self, container: NodeId) -> Option<RowPhase> {
        self.rows.borrow().get(&container).map(|row| row.phase)
    }

    /// Containers of currently materialised rows.
    pub fn row_containers(&self) -> Vec<NodeId> {
        self.rows.borrow().keys().copied().collect()
    }

    pub fn row_for_item(&self, id: Id) -> Option<NodeId> {
        self.rows
            .borrow()
            .values()
            .find(|row| row.item_id == id)
            .map(|row| row.container)
    }

    // ── scroll gestures ──────────────────────────────────────────────

    /// Vertical scroll gestures; a fresh swipe commits any pending
    /// removals immediately.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> bool {
        if let GestureEvent::Swipe(GesturePhase::Began, _) = event {
            self.unschedule_cleanup();
            self.perform_cleanup();
        }
        self.scroll.view_mut().handle_gesture(event)
    }

    // ── row swipes ───────────────────────────────────────────────────

    /// Horizontal swipe routed to one row. Returns whether the row
    /// consumed it.
    pub fn handle_row_swipe(
        &mut self,
        container: NodeId,
        phase: GesturePhase,
        swipe: Swipe,
    ) -> bool {
        let Some((animated, width)) = ({
            let rows = self.rows.borrow();
            rows.get(&container).map(|row| {
                let width = self
                    .scroll
                    .view()
                    .tree()
                    .content_size(row.container)
                    .width;
                let animated = match row.phase {
                    RowPhase::Enabled => row.content,
                    _ => row.holder,
                };
                (animated, width)
            })
        }) else {
            return false;
        };
        if width <= 0.0 {
            return false;
        }

        match phase {
            GesturePhase::Began => {
                if (swipe.delta.x * 2.0).abs() <= swipe.delta.y.abs() {
                    return false;
                }
                self.unschedule_cleanup();
                self.scroll
                    .view_mut()
                    .runner_mut()
                    .stop_tag(animated, ROW_SWIPE_ACTION);
                self.swipe_targets.remove(&animated);
                self.apply_row_delta(container, animated, width, swipe.delta.x);
                true
            }
            GesturePhase::Activated => {
                self.apply_row_delta(container, animated, width, swipe.delta.x);
                true
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.finish_row_swipe(animated, width, swipe.velocity.x);
                true
            }
        }
    }

    fn apply_row_delta(&mut self, container: NodeId, animated: NodeId, width: f32, dx: f32) {
        let tree = self.scroll.view_mut().tree_mut();
        let pos = tree.position(animated);
        tree.set_position(animated, Vec2::new(pos.x + dx, pos.y));
        let progress = (pos.x + dx) / width;

        let mut rows = self.rows.borrow_mut();
        if let Some(row) = rows.get_mut(&container) {
            match row.phase {
                RowPhase::Enabled => row.enabled_progress = progress,
                _ => row.prepared_progress = progress,
            }
        }
        drop(rows);
        self.layout_row(container);
    }

    /// Projects the rest position and springs to 0 or a full side.
    fn finish_row_swipe(&mut self, animated: NodeId, width: f32, velocity: f32) {
        let pos = self.scroll.view().tree().position(animated).x;
        let duration = velocity.abs() / ROW_DECELERATION;
        let path =
            velocity * duration - velocity.signum() * ROW_DECELERATION * duration * duration * 0.5;

        let projected = (pos + path) / width;
        let target = if projected.abs() < 0.5 {
            0.0
        } else {
            width.copysign(projected)
        };

        self.swipe_targets.insert(animated, target / width);
        let motion = BounceMotion::new(
            pos,
            target,
            velocity,
            ROW_DECELERATION,
            ROW_SPRING_CAP,
        );
        self.scroll.view_mut().runner_mut().run(
            animated,
            ROW_SWIPE_ACTION,
            Action::motion(MotionProfile::Bounce(motion), Vec2::new(1.0, 0.0)),
        );
        self.schedule_cleanup();
    }

    fn on_row_swipe_settled(&mut self, animated: NodeId) {
        let Some(target) = self.swipe_targets.remove(&animated) else {
            return;
        };
        let container = {
            let rows = self.rows.borrow();
            rows.values()
                .find(|row| row.content == animated || row.holder == animated)
                .map(|row| row.container)
        };
        let Some(container) = container else {
            return;
        };

        let fired = {
            let mut rows = self.rows.borrow_mut();
            let Some(row) = rows.get_mut(&container) else {
                return;
            };
            match row.phase {
                RowPhase::Enabled => {
                    row.enabled_progress = target;
                    if target.abs() >= 1.0 {
                        row.phase = RowPhase::Prepared;
                        row.prepared_progress = 0.0;
                        Some(RowPhase::Prepared)
                    } else {
                        None
                    }
                }
                RowPhase::Prepared => {
                    row.prepared_progress = target;
                    if target.abs() >= 1.0 {
                        row.phase = RowPhase::Removed;
                        Some(RowPhase::Removed)
                    } else {
                        None
                    }
                }
                RowPhase::Removed => None,
            }
        };

        self.layout_row(container);
        match fired {
            Some(RowPhase::Prepared) => self.schedule_cleanup(),
            Some(RowPhase::Removed) => self.commit_row(container),
            _ => {}
        }
    }

    /// Undo: a prepared row returns to normal; neighbours never moved.
    pub fn restore_row(&mut self, container: NodeId) {
        let (content, from) = {
            let mut rows = self.rows.borrow_mut();
            let Some(row) = rows.get_mut(&container) else {
                return;
            };
            if row.phase != RowPhase::Prepared {
                return;
            }
            row.phase = RowPhase::Enabled;
            (row.content, row.enabled_progress)
        };
        self.unschedule_cleanup();

        let rows = self.rows.clone();
        let spec = ProgressAction::new(RESTORE_TWEEN, from, 0.0)
            .with_easing(Easing::QuadOut)
            .on_progress(move |p| {
                if let Some(row) = rows.borrow_mut().get_mut(&container) {
                    row.enabled_progress = p;
                }
            });
        self.scroll.view_mut().runner_mut().run(
            content,
            ROW_RESTORE_ACTION,
            Action::progress(spec),
        );
        self.schedule_cleanup();
    }

    // ── cleanup scheduling ───────────────────────────────────────────

    pub fn schedule_cleanup(&mut self) {
        let container = self.scroll.view().container();
        self.scroll.view_mut().runner_mut().run(
            container,
            CLEANUP_DELAY_ACTION,
            Action::delay(CLEANUP_DELAY),
        );
    }

    pub fn unschedule_cleanup(&mut self) {
        let container = self.scroll.view().container();
        self.scroll
            .view_mut()
            .runner_mut()
            .stop_tag(container, CLEANUP_DELAY_ACTION);
    }

    /// A single committed row starts its collapse immediately.
    fn commit_row(&mut self, container: NodeId) {
        self.start_cleanup_tween(vec![container]);
        self.schedule_cleanup();
    }

    /// Collapses every non-enabled, non-locked row.
    pub fn perform_cleanup(&mut self) {
        let pending: Vec<NodeId> = {
            let rows = self.rows.borrow();
            rows.values()
                .filter(|row| row.phase != RowPhase::Enabled)
                .map(|row| row.container)
                .collect()
        };
        if !pending.is_empty() {
            self.start_cleanup_tween(pending);
        }
    }

    /// Builds the simultaneous position+size tween that heals the
    /// layout over the collapsing rows.
    fn start_cleanup_tween(&mut self, containers: Vec<NodeId>) {
        if self.cleanup_tween.is_some() {
            return;
        }

        // Locked rows are exempt from the sweep.
        let containers: Vec<NodeId> = {
            let view = self.scroll.view();
            let Some(controller) = view.controller() else {
                return;
            };
            containers
                .into_iter()
                .filter(|container| {
                    controller
                        .get_item_by_node(*container)
                        .and_then(|item| item.handle.as_ref())
                        .map(|handle| !handle.is_locked())
                        .unwrap_or(true)
                })
                .collect()
        };
        if containers.is_empty() {
            return;
        }

        let mut rects = Vec::new();
        {
            let view = self.scroll.view();
            let Some(controller) = view.controller() else {
                return;
            };
            let mut offset = 0.0;
            for (index, item) in controller.items().iter().enumerate() {
                let collapsing = item
                    .node
                    .map(|node| containers.contains(&node))
                    .unwrap_or(false);
                // Rows stay put above the removal; below it they slide
                // up by the accumulated removed height.
                if collapsing {
                    offset += item.size.height;
                    rects.push(TweenRect {
                        controller_index: index,
                        start_pos: item.position,
                        start_size: item.size,
                        target_pos: Vec2::new(item.position.x, item.position.y - offset),
                        target_size: Size::new(item.size.width, 0.0),
                    });
                } else {
                    rects.push(TweenRect {
                        controller_index: index,
                        start_pos: item.position,
                        start_size: item.size,
                        target_pos: Vec2::new(item.position.x, item.position.y - offset),
                        target_size: item.size,
                    });
                }
            }
        }

        // Mirror the collapse into the slice map up front.
        {
            let rows = self.rows.borrow();
            let removed_ids: Vec<Id> = containers
                .iter()
                .filter_map(|c| rows.get(c).map(|row| row.item_id))
                .collect();
            let items = self.scroll.items_rc();
            let mut items = items.borrow_mut();
            let mut offset = 0.0;
            for (id, item) in items.iter_mut() {
                if removed_ids.contains(id) {
                    offset += item.size.height;
                    item.size = Size::new(item.size.width, 0.0);
                    item.position = Vec2::new(item.position.x, item.position.y - offset);
                } else {
                    item.position = Vec2::new(item.position.x, item.position.y - offset);
                }
            }
        }

        self.cleanup_tween = Some(CleanupTween {
            elapsed: 0.0,
            rects,
        });
    }

    fn advance_cleanup_tween(&mut self, dt: f32) {
        let Some(mut tween) = self.cleanup_tween.take() else {
            return;
        };
        tween.elapsed += dt;
        let fraction = (tween.elapsed / CLEANUP_TWEEN).clamp(0.0, 1.0);

        {
            let mut parts = self.scroll.view_mut().parts();
            let Some(controller) = parts.controller.as_deref_mut() else {
                return;
            };
            for rect in &tween.rects {
                let Some(item) = controller.get_item_mut(rect.controller_index) else {
                    continue;
                };
                item.position = rect.start_pos + (rect.target_pos - rect.start_pos) * fraction;
                item.size = Size::new(
                    rect.start_size.width
                        + (rect.target_size.width - rect.start_size.width) * fraction,
                    rect.start_size.height
                        + (rect.target_size.height - rect.start_size.height) * fraction,
                );
                if let Some(node) = item.node {
                    let (position, size, z) = (item.position, item.size, item.z_index);
                    let mut host = crate::NodeHost {
                        tree: &mut *parts.tree,
                        axis: parts.axis,
                        root: parts.root,
                    };
                    host.update_scroll_node(node, position, size, z);
                }
            }
        }
        self.scroll.view_mut().on_scroll_position(true);

        if fraction >= 1.0 {
            self.finish_cleanup();
        } else {
            self.cleanup_tween = Some(tween);
        }
    }

    /// Compaction: drop zero-sized entries, renumber ids, notify the
    /// source, rebuild the controller.
    fn finish_cleanup(&mut self) {
        let items = self.scroll.items_rc();
        let old: ItemMap = std::mem::take(&mut *items.borrow_mut());

        let mut compacted = ItemMap::new();
        let mut removed = Vec::new();
        let mut offset = 0u64;
        for (id, mut item) in old {
            if item.size.height == 0.0 {
                removed.push(id);
                offset += 1;
            } else {
                item.id = id.get() - offset;
                compacted.insert(Id(id.get() - offset), item);
            }
        }

        // Dead rows vanish with their nodes on the rebuild.
        {
            let rows = self.rows.borrow();
            let removed_containers: Vec<NodeId> = rows
                .values()
                .filter(|row| removed.contains(&row.item_id))
                .map(|row| row.container)
                .collect();
            drop(rows);
            let mut rows = self.rows.borrow_mut();
            for container in removed_containers {
                rows.remove(&container);
            }
        }

        self.scroll.apply_compaction(compacted, removed);
    }

    // ── per-frame drive ──────────────────────────────────────────────

    pub fn tick(&mut self, dt: f32) {
        let leftovers = self.scroll.tick(dt);
        for (node, tag) in leftovers {
            match tag {
                ROW_SWIPE_ACTION => self.on_row_swipe_settled(node),
                CLEANUP_DELAY_ACTION => self.perform_cleanup(),
                _ => {}
            }
        }

        self.advance_cleanup_tween(dt);
        self.refresh_rows();
    }

    fn refresh_rows(&mut self) {
        let containers: Vec<NodeId> = {
            let rows = self.rows.borrow();
            rows.keys().copied().collect()
        };
        for container in containers {
            if !self.scroll.view().tree().is_alive(container) {
                self.rows.borrow_mut().remove(&container);
                continue;
            }
            self.sync_row_progress(container);
            self.layout_row(container);
        }
    }

    /// While a row spring is running, progress follows the animated
    /// node rather than the last manual delta.
    fn sync_row_progress(&mut self, container: NodeId) {
        let update = {
            let rows = self.rows.borrow();
            let Some(row) = rows.get(&container) else {
                return;
            };
            let animated = match row.phase {
                RowPhase::Enabled => row.content,
                _ => row.holder,
            };
            let view = self.scroll.view();
            if !view.runner().has_action(animated, ROW_SWIPE_ACTION) {
                return;
            }
            let width = view.tree().content_size(container).width;
            if width <= 0.0 {
                return;
            }
            Some((row.phase, view.tree().position(animated).x / width))
        };
        if let Some((phase, progress)) = update {
            let mut rows = self.rows.borrow_mut();
            if let Some(row) = rows.get_mut(&container) {
                match phase {
                    RowPhase::Enabled => row.enabled_progress = progress,
                    _ => row.prepared_progress = progress,
                }
            }
        }
    }

    /// Applies the row's progress to its content/holder layers.
    fn layout_row(&mut self, container: NodeId) {
        let Some((phase, enabled, prepared, content, holder)) = ({
            let rows = self.rows.borrow();
            rows.get(&container).map(|row| {
                (
                    row.phase,
                    row.enabled_progress,
                    row.prepared_progress,
                    row.content,
                    row.holder,
                )
            })
        }) else {
            return;
        };
        let tree = self.scroll.view_mut().tree_mut();
        if !tree.is_alive(container) {
            return;
        }
        let size = tree.content_size(container);

        match phase {
            RowPhase::Enabled => {
                tree.set_visible(content, true);
                tree.set_position(content, Vec2::new(size.width * enabled, 0.0));
                tree.set_content_size(content, size);
                if enabled.abs() < f32::EPSILON {
                    tree.set_visible(holder, false);
                } else if enabled > 0.0 {
                    tree.set_visible(holder, true);
                    tree.set_position(holder, Vec2::ZERO);
                    tree.set_content_size(
                        holder,
                        Size::new(size.width * enabled.abs(), size.height),
                    );
                } else {
                    tree.set_visible(holder, true);
                    tree.set_position(
                        holder,
                        Vec2::new(size.width * (1.0 - enabled.abs()), 0.0),
                    );
                    tree.set_content_size(
                        holder,
                        Size::new(size.width * enabled.abs(), size.height),
                    );
                }
            }
            RowPhase::Prepared => {
                tree.set_visible(content, false);
                tree.set_visible(holder, true);
                tree.set_position(holder, Vec2::new(size.width * prepared, 0.0));
                tree.set_content_size(holder, size);
            }
            RowPhase::Removed => {
                tree.set_visible(content, false);
                tree.set_visible(holder, false);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/recycler_tests.rs"]
mod tests;
