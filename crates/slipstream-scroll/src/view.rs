//! The scroll engine.
//!
//! Owns the node tree, the content root and the controller; reduces
//! gestures to scroll-axis deltas, applies bounds and overscroll
//! compression, and drives momentum and bounce through the action
//! runner. Single-threaded; all state transitions happen in `tick`
//! and the gesture entry points.

use slipstream_animation::{
    AcceleratedMotion, Action, ActionRunner, BounceMotion, MotionProfile, Tag,
};
use slipstream_core::MovingAverage;
use slipstream_geometry::{Axis, Padding, Size, Vec2};
use slipstream_node::{GestureEvent, GestureListener, GesturePhase, NodeId, NodeTree};

use crate::{NodeHost, OverscrollIndicator, OverscrollSide, ScrollController, ScrollIndicator};

/// Action tag of the engine's own kinematics on the root node.
pub const SCROLL_ACTION: Tag = "scroll-movement";

/// Deceleration magnitude of the momentum animation, logical/s².
const MOMENTUM_DECELERATION: f32 = 5000.0;
/// Restoring acceleration of the bounce segment, logical/s².
const BOUNCE_SPRING: f32 = 5000.0;
/// Paths shorter than this snap instead of animating.
const SNAP_THRESHOLD: f32 = 2.0;
/// Logical units scrolled per mouse-wheel notch.
const WHEEL_STEP: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    None,
    Manual,
    Auto,
    Overscroll,
}

/// Mutable views over an engine's collaborators, borrow-split so a
/// wrapper can drive the controller and the tree in one scope.
pub struct ScrollViewParts<'a> {
    pub controller: Option<&'a mut ScrollController>,
    pub tree: &'a mut NodeTree,
    pub runner: &'a mut ActionRunner,
    pub axis: Axis,
    pub root: NodeId,
    pub container: NodeId,
}

pub type ScrollCallback = Box<dyn Fn(f32, bool)>;
pub type OverscrollCallback = Box<dyn Fn(f32)>;
pub type ScrollFilterCallback = Box<dyn Fn(f32) -> f32>;
pub type TapCallback = Box<dyn Fn(u32, Vec2)>;

pub struct ScrollView {
    tree: NodeTree,
    runner: ActionRunner,
    container: NodeId,
    root: NodeId,
    axis: Axis,
    padding: Padding,
    listener: GestureListener,

    movement: Movement,
    bounce: bool,
    scroll_size: f32,
    scroll_position: f32,
    scroll_min: Option<f32>,
    scroll_max: Option<f32>,
    area: Option<(f32, f32)>,
    scroll_dirty: bool,
    animation_dirty: bool,
    saved_relative_position: Option<f32>,
    max_velocity: Option<f32>,
    global_scale: Vec2,
    swipe_velocity: MovingAverage<8>,

    // Momentum bookkeeping for the segment split at a boundary.
    overscroll_after_motion: Option<f32>,
    auto_exit_velocity: f32,
    auto_boundary: Option<f32>,

    controller: Option<ScrollController>,
    scroll_callback: Option<ScrollCallback>,
    overscroll_callback: Option<OverscrollCallback>,
    overscroll_filter: Option<Box<dyn Fn(f32) -> bool>>,
    scroll_filter: Option<ScrollFilterCallback>,
    tap_callback: Option<TapCallback>,

    overscroll_front: OverscrollIndicator,
    overscroll_back: OverscrollIndicator,
    overscroll_visible: bool,
    indicator: ScrollIndicator,
    /// Extrapolated `(min, max, length)` provided by a sliced owner.
    indicator_range: Option<(f32, f32, f32)>,
}

impl ScrollView {
    pub fn new(axis: Axis, viewport: Size) -> Self {
        let mut tree = NodeTree::new();
        let container = tree.create();
        tree.set_content_size(container, viewport);
        let root = tree.create();
        tree.add_child(container, root, 0);
        tree.set_anchor_point(root, axis.anchor_point());

        // Bounce is a platform feel; off by default, flat overscroll
        // indicators take its place.
        let bounce = false;
        let overscroll_front = OverscrollIndicator::new(&mut tree, container, OverscrollSide::Front);
        let overscroll_back = OverscrollIndicator::new(&mut tree, container, OverscrollSide::Back);
        let indicator = ScrollIndicator::new(&mut tree, container);

        let mut view = Self {
            tree,
            runner: ActionRunner::new(),
            container,
            root,
            axis,
            padding: Padding::default(),
            listener: GestureListener::default(),
            movement: Movement::None,
            bounce,
            scroll_size: 0.0,
            scroll_position: 0.0,
            scroll_min: None,
            scroll_max: None,
            area: None,
            scroll_dirty: true,
            animation_dirty: false,
            saved_relative_position: None,
            max_velocity: None,
            global_scale: Vec2::new(1.0, 1.0),
            swipe_velocity: MovingAverage::new(),
            overscroll_after_motion: None,
            auto_exit_velocity: 0.0,
            auto_boundary: None,
            controller: None,
            scroll_callback: None,
            overscroll_callback: None,
            overscroll_filter: None,
            scroll_filter: None,
            tap_callback: None,
            overscroll_front,
            overscroll_back,
            overscroll_visible: !bounce,
            indicator,
            indicator_range: None,
        };
        view.apply_viewport(viewport);
        view
    }

    // ── configuration ────────────────────────────────────────────────

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_vertical(&self) -> bool {
        self.axis.is_vertical()
    }

    pub fn set_controller(&mut self, controller: Option<ScrollController>) {
        if let Some(mut old) = self.controller.take() {
            old.clear(&mut self.tree);
        }
        self.controller = controller;
        self.area = None;
        self.scroll_dirty = true;
    }

    pub fn controller(&self) -> Option<&ScrollController> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut ScrollController> {
        self.controller.as_mut()
    }

    pub fn set_padding(&mut self, padding: Padding) {
        if self.padding != padding {
            self.padding = padding;
            self.apply_viewport(self.tree.content_size(self.container));
        }
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn set_bounce(&mut self, bounce: bool) {
        self.bounce = bounce;
        self.overscroll_visible = !bounce;
    }

    pub fn is_bounce(&self) -> bool {
        self.bounce
    }

    pub fn set_overscroll_visible(&mut self, visible: bool) {
        self.overscroll_visible = visible;
    }

    pub fn set_max_velocity(&mut self, value: Option<f32>) {
        self.max_velocity = value;
    }

    pub fn max_velocity(&self) -> Option<f32> {
        self.max_velocity
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.listener.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.listener.enabled
    }

    pub fn set_scroll_callback(&mut self, cb: impl Fn(f32, bool) + 'static) {
        self.scroll_callback = Some(Box::new(cb));
    }

    pub fn set_overscroll_callback(&mut self, cb: impl Fn(f32) + 'static) {
        self.overscroll_callback = Some(Box::new(cb));
    }

    /// Consulted before an overscroll is surfaced; returning false
    /// swallows the event (the sliced scroll gates the interior ends).
    pub fn set_overscroll_filter(&mut self, cb: impl Fn(f32) -> bool + 'static) {
        self.overscroll_filter = Some(Box::new(cb));
    }

    /// Mutates manual swipe deltas before they are applied.
    pub fn set_scroll_filter(&mut self, cb: impl Fn(f32) -> f32 + 'static) {
        self.scroll_filter = Some(Box::new(cb));
    }

    pub fn set_tap_callback(&mut self, cb: impl Fn(u32, Vec2) + 'static) {
        self.tap_callback = Some(Box::new(cb));
    }

    pub(crate) fn set_indicator_range(&mut self, range: Option<(f32, f32, f32)>) {
        self.indicator_range = range;
    }

    // ── node access ──────────────────────────────────────────────────

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut ActionRunner {
        &mut self.runner
    }

    /// Split borrow over the pieces wrappers drive together.
    pub fn parts(&mut self) -> ScrollViewParts<'_> {
        ScrollViewParts {
            controller: self.controller.as_mut(),
            tree: &mut self.tree,
            runner: &mut self.runner,
            axis: self.axis,
            root: self.root,
            container: self.container,
        }
    }

    pub(crate) fn set_movement(&mut self, movement: Movement) {
        self.movement = movement;
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn front_node(&self) -> Option<NodeId> {
        self.controller.as_ref().and_then(|c| c.front_node())
    }

    pub fn back_node(&self) -> Option<NodeId> {
        self.controller.as_ref().and_then(|c| c.back_node())
    }

    pub fn set_viewport_size(&mut self, viewport: Size) {
        self.tree.set_content_size(self.container, viewport);
        self.apply_viewport(viewport);
    }

    fn apply_viewport(&mut self, viewport: Size) {
        if self.axis.is_vertical() {
            let pos = self.tree.position(self.root).y - self.scroll_size;
            self.scroll_size = viewport.height;
            self.tree.set_anchor_point(self.root, Vec2::new(0.0, 1.0));
            self.tree.set_content_size(
                self.root,
                Size::new(viewport.width - self.padding.horizontal(), 0.0),
            );
            self.tree.set_position(
                self.root,
                Vec2::new(self.padding.left, pos + self.scroll_size),
            );
        } else {
            self.scroll_size = viewport.width;
            self.tree.set_anchor_point(self.root, Vec2::new(0.0, 0.0));
            self.tree.set_content_size(
                self.root,
                Size::new(0.0, viewport.height - self.padding.vertical()),
            );
            let x = self.tree.position(self.root).x;
            self.tree
                .set_position(self.root, Vec2::new(x, self.padding.bottom));
        }
        self.tree.take_content_size_dirty(self.root);
        self.overscroll_front.layout(&mut self.tree, self.axis, viewport);
        self.overscroll_back.layout(&mut self.tree, self.axis, viewport);
        self.update_scroll_bounds();
        self.fix_position();
    }

    // ── scroll-space queries ─────────────────────────────────────────

    pub fn movement(&self) -> Movement {
        self.movement
    }

    pub fn is_touched(&self) -> bool {
        self.movement == Movement::Manual
    }

    pub fn is_moved(&self) -> bool {
        self.movement != Movement::None
    }

    pub fn scroll_size(&self) -> f32 {
        self.scroll_size
    }

    pub fn scrollable_area_offset(&self) -> Option<f32> {
        self.area.map(|(start, _)| start)
    }

    pub fn scrollable_area_size(&self) -> Option<f32> {
        self.area.map(|(_, size)| size)
    }

    pub fn scroll_min_position(&self) -> Option<f32> {
        let front = self.axis.padding_front(&self.padding);
        self.area.map(|(start, _)| start - front)
    }

    pub fn scroll_max_position(&self) -> Option<f32> {
        let front = self.axis.padding_front(&self.padding);
        let back = self.axis.padding_back(&self.padding);
        self.area.map(|(start, size)| {
            let pos = start - front;
            let padded = size + front + back;
            if padded > self.scroll_size {
                pos + padded - self.scroll_size
            } else {
                pos
            }
        })
    }

    pub fn scroll_length(&self) -> Option<f32> {
        let front = self.axis.padding_front(&self.padding);
        let back = self.axis.padding_back(&self.padding);
        if let Some((_, size)) = self.area {
            return Some(size + front + back);
        }
        match (self.scroll_min_position(), self.scroll_max_position()) {
            (Some(min), Some(max)) if max > min => Some(max - min + self.scroll_size),
            (Some(_), Some(_)) => Some(self.scroll_size),
            _ => None,
        }
    }

    pub fn distance_from_start(&self) -> Option<f32> {
        self.scroll_min_position()
            .map(|min| (self.scroll_position - min).abs())
    }

    pub fn scroll_position(&self) -> f32 {
        self.scroll_position
    }

    fn position_from_root(&self) -> f32 {
        let pos = self.tree.position(self.root);
        if self.axis.is_vertical() {
            pos.y - self.scroll_size
        } else {
            -pos.x
        }
    }

    /// Node-space root position encoding a scroll offset.
    fn point_for_scroll_position(&self, pos: f32) -> Vec2 {
        let current = self.tree.position(self.root);
        if self.axis.is_vertical() {
            Vec2::new(current.x, pos + self.scroll_size)
        } else {
            Vec2::new(-pos, current.y)
        }
    }

    /// Direction normal mapping scroll-scalar motion onto the root.
    fn motion_normal(&self) -> Vec2 {
        if self.axis.is_vertical() {
            Vec2::new(0.0, 1.0)
        } else {
            Vec2::new(-1.0, 0.0)
        }
    }

    pub fn set_scroll_position(&mut self, pos: f32) {
        if pos.is_nan() {
            log::warn!("rejecting NaN scroll position");
            return;
        }
        if pos != self.scroll_position {
            self.tree
                .set_position(self.root, self.point_for_scroll_position(pos));
            self.scroll_position = pos;
        }
    }

    // ── relative positioning ─────────────────────────────────────────

    /// Seeks to a fraction of the scrollable range, deferring until
    /// bounds are known.
    pub fn set_scroll_relative_position(&mut self, value: f32) {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };

        let front = self.axis.padding_front(&self.padding);
        let back = self.axis.padding_back(&self.padding);
        match self.area {
            Some((offset, size)) if size > 0.0 => {
                let live = size + front + back - self.scroll_size;
                let pos = value * live - front + offset;
                self.set_scroll_position(pos);
            }
            _ => {
                self.saved_relative_position = Some(value);
            }
        }
    }

    pub fn scroll_relative_position(&self) -> f32 {
        if let Some(saved) = self.saved_relative_position {
            return saved;
        }
        self.relative_position_for(self.scroll_position)
    }

    /// Parks a relative target to be applied by the next bounds
    /// update, before any window pass runs against it.
    pub(crate) fn defer_relative_position(&mut self, value: f32) {
        let value = if value.is_nan() { 0.0 } else { value };
        self.saved_relative_position = Some(value.clamp(0.0, 1.0));
    }

    pub fn relative_position_for(&self, pos: f32) -> f32 {
        let front = self.axis.padding_front(&self.padding);
        let back = self.axis.padding_back(&self.padding);
        match self.area {
            Some((offset, size)) => {
                let live = size + front + back - self.scroll_size;
                if live <= 0.0 {
                    0.0
                } else {
                    (pos - offset + front) / live
                }
            }
            None => 0.0,
        }
    }

    /// The controller-flavoured seek: drops every live node so the
    /// next pass rebuilds the window at the target.
    pub fn set_scroll_relative_value(&mut self, value: f32) {
        self.on_scroll_position(false);
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        if self.area.is_none() {
            self.saved_relative_position = Some(value);
            return;
        }
        if let Some(mut controller) = self.controller.take() {
            controller.detach_all(&mut self.tree);
            self.controller = Some(controller);
        }
        self.set_scroll_relative_position(value);
    }

    // ── bounds ───────────────────────────────────────────────────────

    pub fn scroll_min(&self) -> Option<f32> {
        self.scroll_min
    }

    pub fn scroll_max(&self) -> Option<f32> {
        self.scroll_max
    }

    pub fn set_scroll_dirty(&mut self) {
        self.scroll_dirty = true;
    }

    pub fn update_scroll_bounds(&mut self) {
        let viewport = self.tree.content_size(self.container);
        let degenerate = if self.axis.is_vertical() {
            viewport.width == 0.0
        } else {
            viewport.height == 0.0
        };
        if degenerate {
            return;
        }

        self.scroll_min = self.scroll_min_position();
        self.scroll_max = self.scroll_max_position();
        self.scroll_dirty = false;

        self.fix_position();

        if let Some(value) = self.saved_relative_position.take() {
            if self.area.is_some() {
                self.set_scroll_relative_position(value);
            } else {
                self.saved_relative_position = Some(value);
            }
        }
    }

    /// Clamps an idle position back into bounds.
    pub fn fix_position(&mut self) {
        if self.movement != Movement::None {
            return;
        }
        let pos = self.scroll_position;
        if let Some(min) = self.scroll_min {
            if pos < min {
                self.set_scroll_position(min);
                return;
            }
        }
        if let Some(max) = self.scroll_max {
            if pos > max {
                self.set_scroll_position(max);
            }
        }
    }

    // ── delta application ────────────────────────────────────────────

    /// Applies a displacement with boundary handling: compressed past
    /// a bound when bounce is on, clamped with an overscroll report
    /// otherwise.
    pub fn on_delta(&mut self, delta: f32) {
        if delta.is_nan() {
            log::warn!("rejecting NaN scroll delta");
            return;
        }
        let pos = self.scroll_position;
        if delta < 0.0 {
            if let Some(min) = self.scroll_min {
                if pos + delta < min {
                    if self.bounce {
                        let mod_factor = 1.0 / (1.0 + (min - (pos + delta)) / 5.0);
                        self.set_scroll_position(pos + delta * mod_factor);
                    } else {
                        self.on_overscroll(delta);
                        self.set_scroll_position(min);
                    }
                    return;
                }
            }
        } else if delta > 0.0 {
            if let Some(max) = self.scroll_max {
                if pos + delta > max {
                    if self.bounce {
                        let mod_factor = 1.0 / (1.0 + ((pos + delta) - max) / 5.0);
                        self.set_scroll_position(pos + delta * mod_factor);
                    } else {
                        self.on_overscroll(delta);
                        self.set_scroll_position(max);
                    }
                    return;
                }
            }
        }
        self.set_scroll_position(pos + delta);
    }

    // ── gestures ─────────────────────────────────────────────────────

    /// Entry point for platform gesture events. Returns whether the
    /// event was consumed.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> bool {
        if !self.listener.enabled {
            return false;
        }
        match event {
            GestureEvent::Tap(tap) => {
                if let Some(cb) = &self.tap_callback {
                    cb(tap.count, tap.location);
                }
                false
            }
            GestureEvent::Press(GesturePhase::Began, _) => {
                self.runner.stop_all_for(self.root);
                self.on_animation_finished();
                false
            }
            GestureEvent::Press(_, _) => true,
            GestureEvent::Swipe(phase, swipe) => self.handle_swipe(phase, swipe),
            GestureEvent::Wheel(wheel) => {
                let old = self.scroll_position;
                let scale = self.main_scale();
                let delta = if self.axis.is_vertical() {
                    wheel.amount.y * WHEEL_STEP / scale
                } else {
                    -wheel.amount.x * WHEEL_STEP / scale
                };
                self.on_delta(delta);
                self.after_position_change(old);
                self.on_scroll(self.scroll_position - old, false);
                true
            }
        }
    }

    fn main_scale(&self) -> f32 {
        let scale = self.global_scale;
        let s = if self.axis.is_vertical() {
            scale.y
        } else {
            scale.x
        };
        if s == 0.0 {
            1.0
        } else {
            s
        }
    }

    fn handle_swipe(&mut self, phase: GesturePhase, swipe: slipstream_node::Swipe) -> bool {
        let scale = self.main_scale();
        let delta = self.axis.gesture_delta(swipe.delta) / scale;
        let velocity = self.axis.gesture_delta(swipe.velocity) / scale;

        match phase {
            GesturePhase::Began => {
                let viewport = self.tree.content_size(self.container);
                let main = self.axis.main_size(viewport);
                if let Some(length) = self.scroll_length() {
                    if main >= length {
                        return false;
                    }
                }
                // Let orthogonal pans pass through.
                let main_delta = self.axis.gesture_delta(swipe.delta);
                let cross_delta = self.axis.cross_pos(swipe.delta);
                if (main_delta * 2.0).abs() <= cross_delta.abs() {
                    return false;
                }
                self.on_swipe_begin();
                self.swipe_velocity.drop_values();
                self.swipe_velocity.add_value(velocity);
                self.on_swipe(delta, velocity, false)
            }
            GesturePhase::Activated => {
                self.swipe_velocity.add_value(velocity);
                self.on_swipe(delta, velocity, false)
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.movement = Movement::None;
                let velocity = if velocity != 0.0 {
                    velocity
                } else {
                    self.swipe_velocity.average(true)
                };
                self.on_swipe(0.0, velocity, true)
            }
        }
    }

    pub fn on_swipe_begin(&mut self) {
        self.runner.stop_all_for(self.root);
        self.overscroll_after_motion = None;
        self.auto_boundary = None;
        if let Some(controller) = self.controller.as_mut() {
            controller.drop_animation_padding();
        }
        self.movement = Movement::Manual;
    }

    fn on_swipe(&mut self, delta: f32, velocity: f32, ended: bool) -> bool {
        if !ended {
            let delta = match &self.scroll_filter {
                Some(filter) => filter(delta),
                None => delta,
            };
            let old = self.scroll_position;
            self.on_delta(delta);
            self.after_position_change(old);
        } else {
            let pos = self.scroll_position;

            if let Some(min) = self.scroll_min {
                if pos < min {
                    let mod_factor = 1.0 / (1.0 + (min - pos).abs() / 5.0);
                    self.on_overscroll_performed(velocity * mod_factor, pos, min);
                    return true;
                }
            }
            if let Some(max) = self.scroll_max {
                if pos > max {
                    let mod_factor = 1.0 / (1.0 + (max - pos).abs() / 5.0);
                    self.on_overscroll_performed(velocity * mod_factor, pos, max);
                    return true;
                }
            }

            if !self.launch_momentum(velocity) {
                self.on_scroll(0.0, true);
            }
        }
        true
    }

    // ── momentum & bounce ────────────────────────────────────────────

    /// Launches the finalize animation for a released swipe. Returns
    /// false when the motion snaps or there is nothing to do.
    fn launch_momentum(&mut self, velocity: f32) -> bool {
        if velocity == 0.0 {
            return false;
        }

        let velocity = match self.max_velocity {
            Some(max) => velocity.clamp(-max.abs(), max.abs()),
            None => velocity,
        };

        let pos = self.scroll_position;
        let boundary = if velocity > 0.0 {
            self.scroll_max
        } else {
            self.scroll_min
        };

        let duration = velocity.abs() / MOMENTUM_DECELERATION;
        let path = velocity * duration
            - velocity.signum() * MOMENTUM_DECELERATION * duration * duration * 0.5;

        let mut profile: Option<AcceleratedMotion> = None;
        if let Some(boundary) = boundary {
            let distance = (boundary - pos).abs();
            if distance < SNAP_THRESHOLD && (velocity > 0.0) == (boundary > pos) {
                self.set_scroll_position(boundary);
                return false;
            }
            if (velocity > 0.0 && pos + path > boundary)
                || (velocity < 0.0 && pos + path < boundary)
            {
                let motion =
                    AcceleratedMotion::accelerate_to(pos, boundary, velocity, MOMENTUM_DECELERATION);
                // Residual displacement the indicator reports once the
                // leg reaches the boundary.
                let travelled = boundary - pos;
                self.overscroll_after_motion = Some(path - travelled);
                self.auto_exit_velocity = motion.exit_velocity();
                self.auto_boundary = Some(boundary);
                profile = Some(motion);
            }
        }

        let motion = profile.unwrap_or_else(|| {
            self.auto_exit_velocity = 0.0;
            self.auto_boundary = None;
            AcceleratedMotion::decelerate(pos, velocity, MOMENTUM_DECELERATION)
        });

        if motion.total_path().abs() < SNAP_THRESHOLD {
            let target = motion.final_position();
            self.set_scroll_position(target);
            self.overscroll_after_motion = None;
            return false;
        }

        self.movement = Movement::Auto;
        if let Some(controller) = self.controller.as_mut() {
            controller.set_animation_padding(path);
        }
        log::debug!(
            "momentum: v={velocity:.1} path={path:.1} boundary={:?}",
            self.auto_boundary
        );
        let normal = self.motion_normal();
        self.runner.run(
            self.root,
            SCROLL_ACTION,
            Action::motion(MotionProfile::Accelerated(motion), normal),
        );
        true
    }

    /// Starts the bounce segment toward a violated boundary.
    fn on_overscroll_performed(&mut self, velocity: f32, pos: f32, boundary: f32) {
        let mut velocity = velocity;
        if self.movement == Movement::Auto {
            if let Some((v, _)) = self.runner.motion_state(self.root, SCROLL_ACTION) {
                velocity = v;
            }
        }
        self.runner.stop_tag(self.root, SCROLL_ACTION);

        if (self.movement == Movement::Manual || self.movement == Movement::None)
            && !self.bounce
            && pos == boundary
        {
            return;
        }

        if self.movement != Movement::Overscroll {
            self.movement = Movement::Overscroll;
            if let Some(controller) = self.controller.as_mut() {
                controller.drop_animation_padding();
            }
            let cap = 25_000.0f32.max(velocity.abs() * 50.0);
            let motion = BounceMotion::new(pos, boundary, velocity, BOUNCE_SPRING, cap);
            log::debug!("bounce: pos={pos:.1} boundary={boundary:.1} v={velocity:.1}");
            let normal = self.motion_normal();
            self.runner.run(
                self.root,
                SCROLL_ACTION,
                Action::motion(MotionProfile::Bounce(motion), normal),
            );
        }
    }

    fn on_animation_finished(&mut self) {
        self.animation_dirty = true;
        self.movement = Movement::None;
        self.overscroll_after_motion = None;
        self.auto_boundary = None;
        self.auto_exit_velocity = 0.0;
    }

    /// The engine's own motion on the root completed this tick.
    fn on_scroll_action_complete(&mut self) {
        match self.movement {
            Movement::Auto => {
                let residual = self.overscroll_after_motion.take();
                if let Some(residual) = residual {
                    self.on_overscroll(residual);
                }
                let boundary = self.auto_boundary.take();
                let exit = std::mem::replace(&mut self.auto_exit_velocity, 0.0);
                if let (Some(boundary), true) = (boundary, self.bounce && exit != 0.0) {
                    self.on_overscroll_performed(exit, self.scroll_position, boundary);
                } else {
                    self.on_animation_finished();
                }
            }
            _ => self.on_animation_finished(),
        }
    }

    // ── per-frame drive ──────────────────────────────────────────────

    /// Advances animations and bookkeeping by `dt` seconds. Returns
    /// completions of actions the engine does not own (wrappers
    /// consume them).
    pub fn tick(&mut self, dt: f32) -> Vec<(NodeId, Tag)> {
        let old = self.scroll_position;
        let completions = self.runner.tick(&mut self.tree, dt);
        self.global_scale = self.tree.world_scale(self.container);
        self.scroll_position = self.position_from_root();

        self.after_position_change(old);

        let mut leftovers = Vec::new();
        for (node, tag) in completions {
            if node == self.root && tag == SCROLL_ACTION {
                self.on_scroll_action_complete();
            } else {
                leftovers.push((node, tag));
            }
        }

        if self.scroll_dirty {
            self.update_scroll_bounds();
        }
        if self.animation_dirty {
            self.fix_position();
            let pos = self.scroll_position;
            self.after_position_change(pos);
            self.on_scroll(0.0, true);
            self.animation_dirty = false;
        }

        self.overscroll_front.update(&mut self.tree, dt);
        self.overscroll_back.update(&mut self.tree, dt);
        self.indicator.update(&mut self.tree, dt);
        leftovers
    }

    /// Re-derives state after the root moved: runs the controller
    /// window, detects boundary crossings and reports scrolling.
    fn after_position_change(&mut self, old: f32) {
        let new = self.scroll_position;
        self.on_scroll_position(false);

        if self.movement == Movement::Auto {
            if let Some(min) = self.scroll_min {
                if new < min {
                    self.on_overscroll_performed(0.0, new, min);
                    return;
                }
            }
            if let Some(max) = self.scroll_max {
                if new > max {
                    self.on_overscroll_performed(0.0, new, max);
                    return;
                }
            }
        }

        if self.movement != Movement::None
            && self.movement != Movement::Overscroll
            && new - old != 0.0
        {
            self.on_scroll(new - old, false);
        } else if self.movement == Movement::Overscroll {
            if let Some(min) = self.scroll_min {
                if new < min {
                    if new - old < 0.0 {
                        self.on_overscroll(new - old);
                    }
                    return;
                }
            }
            if let Some(max) = self.scroll_max {
                if new > max && new - old > 0.0 {
                    self.on_overscroll(new - old);
                }
            }
        }
    }

    /// Runs the virtualisation step; `force` recomputes the scrollable
    /// area unconditionally.
    pub fn on_scroll_position(&mut self, force: bool) {
        let Some(mut controller) = self.controller.take() else {
            return;
        };
        let viewport = self.tree.content_size(self.container);
        let degenerate = if self.axis.is_vertical() {
            viewport.width == 0.0
        } else {
            viewport.height == 0.0
        };
        if degenerate {
            self.controller = Some(controller);
            return;
        }

        let mut force = force;
        loop {
            if controller.is_info_dirty() || force {
                let area = controller.compute_area();
                controller.publish_area(area);
                self.area = area;
                self.update_scroll_bounds();
                controller.clear_info_dirty();
                force = false;
            }

            let pos = self.scroll_position;
            let size = self.scroll_size;
            let mut host = NodeHost {
                tree: &mut self.tree,
                axis: self.axis,
                root: self.root,
            };
            controller.pass(&mut host, pos, size);

            if !controller.is_info_dirty() {
                break;
            }
        }
        self.controller = Some(controller);
    }

    // ── scroll / overscroll reporting ────────────────────────────────

    fn on_scroll(&mut self, delta: f32, finished: bool) {
        if self.movement == Movement::Auto {
            if let Some(controller) = self.controller.as_mut() {
                controller.update_animation_padding(delta);
            }
        }
        if !finished {
            self.update_indicator();
        }
        if let Some(cb) = &self.scroll_callback {
            cb(delta, finished);
        }
    }

    fn on_overscroll(&mut self, delta: f32) {
        if let Some(filter) = &self.overscroll_filter {
            if !filter(delta) {
                return;
            }
        }
        if self.overscroll_visible {
            if delta > 0.0 {
                self.overscroll_back.increment_progress(delta / 50.0);
            } else {
                self.overscroll_front.increment_progress(-delta / 50.0);
            }
        }
        if let Some(cb) = &self.overscroll_callback {
            cb(delta);
        }
    }

    fn update_indicator(&mut self) {
        let (min, max, length) = match self.indicator_range {
            Some(range) => (Some(range.0), Some(range.1), Some(range.2)),
            None => (
                self.scroll_min_position(),
                self.scroll_max_position(),
                self.scroll_length(),
            ),
        };
        let viewport = self.tree.content_size(self.container);
        self.indicator.update_position(
            &mut self.tree,
            self.axis,
            viewport,
            &self.padding,
            self.scroll_position,
            self.scroll_size,
            min,
            max,
            length,
        );
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
