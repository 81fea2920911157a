//! Overscroll edge indicator.
//!
//! A per-end progress model fed by overscroll deltas; progress bulges
//! the edge glow and decays after a short hold. Visible only when the
//! engine is in flat (non-bounce) mode.

use slipstream_geometry::{Axis, Size, Vec2};
use slipstream_node::{NodeId, NodeTree};

const OVERSCROLL_SCALE: f32 = 1.0 / 6.0;
const OVERSCROLL_MAX_HEIGHT: f32 = 64.0;
/// Seconds the glow holds before decaying.
const HOLD_TIME: f32 = 0.25;
/// Progress decay per second after the hold.
const DECAY_RATE: f32 = 2.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverscrollSide {
    Front,
    Back,
}

pub struct OverscrollIndicator {
    node: NodeId,
    side: OverscrollSide,
    progress: f32,
    hold: f32,
}

impl OverscrollIndicator {
    pub fn new(tree: &mut NodeTree, parent: NodeId, side: OverscrollSide) -> Self {
        let node = tree.create();
        tree.add_child(parent, node, 12);
        tree.set_visible(node, false);
        tree.set_opacity(node, 0.0);
        Self {
            node,
            side,
            progress: 0.0,
            hold: 0.0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn side(&self) -> OverscrollSide {
        self.side
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn increment_progress(&mut self, delta: f32) {
        self.progress = (self.progress + delta).clamp(0.0, 1.0);
        self.hold = HOLD_TIME;
    }

    pub fn decrement_progress(&mut self, delta: f32) {
        self.progress = (self.progress - delta).max(0.0);
    }

    /// Places the glow along the viewport edge for its side.
    pub fn layout(&self, tree: &mut NodeTree, axis: Axis, viewport: Size) {
        let thickness = match axis {
            Axis::Vertical => (viewport.width * OVERSCROLL_SCALE).min(OVERSCROLL_MAX_HEIGHT),
            Axis::Horizontal => (viewport.height * OVERSCROLL_SCALE).min(OVERSCROLL_MAX_HEIGHT),
        };
        match (axis, self.side) {
            (Axis::Vertical, OverscrollSide::Front) => {
                tree.set_anchor_point(self.node, Vec2::new(0.0, 1.0));
                tree.set_position(self.node, Vec2::new(0.0, viewport.height));
                tree.set_content_size(self.node, Size::new(viewport.width, thickness));
            }
            (Axis::Vertical, OverscrollSide::Back) => {
                tree.set_anchor_point(self.node, Vec2::new(0.0, 0.0));
                tree.set_position(self.node, Vec2::ZERO);
                tree.set_content_size(self.node, Size::new(viewport.width, thickness));
            }
            (Axis::Horizontal, OverscrollSide::Front) => {
                tree.set_anchor_point(self.node, Vec2::new(0.0, 0.0));
                tree.set_position(self.node, Vec2::ZERO);
                tree.set_content_size(self.node, Size::new(thickness, viewport.height));
            }
            (Axis::Horizontal, OverscrollSide::Back) => {
                tree.set_anchor_point(self.node, Vec2::new(1.0, 0.0));
                tree.set_position(self.node, Vec2::new(viewport.width, 0.0));
                tree.set_content_size(self.node, Size::new(thickness, viewport.height));
            }
        }
    }

    pub fn update(&mut self, tree: &mut NodeTree, dt: f32) {
        if self.hold > 0.0 {
            self.hold -= dt;
        } else if self.progress > 0.0 {
            self.decrement_progress(dt * DECAY_RATE);
        }
        tree.set_visible(self.node, self.progress > 0.0);
        tree.set_opacity(self.node, self.progress);
    }
}
