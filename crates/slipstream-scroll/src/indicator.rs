//! Scroll-position indicator.
//!
//! A thin bar along the trailing edge whose extent is proportional to
//! `viewport / scroll_length` and whose offset tracks the current
//! position. The sliced scroll substitutes an extrapolated range so
//! the bar reflects the whole id space, not just the resident slice.

use slipstream_geometry::{Axis, Padding, Size, Vec2};
use slipstream_node::{NodeId, NodeTree};

const BAR_THICKNESS: f32 = 3.0;
const BAR_MIN_LENGTH: f32 = 20.0;
const BAR_MARGIN: f32 = 2.0;
/// Seconds the bar stays fully visible after the last scroll.
const FADE_DELAY: f32 = 2.0;
/// Opacity lost per second once fading.
const FADE_RATE: f32 = 4.0;

pub struct ScrollIndicator {
    node: NodeId,
    enabled: bool,
    ignore_padding: bool,
    fade_hold: f32,
}

impl ScrollIndicator {
    pub fn new(tree: &mut NodeTree, parent: NodeId) -> Self {
        let node = tree.create();
        tree.add_child(parent, node, 11);
        tree.set_visible(node, false);
        Self {
            node,
            enabled: true,
            ignore_padding: false,
            fade_hold: 0.0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_ignore_padding(&mut self, ignore: bool) {
        self.ignore_padding = ignore;
    }

    /// Recomputes geometry for the current scroll state. `min`, `max`
    /// and `length` may come from the engine or from a sliced
    /// extrapolation over unfetched ids.
    #[allow(clippy::too_many_arguments)]
    pub fn update_position(
        &mut self,
        tree: &mut NodeTree,
        axis: Axis,
        viewport: Size,
        padding: &Padding,
        scroll_position: f32,
        scroll_size: f32,
        min: Option<f32>,
        max: Option<f32>,
        length: Option<f32>,
    ) {
        if !self.enabled {
            tree.set_visible(self.node, false);
            return;
        }
        let (Some(min), Some(max), Some(length)) = (min, max, length) else {
            tree.set_visible(self.node, false);
            return;
        };
        if length <= scroll_size || max <= min {
            tree.set_visible(self.node, false);
            return;
        }

        let mut local = *padding;
        if self.ignore_padding {
            if axis.is_vertical() {
                local.top = 0.0;
                local.bottom = 0.0;
            } else {
                local.left = 0.0;
                local.right = 0.0;
            }
        }

        let value = ((scroll_position - min) / (max - min)).clamp(0.0, 1.0);
        if axis.is_vertical() {
            let span = viewport.height - 2.0 * BAR_MARGIN - local.top - local.bottom;
            let bar = (span * viewport.height / length).max(BAR_MIN_LENGTH);
            let travel = viewport.height - bar - 2.0 * BAR_MARGIN - local.top - local.bottom;
            tree.set_content_size(self.node, Size::new(BAR_THICKNESS, bar));
            tree.set_anchor_point(self.node, Vec2::new(1.0, 0.0));
            tree.set_position(
                self.node,
                Vec2::new(
                    viewport.width - BAR_MARGIN,
                    local.bottom + BAR_MARGIN + travel * (1.0 - value),
                ),
            );
        } else {
            let span = viewport.width - 2.0 * BAR_MARGIN - local.left - local.right;
            let bar = (span * viewport.width / length).max(BAR_MIN_LENGTH);
            let travel = viewport.width - bar - 2.0 * BAR_MARGIN - local.left - local.right;
            tree.set_content_size(self.node, Size::new(bar, BAR_THICKNESS));
            tree.set_anchor_point(self.node, Vec2::new(0.0, 0.0));
            tree.set_position(
                self.node,
                Vec2::new(local.left + BAR_MARGIN + travel * value, BAR_MARGIN),
            );
        }

        tree.set_visible(self.node, true);
        tree.set_opacity(self.node, 1.0);
        self.fade_hold = FADE_DELAY;
    }

    /// Fades the bar out after the rest delay.
    pub fn update(&mut self, tree: &mut NodeTree, dt: f32) {
        if !tree.is_visible(self.node) {
            return;
        }
        if self.fade_hold > 0.0 {
            self.fade_hold -= dt;
            return;
        }
        let opacity = tree.opacity(self.node) - dt * FADE_RATE;
        if opacity <= 0.0 {
            tree.set_opacity(self.node, 0.0);
            tree.set_visible(self.node, false);
        } else {
            tree.set_opacity(self.node, opacity);
        }
    }
}
