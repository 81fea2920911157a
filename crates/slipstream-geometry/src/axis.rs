//! Scroll-axis algebra.
//!
//! The engine reduces every position and gesture to a single scalar on
//! the scroll axis. The mapping between node coordinates and that
//! scalar is axis-dependent: a vertical root hangs from its top-left
//! anchor, so its y position encodes `scroll_position + viewport_size`;
//! a horizontal root encodes `-scroll_position` directly.

use crate::{Padding, Size, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn is_vertical(self) -> bool {
        matches!(self, Axis::Vertical)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Axis::Horizontal)
    }

    /// The scroll-axis component of a position.
    pub fn main_pos(self, pos: Vec2) -> f32 {
        match self {
            Axis::Vertical => pos.y,
            Axis::Horizontal => pos.x,
        }
    }

    /// The scroll-axis extent of a size.
    pub fn main_size(self, size: Size) -> f32 {
        match self {
            Axis::Vertical => size.height,
            Axis::Horizontal => size.width,
        }
    }

    /// Builds an item position from a scroll-axis scalar.
    pub fn position_for(self, scroll_pos: f32) -> Vec2 {
        match self {
            Axis::Vertical => Vec2::new(0.0, scroll_pos),
            Axis::Horizontal => Vec2::new(scroll_pos, 0.0),
        }
    }

    /// Builds an item size from a scroll-axis extent; the passive axis
    /// is NaN and resolved from the root at placement time.
    pub fn size_for(self, main: f32) -> Size {
        match self {
            Axis::Vertical => Size::new(f32::NAN, main),
            Axis::Horizontal => Size::new(main, f32::NAN),
        }
    }

    /// Anchor point used for the root container and every scroll node.
    pub fn anchor_point(self) -> Vec2 {
        match self {
            Axis::Vertical => Vec2::new(0.0, 1.0),
            Axis::Horizontal => Vec2::new(0.0, 0.0),
        }
    }

    /// Converts an item position in scroll coordinates into node
    /// coordinates under the root (vertical flips the main axis).
    pub fn node_position(self, pos: Vec2) -> Vec2 {
        match self {
            Axis::Vertical => Vec2::new(pos.x, -pos.y),
            Axis::Horizontal => pos,
        }
    }

    /// Padding on the leading edge of the scroll axis.
    pub fn padding_front(self, padding: &Padding) -> f32 {
        match self {
            Axis::Vertical => padding.top,
            Axis::Horizontal => padding.left,
        }
    }

    /// Padding on the trailing edge of the scroll axis.
    pub fn padding_back(self, padding: &Padding) -> f32 {
        match self {
            Axis::Vertical => padding.bottom,
            Axis::Horizontal => padding.right,
        }
    }

    /// The off-axis component of a delta, used by the swipe filter.
    pub fn cross_pos(self, pos: Vec2) -> f32 {
        match self {
            Axis::Vertical => pos.x,
            Axis::Horizontal => pos.y,
        }
    }

    /// Converts a raw gesture delta into a scroll-axis delta. Vertical
    /// swipes map y directly; horizontal swipes invert x so that
    /// dragging content leftward scrolls forward.
    pub fn gesture_delta(self, delta: Vec2) -> f32 {
        match self {
            Axis::Vertical => delta.y,
            Axis::Horizontal => -delta.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_axis_extraction() {
        let pos = Vec2::new(3.0, 7.0);
        let size = Size::new(100.0, 40.0);
        assert_eq!(Axis::Vertical.main_pos(pos), 7.0);
        assert_eq!(Axis::Horizontal.main_pos(pos), 3.0);
        assert_eq!(Axis::Vertical.main_size(size), 40.0);
        assert_eq!(Axis::Horizontal.main_size(size), 100.0);
    }

    #[test]
    fn position_round_trip() {
        for axis in [Axis::Vertical, Axis::Horizontal] {
            let p = axis.position_for(42.0);
            assert_eq!(axis.main_pos(p), 42.0);
        }
    }

    #[test]
    fn vertical_node_position_flips_main_axis() {
        let p = Axis::Vertical.node_position(Vec2::new(5.0, 30.0));
        assert_eq!(p, Vec2::new(5.0, -30.0));
        let p = Axis::Horizontal.node_position(Vec2::new(5.0, 30.0));
        assert_eq!(p, Vec2::new(5.0, 30.0));
    }

    #[test]
    fn gesture_delta_sign() {
        assert_eq!(Axis::Vertical.gesture_delta(Vec2::new(0.0, 12.0)), 12.0);
        assert_eq!(Axis::Horizontal.gesture_delta(Vec2::new(12.0, 0.0)), -12.0);
    }

    #[test]
    fn padding_edges_follow_axis() {
        let p = Padding::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Axis::Vertical.padding_front(&p), 1.0);
        assert_eq!(Axis::Vertical.padding_back(&p), 3.0);
        assert_eq!(Axis::Horizontal.padding_front(&p), 4.0);
        assert_eq!(Axis::Horizontal.padding_back(&p), 2.0);
    }
}
