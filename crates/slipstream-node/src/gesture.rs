//! Gesture event data.
//!
//! The platform listener owns recognition; the scroll core consumes
//! only these shapes. Deltas and velocities are in logical units.

use slipstream_geometry::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Activated,
    Ended,
    Cancelled,
}

/// A pan with per-event delta and instantaneous velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Swipe {
    pub location: Vec2,
    pub delta: Vec2,
    pub velocity: Vec2,
}

/// A press; `duration` is seconds held so far.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Press {
    pub location: Vec2,
    pub duration: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tap {
    pub location: Vec2,
    pub count: u32,
}

/// A single-shot wheel notch; `amount` is in notches per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wheel {
    pub location: Vec2,
    pub amount: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    Swipe(GesturePhase, Swipe),
    Press(GesturePhase, Press),
    Tap(Tap),
    Wheel(Wheel),
}

/// Listener-side switches the host must honour.
#[derive(Clone, Copy, Debug)]
pub struct GestureListener {
    pub enabled: bool,
    /// Prevents recognised touches from propagating into sibling
    /// scroll views.
    pub swallow_touches: bool,
}

impl Default for GestureListener {
    fn default() -> Self {
        Self {
            enabled: true,
            swallow_touches: true,
        }
    }
}
