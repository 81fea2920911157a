//! Kinematic motion for the slipstream scroll core.
//!
//! Motion profiles are closed-form solutions of constant-acceleration
//! ODEs, evaluated at a play time; the [`ActionRunner`] drives them
//! (and ordinary tweens) against nodes with tag-based pre-emption.

mod action;
mod easing;
mod motion;

pub use action::*;
pub use easing::*;
pub use motion::*;
