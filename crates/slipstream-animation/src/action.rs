//! Tagged, pre-emptible time actions.
//!
//! A discrete-time rendition of the action-runner contract the scroll
//! core consumes: motions and tweens run against nodes, addressed by
//! `(node, tag)`. Launching an action on a busy `(node, tag)` slot
//! stops the previous one; stopped actions never fire their callbacks.

use std::collections::VecDeque;

use slipstream_geometry::{Size, Vec2};
use slipstream_node::{NodeId, NodeTree};

use crate::{Easing, MotionProfile};

pub type Tag = &'static str;

/// Normalized tween with start/progress/end callbacks.
pub struct ProgressAction {
    duration: f32,
    from: f32,
    to: f32,
    easing: Easing,
    on_start: Option<Box<dyn FnMut()>>,
    on_progress: Option<Box<dyn FnMut(f32)>>,
    on_end: Option<Box<dyn FnMut()>>,
}

impl ProgressAction {
    pub fn new(duration: f32, from: f32, to: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            from,
            to,
            easing: Easing::Linear,
            on_start: None,
            on_progress: None,
            on_end: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_start(mut self, cb: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(cb));
        self
    }

    pub fn on_progress(mut self, cb: impl FnMut(f32) + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn on_end(mut self, cb: impl FnMut() + 'static) -> Self {
        self.on_end = Some(Box::new(cb));
        self
    }

    fn value_at(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let fraction = (elapsed / self.duration).clamp(0.0, 1.0);
        let eased = self.easing.transform(fraction);
        self.from + (self.to - self.from) * eased
    }
}

pub enum Action {
    Motion {
        profile: MotionProfile,
        normal: Vec2,
        origin: Option<Vec2>,
        elapsed: f32,
    },
    Progress {
        spec: ProgressAction,
        elapsed: f32,
        started: bool,
    },
    MoveTo {
        duration: f32,
        to: Vec2,
        from: Option<Vec2>,
        elapsed: f32,
    },
    ResizeTo {
        duration: f32,
        to: Size,
        from: Option<Size>,
        elapsed: f32,
    },
    FadeTo {
        duration: f32,
        to: f32,
        from: Option<f32>,
        elapsed: f32,
    },
    Delay {
        duration: f32,
        elapsed: f32,
    },
    Callback(Option<Box<dyn FnOnce()>>),
    Sequence(VecDeque<Action>),
}

impl Action {
    /// A kinematic motion applied along `normal` from the node's
    /// position at launch.
    pub fn motion(profile: MotionProfile, normal: Vec2) -> Self {
        Action::Motion {
            profile,
            normal,
            origin: None,
            elapsed: 0.0,
        }
    }

    pub fn progress(spec: ProgressAction) -> Self {
        Action::Progress {
            spec,
            elapsed: 0.0,
            started: false,
        }
    }

    pub fn move_to(duration: f32, to: Vec2) -> Self {
        Action::MoveTo {
            duration: duration.max(0.0),
            to,
            from: None,
            elapsed: 0.0,
        }
    }

    pub fn resize_to(duration: f32, to: Size) -> Self {
        Action::ResizeTo {
            duration: duration.max(0.0),
            to,
            from: None,
            elapsed: 0.0,
        }
    }

    pub fn fade_to(duration: f32, to: f32) -> Self {
        Action::FadeTo {
            duration: duration.max(0.0),
            to,
            from: None,
            elapsed: 0.0,
        }
    }

    pub fn delay(duration: f32) -> Self {
        Action::Delay {
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn callback(cb: impl FnOnce() + 'static) -> Self {
        Action::Callback(Some(Box::new(cb)))
    }

    pub fn sequence(actions: Vec<Action>) -> Self {
        Action::Sequence(actions.into())
    }

    /// Fires `cb` after `delay` seconds.
    pub fn delayed_callback(delay: f32, cb: impl FnOnce() + 'static) -> Self {
        Action::sequence(vec![Action::delay(delay), Action::callback(cb)])
    }

    /// Advances by `dt`; returns true when finished.
    fn tick(&mut self, tree: &mut NodeTree, node: NodeId, dt: f32) -> bool {
        match self {
            Action::Motion {
                profile,
                normal,
                origin,
                elapsed,
            } => {
                let origin = *origin.get_or_insert_with(|| tree.position(node));
                *elapsed += dt;
                let travelled = profile.position(*elapsed) - profile.start_position();
                tree.set_position(node, origin + *normal * travelled);
                profile.is_finished(*elapsed)
            }
            Action::Progress {
                spec,
                elapsed,
                started,
            } => {
                if !*started {
                    *started = true;
                    if let Some(cb) = &mut spec.on_start {
                        cb();
                    }
                }
                *elapsed += dt;
                let value = spec.value_at(*elapsed);
                if let Some(cb) = &mut spec.on_progress {
                    cb(value);
                }
                if *elapsed >= spec.duration {
                    if let Some(cb) = &mut spec.on_end {
                        cb();
                    }
                    true
                } else {
                    false
                }
            }
            Action::MoveTo {
                duration,
                to,
                from,
                elapsed,
            } => {
                let from = *from.get_or_insert_with(|| tree.position(node));
                *elapsed += dt;
                let t = fraction(*elapsed, *duration);
                tree.set_position(node, from + (*to - from) * t);
                t >= 1.0
            }
            Action::ResizeTo {
                duration,
                to,
                from,
                elapsed,
            } => {
                let from = *from.get_or_insert_with(|| tree.content_size(node));
                *elapsed += dt;
                let t = fraction(*elapsed, *duration);
                tree.set_content_size(
                    node,
                    Size::new(
                        from.width + (to.width - from.width) * t,
                        from.height + (to.height - from.height) * t,
                    ),
                );
                t >= 1.0
            }
            Action::FadeTo {
                duration,
                to,
                from,
                elapsed,
            } => {
                let from = *from.get_or_insert_with(|| tree.opacity(node));
                *elapsed += dt;
                let t = fraction(*elapsed, *duration);
                tree.set_opacity(node, from + (*to - from) * t);
                t >= 1.0
            }
            Action::Delay { duration, elapsed } => {
                *elapsed += dt;
                *elapsed >= *duration
            }
            Action::Callback(cb) => {
                if let Some(cb) = cb.take() {
                    cb();
                }
                true
            }
            Action::Sequence(queue) => {
                while let Some(current) = queue.front_mut() {
                    if current.tick(tree, node, dt) {
                        queue.pop_front();
                        // Instant steps (callbacks) chain within a
                        // frame; timed steps wait for the next tick.
                        if queue
                            .front()
                            .map(|a| matches!(a, Action::Callback(_)))
                            .unwrap_or(false)
                        {
                            continue;
                        }
                    }
                    break;
                }
                queue.is_empty()
            }
        }
    }

    fn motion_state(&self) -> Option<(f32, Vec2)> {
        match self {
            Action::Motion {
                profile,
                normal,
                elapsed,
                ..
            } => Some((profile.velocity(*elapsed), *normal)),
            Action::Sequence(queue) => queue.front().and_then(|a| a.motion_state()),
            _ => None,
        }
    }
}

fn fraction(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).min(1.0)
    }
}

struct RunningAction {
    node: NodeId,
    tag: Tag,
    action: Action,
}

/// Drives actions against a [`NodeTree`].
#[derive(Default)]
pub struct ActionRunner {
    running: Vec<RunningAction>,
}

impl ActionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an action, stopping any prior action on `(node, tag)`.
    pub fn run(&mut self, node: NodeId, tag: Tag, action: Action) {
        self.stop_tag(node, tag);
        self.running.push(RunningAction { node, tag, action });
    }

    /// Stops everything running on `node` without firing callbacks.
    pub fn stop_all_for(&mut self, node: NodeId) {
        self.running.retain(|a| a.node != node);
    }

    pub fn stop_tag(&mut self, node: NodeId, tag: Tag) {
        self.running.retain(|a| a.node != node || a.tag != tag);
    }

    pub fn has_action(&self, node: NodeId, tag: Tag) -> bool {
        self.running.iter().any(|a| a.node == node && a.tag == tag)
    }

    pub fn is_animating(&self, node: NodeId) -> bool {
        self.running.iter().any(|a| a.node == node)
    }

    /// Current velocity and direction of a running motion, if any.
    pub fn motion_state(&self, node: NodeId, tag: Tag) -> Option<(f32, Vec2)> {
        self.running
            .iter()
            .find(|a| a.node == node && a.tag == tag)
            .and_then(|a| a.action.motion_state())
    }

    /// Advances all actions by `dt` seconds. Returns the `(node, tag)`
    /// pairs that completed this tick, in launch order.
    pub fn tick(&mut self, tree: &mut NodeTree, dt: f32) -> Vec<(NodeId, Tag)> {
        let mut actions = std::mem::take(&mut self.running);
        let mut completed = Vec::new();

        for mut running in actions.drain(..) {
            if !tree.is_alive(running.node) {
                continue;
            }
            if running.action.tick(tree, running.node, dt) {
                completed.push((running.node, running.tag));
            } else {
                self.running.push(running);
            }
        }
        completed
    }
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
