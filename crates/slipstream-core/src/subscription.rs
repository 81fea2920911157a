//! Dirty-flag subscriptions.
//!
//! A [`Subscription`] is a shared flag set by mutators and acknowledged
//! by consumers. No diff is carried; a consumer that observes the flag
//! recomputes from the source. [`Listener`] binds an observable value
//! to a callback and runs it from `check()` when the flag is pending.

use std::cell::Cell;
use std::rc::Rc;

/// Shared dirty flag. Cheap to clone; all clones observe the same flag.
#[derive(Clone, Default)]
pub struct Subscription {
    dirty: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Returns the pending flag and clears it.
    pub fn check(&self) -> bool {
        self.dirty.replace(false)
    }
}

/// A value that exposes a [`Subscription`] for change observation.
pub trait Observable {
    fn subscription(&self) -> Subscription;
}

/// Binds an observable target to a callback.
///
/// The owner calls [`Listener::check`] once per main-loop turn; the
/// callback fires when the target's subscription (or an explicit local
/// `set_dirty`) is pending.
pub struct Listener<T: Observable> {
    target: Option<T>,
    callback: Option<Box<dyn Fn()>>,
    local_dirty: Cell<bool>,
}

impl<T: Observable> Default for Listener<T> {
    fn default() -> Self {
        Self {
            target: None,
            callback: None,
            local_dirty: Cell::new(false),
        }
    }
}

impl<T: Observable> Listener<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_callback(&mut self, cb: impl Fn() + 'static) {
        self.callback = Some(Box::new(cb));
    }

    pub fn set_target(&mut self, target: Option<T>) {
        self.target = target;
        self.local_dirty.set(true);
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.target.is_some()
    }

    /// Forces the callback to fire on the next `check()`.
    pub fn set_dirty(&self) {
        self.local_dirty.set(true);
    }

    /// Acknowledges pending dirt and fires the callback if any was set.
    pub fn check(&self) {
        let target_dirty = self
            .target
            .as_ref()
            .map(|t| t.subscription().check())
            .unwrap_or(false);
        let pending = self.local_dirty.replace(false) || target_dirty;
        if pending {
            if let Some(cb) = &self.callback {
                cb();
            }
        }
    }
}
