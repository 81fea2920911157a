//! Per-node scroll item handles.
//!
//! An opt-in component a factory can attach to its node. The
//! controller notifies the handle on residency changes; the handle can
//! request a resize of its item and carry a `locked` bit that excludes
//! the row from recycler cleanup sweeps.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Item;

pub type HandleCallback = Rc<dyn Fn(&Item, usize)>;

#[derive(Default)]
struct HandleInner {
    insert_callback: Option<HandleCallback>,
    update_callback: Option<HandleCallback>,
    remove_callback: Option<HandleCallback>,
    pending_resize: Option<(f32, bool)>,
    locked: bool,
}

/// Cheap-to-clone handle shared between the item and its owner.
#[derive(Clone, Default)]
pub struct ScrollItemHandle {
    inner: Rc<RefCell<HandleInner>>,
}

impl ScrollItemHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_insert_callback(&self, cb: impl Fn(&Item, usize) + 'static) {
        self.inner.borrow_mut().insert_callback = Some(Rc::new(cb));
    }

    pub fn set_update_callback(&self, cb: impl Fn(&Item, usize) + 'static) {
        self.inner.borrow_mut().update_callback = Some(Rc::new(cb));
    }

    pub fn set_remove_callback(&self, cb: impl Fn(&Item, usize) + 'static) {
        self.inner.borrow_mut().remove_callback = Some(Rc::new(cb));
    }

    /// Requests a resize of the owning item; the controller applies it
    /// right after the notification that carried it.
    pub fn resize(&self, new_size: f32, forward: bool) {
        self.inner.borrow_mut().pending_resize = Some((new_size, forward));
    }

    pub fn set_locked(&self, locked: bool) {
        self.inner.borrow_mut().locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.inner.borrow().locked
    }

    pub(crate) fn take_pending_resize(&self) -> Option<(f32, bool)> {
        self.inner.borrow_mut().pending_resize.take()
    }

    pub(crate) fn on_node_inserted(&self, item: &Item, index: usize) {
        let cb = self.inner.borrow().insert_callback.clone();
        if let Some(cb) = cb {
            cb(item, index);
        }
    }

    pub(crate) fn on_node_updated(&self, item: &Item, index: usize) {
        let cb = self.inner.borrow().update_callback.clone();
        if let Some(cb) = cb {
            cb(item, index);
        }
    }

    pub(crate) fn on_node_removed(&self, item: &Item, index: usize) {
        let cb = self.inner.borrow().remove_callback.clone();
        if let Some(cb) = cb {
            cb(item, index);
        }
    }
}
