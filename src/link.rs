//! Membership link tying an entity to its owning parent.
//!
//! Every registry entity carries a `Link` to the collection it was appended
//! to: a weak handle to the owning parent plus the entity's slot in the
//! parent's child list. Sibling iteration resolves through the link, so an
//! entity that outlives its parent yields a checked "no further siblings"
//! instead of dangling.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Back-reference from an entity to the parent that owns it.
///
/// Created detached; bound exactly once when the entity is appended to its
/// parent's child list. The parent reference is weak: links never keep a
/// parent alive.
pub(crate) struct Link<P> {
    parent: RefCell<Weak<P>>,
    slot: Cell<usize>,
}

impl<P> Link<P> {
    /// A link not yet attached to any parent.
    pub(crate) fn detached() -> Self {
        Self {
            parent: RefCell::new(Weak::new()),
            slot: Cell::new(0),
        }
    }

    /// Attach to `parent` at position `slot` in its child list.
    pub(crate) fn bind(&self, parent: &Rc<P>, slot: usize) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
        self.slot.set(slot);
    }

    /// The owning parent, or `None` if it was dropped or the link is
    /// still detached.
    pub(crate) fn parent(&self) -> Option<Rc<P>> {
        self.parent.borrow().upgrade()
    }

    /// Position of the entity in its parent's child list.
    pub(crate) fn slot(&self) -> usize {
        self.slot.get()
    }
}
