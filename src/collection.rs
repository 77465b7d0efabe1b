//! Ordered child lists.
//!
//! All "first/next" enumeration in the registry runs over `Children`, an
//! append-only list that preserves the order entities appeared in the
//! source document. Children are populated during the single parse pass
//! and never reordered, deduplicated or removed afterwards.

use std::cell::RefCell;

/// Insertion-ordered list of child handles sharing one parent.
pub(crate) struct Children<T> {
    items: RefCell<Vec<T>>,
}

impl<T: Clone> Children<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Append at the tail, returning the slot the item landed in.
    pub(crate) fn append(&self, item: T) -> usize {
        let mut items = self.items.borrow_mut();
        items.push(item);
        items.len() - 1
    }

    /// The head of the list, or `None` if empty.
    pub(crate) fn first(&self) -> Option<T> {
        self.items.borrow().first().cloned()
    }

    /// The item at `slot`, or `None` past the tail.
    pub(crate) fn get(&self, slot: usize) -> Option<T> {
        self.items.borrow().get(slot).cloned()
    }
}
