// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification.
//!
//! [`Event`] is a list of handlers invoked with a borrowed argument.
//! [`ModifiedFlag`] is a boolean whose listeners only hear about transitions.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

/// Identifies a handler registered on an [`Event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<A> = Rc<dyn Fn(&A)>;

/// A list of handlers invoked with `&A`.
///
/// Handlers may add or remove handlers (including themselves) while the event
/// is being invoked; such changes take effect from the next invocation.
pub struct Event<A: ?Sized> {
    handlers: RefCell<Vec<(HandlerId, Handler<A>)>>,
    next_id: Cell<u64>,
}

impl<A: ?Sized> Event<A> {
    /// Creates an event with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers a handler and returns its id.
    pub fn add_handler(&self, handler: impl Fn(&A) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Removes a handler. Returns `true` if it was registered.
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Invokes every handler in registration order.
    pub fn invoke(&self, arg: &A) {
        let snapshot: Vec<Handler<A>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in snapshot {
            handler(arg);
        }
    }
}

impl<A: ?Sized> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// A modified flag that notifies once per transition.
///
/// Mutating call sites typically call `mark_modified(true)` on every change,
/// including no-op changes. Listeners are told only when the flag actually
/// flips, so a burst of modifications produces a single notification until
/// the flag is cleared again.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use lume_meta::ModifiedFlag;
///
/// let flag = ModifiedFlag::new();
/// let hits = Rc::new(Cell::new(0));
/// let h = hits.clone();
/// flag.on_changed().add_handler(move |_| h.set(h.get() + 1));
///
/// flag.mark_modified(true);
/// flag.mark_modified(true);
/// assert_eq!(hits.get(), 1);
///
/// flag.mark_modified(false);
/// assert_eq!(hits.get(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ModifiedFlag {
    modified: Cell<bool>,
    on_changed: Event<bool>,
}

impl ModifiedFlag {
    /// Creates a cleared flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified.get()
    }

    /// Sets the flag, notifying listeners if the state changed.
    ///
    /// Returns `true` if the state changed.
    pub fn mark_modified(&self, modified: bool) -> bool {
        if self.modified.replace(modified) == modified {
            return false;
        }
        self.on_changed.invoke(&modified);
        true
    }

    /// Event fired with the new state on every transition.
    #[must_use]
    pub fn on_changed(&self) -> &Event<bool> {
        &self.on_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_run_in_order_and_can_be_removed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let event = Event::<u32>::new();
        let l1 = log.clone();
        let first = event.add_handler(move |v| l1.borrow_mut().push(("a", *v)));
        let l2 = log.clone();
        event.add_handler(move |v| l2.borrow_mut().push(("b", *v)));

        event.invoke(&1);
        assert!(event.remove_handler(first));
        assert!(!event.remove_handler(first));
        event.invoke(&2);

        assert_eq!(*log.borrow(), [("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(event.handler_count(), 1);
    }

    #[test]
    fn handler_may_remove_itself_during_invoke() {
        let event = Rc::new(Event::<()>::new());
        let id = Rc::new(Cell::new(None));
        let (e, i) = (Rc::downgrade(&event), id.clone());
        id.set(Some(event.add_handler(move |_| {
            if let (Some(e), Some(i)) = (e.upgrade(), i.get()) {
                e.remove_handler(i);
            }
        })));
        event.invoke(&());
        assert_eq!(event.handler_count(), 0);
    }

    #[test]
    fn modified_flag_coalesces() {
        let flag = ModifiedFlag::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        flag.on_changed().add_handler(move |m| s.borrow_mut().push(*m));

        assert!(flag.mark_modified(true));
        assert!(!flag.mark_modified(true));
        assert!(!flag.mark_modified(true));
        assert!(flag.mark_modified(false));
        assert!(!flag.mark_modified(false));

        assert_eq!(*seen.borrow(), [true, false]);
    }
}
