// Change-notification channel shared by every block of a workspace.
//
// Delivery is synchronous: `fire` runs each subscriber to completion before
// returning, so the ordering seen by subscribers matches the firing order.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Element tag carried by field change events.
pub const FIELD_ELEMENT: &str = "field";

/// A value change of one field of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub block_id: String,
    pub element: &'static str,
    pub name: String,
    pub old_value: String,
    pub new_value: String,
    pub group: Option<String>,
}

impl FieldChange {
    pub fn new(block_id: &str, name: &str, old_value: &str, new_value: &str) -> Self {
        FieldChange {
            block_id: block_id.to_string(),
            element: FIELD_ELEMENT,
            name: name.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
            group: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber = Rc<dyn Fn(&FieldChange)>;

pub struct EventBus {
    disabled: Cell<u32>,
    group: RefCell<Option<String>>,
    subscribers: RefCell<Vec<(SubscriberId, Subscriber)>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            disabled: Cell::new(0),
            group: RefCell::new(None),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Suspend event delivery. Calls nest; each needs a matching `enable`.
    pub fn disable(&self) {
        self.disabled.set(self.disabled.get() + 1);
    }

    pub fn enable(&self) {
        self.disabled.set(self.disabled.get().saturating_sub(1));
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled.get() == 0
    }

    /// Set the group stamped on subsequently fired events, or clear it.
    pub fn set_group(&self, group: Option<&str>) {
        *self.group.borrow_mut() = group.map(str::to_string);
    }

    pub fn group(&self) -> Option<String> {
        self.group.borrow().clone()
    }

    pub fn subscribe(&self, f: impl Fn(&FieldChange) + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Deliver an event to every subscriber. Dropped while disabled.
    pub fn fire(&self, mut event: FieldChange) {
        if !self.is_enabled() {
            return;
        }
        if event.group.is_none() {
            event.group = self.group();
        }

        log::trace!(
            "field change on block {}: {} {:?} -> {:?}",
            event.block_id,
            event.name,
            event.old_value,
            event.new_value
        );

        // Subscribers may (un)subscribe while being notified.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for f in subscribers {
            f(&event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
