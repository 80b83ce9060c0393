use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::codec::Codec;
use crate::slot::{BoundSlot, SlotOptions};
use crate::store::StoreHandle;

/// Owns at most one `BoundSlot` per key over a shared store.
///
/// Asking for a key that is already bound returns the existing slot and
/// ignores the new codec and options; the first binding wins until it is
/// released.
pub struct SlotContext {
    store: StoreHandle,
    slots: RefCell<HashMap<String, Box<dyn Any>>>,
}

impl SlotContext {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            slots: RefCell::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn slot<T: Clone + 'static>(
        &self,
        key: impl Into<String>,
        codec: impl Codec<T>,
        options: SlotOptions<T>,
    ) -> BoundSlot<T> {
        let key = key.into();
        let mut slots = self.slots.borrow_mut();

        if let Some(existing) = slots.get(&key) {
            if let Some(slot) = existing.downcast_ref::<BoundSlot<T>>() {
                return slot.clone();
            }
            log::warn!("slot context: key '{key}' rebound with a different type; replacing.");
        }

        let slot = BoundSlot::new(self.store.clone(), key.clone(), codec, options);
        slots.insert(key, Box::new(slot.clone()));
        slot
    }

    /// Forgets the binding for `key`. Handles already given out keep
    /// working; the next `slot` call for the key creates a fresh one.
    pub fn release(&self, key: &str) -> bool {
        self.slots.borrow_mut().remove(key).is_some()
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.slots.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}
