use std::cell::RefCell;
use std::rc::Rc;

use crate::codec::{Codec, SharedCodec};
use crate::fallback::{DecodeAttempt, Fallback};
use crate::store::{StoreChange, StoreHandle};
use crate::subscription::Subscription;

/// What `set` does with a value equal to the slot's default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefaultWrite {
    /// Drop the key so the store only carries non-default state.
    #[default]
    Remove,
    /// Always write the encoded value.
    Keep,
}

pub struct SlotOptions<T> {
    pub default: T,
    pub default_write: DefaultWrite,
}

impl<T> SlotOptions<T> {
    pub fn new(default: T) -> Self {
        Self {
            default,
            default_write: DefaultWrite::default(),
        }
    }

    pub fn default_write(mut self, policy: DefaultWrite) -> Self {
        self.default_write = policy;
        self
    }
}

struct Cached<T> {
    raw: String,
    value: T,
}

struct SlotInner<T: Clone + 'static> {
    key: String,
    store: StoreHandle,
    codec: RefCell<SharedCodec<T>>,
    fallback: Fallback<T>,
    default_write: DefaultWrite,
    cache: RefCell<Option<Cached<T>>>,
}

/// One store key, viewed through a codec, with a default for when the key
/// is missing or does not decode.
///
/// Cloning gives another handle to the same slot.
pub struct BoundSlot<T: Clone + 'static>(Rc<SlotInner<T>>);

impl<T: Clone + 'static> Clone for BoundSlot<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + 'static> BoundSlot<T> {
    pub fn new(
        store: StoreHandle,
        key: impl Into<String>,
        codec: impl Codec<T>,
        options: SlotOptions<T>,
    ) -> Self {
        Self::with_shared_codec(store, key, Rc::new(codec), options)
    }

    pub fn with_shared_codec(
        store: StoreHandle,
        key: impl Into<String>,
        codec: SharedCodec<T>,
        options: SlotOptions<T>,
    ) -> Self {
        Self(Rc::new(SlotInner {
            key: key.into(),
            store,
            codec: RefCell::new(codec),
            fallback: Fallback::new(options.default),
            default_write: options.default_write,
            cache: RefCell::new(None),
        }))
    }

    pub fn key(&self) -> &str {
        &self.0.key
    }

    pub fn default_value(&self) -> &T {
        self.0.fallback.default_value()
    }

    pub fn default_write(&self) -> DefaultWrite {
        self.0.default_write
    }

    pub fn store(&self) -> &StoreHandle {
        &self.0.store
    }

    /// Current text in the store, if any.
    pub fn raw(&self) -> Option<String> {
        self.0.store.read_raw(&self.0.key)
    }

    pub fn get(&self) -> T {
        let Some(raw) = self.raw() else {
            return self.0.fallback.resolve(DecodeAttempt::Absent);
        };
        if let Some(hit) = self.cached(&raw) {
            return hit;
        }

        let attempt = DecodeAttempt::from_result(self.0.codec.borrow().parse(&raw));
        if let DecodeAttempt::Failed(e) = &attempt {
            log::debug!("slot `{}`: cannot decode {raw:?}: {e}", self.0.key);
        }
        let value = self.0.fallback.resolve(attempt);
        *self.0.cache.borrow_mut() = Some(Cached {
            raw,
            value: value.clone(),
        });
        value
    }

    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        self.invalidate();
        if self.0.default_write == DefaultWrite::Remove && value == *self.default_value() {
            self.0.store.remove_raw(&self.0.key);
            return;
        }
        let raw = self.0.codec.borrow().stringify(&value);
        self.0.store.write_raw(&self.0.key, &raw);
    }

    /// Read, modify, write back.
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: PartialEq,
    {
        let mut v = self.get();
        f(&mut v);
        self.set(v);
    }

    /// Removes the key; reads return the default afterwards.
    pub fn reset(&self) {
        self.invalidate();
        self.0.store.remove_raw(&self.0.key);
    }

    /// Swaps the codec. The memoized decode is dropped, so the next `get`
    /// re-derives from whatever text the store currently holds.
    pub fn replace_codec(&self, codec: SharedCodec<T>) {
        *self.0.codec.borrow_mut() = codec;
        self.invalidate();
    }

    pub fn invalidate(&self) {
        *self.0.cache.borrow_mut() = None;
    }

    /// Calls `f` with the freshly decoded value whenever the store reports
    /// a change to this key.
    pub fn watch(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let weak = Rc::downgrade(&self.0);
        let key = self.0.key.clone();
        let id = self.0.store.subscribe(Rc::new(move |change: &StoreChange| {
            if !change.touches(&key) {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                f(&BoundSlot(inner).get());
            }
        }));
        let store = self.0.store.clone();
        Subscription::new(move || store.unsubscribe(id))
    }

    /// Drops this handle; the stored text stays in the store.
    pub fn release(self) {
        log::trace!("slot `{}`: released", self.0.key);
    }

    fn cached(&self, raw: &str) -> Option<T> {
        self.0
            .cache
            .borrow()
            .as_ref()
            .filter(|c| c.raw == raw)
            .map(|c| c.value.clone())
    }
}

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for BoundSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundSlot")
            .field("key", &self.0.key)
            .field("default", self.default_value())
            .field("raw", &self.raw())
            .finish()
    }
}
