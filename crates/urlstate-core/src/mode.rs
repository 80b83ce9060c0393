use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::codec::{Codec, SharedCodec};
use crate::error::UnknownCodecError;
use crate::slot::{BoundSlot, SlotOptions};
use crate::store::StoreHandle;

/// Codecs for one value type, keyed by discriminator (`"json"`, `"custom"`).
pub struct CodecRegistry<T> {
    codecs: BTreeMap<String, SharedCodec<T>>,
}

impl<T> Default for CodecRegistry<T> {
    fn default() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }
}

impl<T: 'static> CodecRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last registration for a discriminator wins.
    pub fn register(&mut self, discriminator: impl Into<String>, codec: impl Codec<T>) -> &mut Self {
        self.register_shared(discriminator, Rc::new(codec))
    }

    pub fn register_shared(
        &mut self,
        discriminator: impl Into<String>,
        codec: SharedCodec<T>,
    ) -> &mut Self {
        let discriminator = discriminator.into();
        if self.codecs.insert(discriminator.clone(), codec).is_some() {
            log::debug!("codec registry: `{discriminator}` re-registered; replacing");
        }
        self
    }

    pub fn with(mut self, discriminator: impl Into<String>, codec: impl Codec<T>) -> Self {
        self.register(discriminator, codec);
        self
    }

    pub fn get(&self, discriminator: &str) -> Option<SharedCodec<T>> {
        self.codecs.get(discriminator).cloned()
    }

    pub fn contains(&self, discriminator: &str) -> bool {
        self.codecs.contains_key(discriminator)
    }

    /// Registered discriminators, sorted.
    pub fn discriminators(&self) -> Vec<String> {
        self.codecs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    fn lookup(&self, discriminator: &str) -> Result<SharedCodec<T>, UnknownCodecError> {
        self.get(discriminator).ok_or_else(|| UnknownCodecError {
            discriminator: discriminator.to_string(),
            known: self.discriminators(),
        })
    }
}

/// A `BoundSlot` whose codec can be swapped at runtime by discriminator.
///
/// A switch never carries a decoded value across: the slot's memoized
/// decode is invalidated, and the current store text is read again under
/// the new codec. Text the new codec cannot parse reads as the default
/// until the next `set`.
pub struct ModeSwitch<T: Clone + 'static> {
    slot: BoundSlot<T>,
    registry: RefCell<CodecRegistry<T>>,
    active: RefCell<String>,
}

impl<T: Clone + 'static> ModeSwitch<T> {
    pub fn new(
        store: StoreHandle,
        key: impl Into<String>,
        options: SlotOptions<T>,
        registry: CodecRegistry<T>,
        initial: &str,
    ) -> Result<Self, UnknownCodecError> {
        let codec = registry.lookup(initial)?;
        Ok(Self {
            slot: BoundSlot::with_shared_codec(store, key, codec, options),
            registry: RefCell::new(registry),
            active: RefCell::new(initial.to_string()),
        })
    }

    pub fn active(&self) -> String {
        self.active.borrow().clone()
    }

    pub fn is_active(&self, discriminator: &str) -> bool {
        *self.active.borrow() == discriminator
    }

    pub fn discriminators(&self) -> Vec<String> {
        self.registry.borrow().discriminators()
    }

    /// On error the active codec is left as it was.
    pub fn switch_to(&self, discriminator: &str) -> Result<(), UnknownCodecError> {
        let codec = self.registry.borrow().lookup(discriminator)?;
        log::debug!(
            "slot `{}`: codec `{}` -> `{discriminator}`",
            self.slot.key(),
            self.active.borrow()
        );
        self.slot.replace_codec(codec);
        *self.active.borrow_mut() = discriminator.to_string();
        Ok(())
    }

    /// Adds or replaces a codec. Replacing the active one takes effect on
    /// the next read.
    pub fn register(&self, discriminator: impl Into<String>, codec: impl Codec<T>) {
        let discriminator = discriminator.into();
        let codec: SharedCodec<T> = Rc::new(codec);
        self.registry
            .borrow_mut()
            .register_shared(discriminator.clone(), codec.clone());
        if self.is_active(&discriminator) {
            self.slot.replace_codec(codec);
        }
    }

    pub fn slot(&self) -> &BoundSlot<T> {
        &self.slot
    }

    pub fn get(&self) -> T {
        self.slot.get()
    }

    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        self.slot.set(value)
    }

    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: PartialEq,
    {
        self.slot.update(f)
    }
}
