use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::codec::Codec;
use crate::error::QueryError;
use crate::query::{self, Params};
use crate::slot::{BoundSlot, SlotOptions};

slotmap::new_key_type! {
    pub struct SubscriptionId;
}

pub type ChangedKeys = SmallVec<[String; 4]>;

/// One externally observable update: every key it touched and the store
/// revision it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub keys: ChangedKeys,
    pub revision: u64,
}

impl StoreChange {
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

pub type Observer = Rc<dyn Fn(&StoreChange)>;

/// Flat string-keyed storage a `BoundSlot` reads from and writes to.
///
/// Implementations own persistence and change notification. Observers may
/// read the store while being notified.
pub trait RawStore: 'static {
    fn read_raw(&self, key: &str) -> Option<String>;
    fn write_raw(&self, key: &str, value: &str);
    fn remove_raw(&self, key: &str);
    fn subscribe(&self, observer: Observer) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

pub type StoreHandle = Rc<dyn RawStore>;

/// In-memory query-string store with change notification and batching.
///
/// Cloning gives another handle to the same store.
#[derive(Clone, Default)]
pub struct QueryStore(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
    params: Params,
    observers: SlotMap<SubscriptionId, Observer>,
    revision: u64,
    batch_depth: usize,
    pending: ChangedKeys,
}

impl Inner {
    fn position(&self, key: &str) -> Option<usize> {
        self.params.iter().position(|(k, _)| k == key)
    }
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_query_string(query: &str) -> Result<Self, QueryError> {
        let params = query::decode(query)?;
        let store = Self::new();
        store.0.borrow_mut().params = params;
        Ok(store)
    }

    pub fn handle(&self) -> StoreHandle {
        Rc::new(self.clone())
    }

    /// A handle that does not keep the store alive, for observers that
    /// need to read back from the store they are installed on.
    pub fn downgrade(&self) -> WeakQueryStore {
        WeakQueryStore(Rc::downgrade(&self.0))
    }

    /// Creates a slot bound to `key` on this store.
    pub fn bind<T: Clone + 'static>(
        &self,
        key: impl Into<String>,
        codec: impl Codec<T>,
        options: SlotOptions<T>,
    ) -> BoundSlot<T> {
        BoundSlot::new(self.handle(), key, codec, options)
    }

    pub fn to_query_string(&self) -> String {
        query::encode(&self.0.borrow().params)
    }

    pub fn params(&self) -> Params {
        self.0.borrow().params.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().params.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().params.is_empty()
    }

    /// Bumped once per externally observable update.
    pub fn revision(&self) -> u64 {
        self.0.borrow().revision
    }

    pub fn in_batch(&self) -> bool {
        self.0.borrow().batch_depth > 0
    }

    /// Runs `f` with notifications held back; observers hear about all of
    /// its writes at once when the outermost batch ends.
    pub fn run_batched<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = BatchGuard::begin(self);
        f()
    }

    /// Swaps the whole contents for `query`, as an external navigation
    /// would. Observers see one change listing every key that differs.
    pub fn replace_all(&self, query: &str) -> Result<(), QueryError> {
        let params = query::decode(query)?;
        self.replace_params(params);
        Ok(())
    }

    pub fn replace_params(&self, params: Params) {
        let changed: ChangedKeys = {
            let mut inner = self.0.borrow_mut();
            let mut changed = ChangedKeys::new();
            for (k, v) in &inner.params {
                let now = params.iter().find(|(nk, _)| nk == k).map(|(_, nv)| nv);
                if now != Some(v) {
                    changed.push(k.clone());
                }
            }
            for (k, _) in &params {
                if !inner.params.iter().any(|(ok, _)| ok == k) {
                    changed.push(k.clone());
                }
            }
            inner.params = params;
            changed
        };
        if !changed.is_empty() {
            self.mark_changed(changed);
        }
    }

    fn mark_changed(&self, keys: ChangedKeys) {
        let change = {
            let mut inner = self.0.borrow_mut();
            if inner.batch_depth > 0 {
                for k in keys {
                    if !inner.pending.contains(&k) {
                        inner.pending.push(k);
                    }
                }
                return;
            }
            inner.revision += 1;
            StoreChange {
                keys,
                revision: inner.revision,
            }
        };
        self.notify(&change);
    }

    fn flush_batch(&self) {
        let change = {
            let mut inner = self.0.borrow_mut();
            if inner.pending.is_empty() {
                return;
            }
            inner.revision += 1;
            StoreChange {
                keys: std::mem::take(&mut inner.pending),
                revision: inner.revision,
            }
        };
        self.notify(&change);
    }

    fn notify(&self, change: &StoreChange) {
        // Snapshot so observers can read, write or unsubscribe re-entrantly.
        let observers: Vec<Observer> = self.0.borrow().observers.values().cloned().collect();
        log::trace!(
            "store: revision {} changed {:?}, notifying {}",
            change.revision,
            change.keys,
            observers.len()
        );
        for obs in observers {
            obs(change);
        }
    }
}

impl RawStore for QueryStore {
    fn read_raw(&self, key: &str) -> Option<String> {
        let inner = self.0.borrow();
        inner.position(key).map(|i| inner.params[i].1.clone())
    }

    fn write_raw(&self, key: &str, value: &str) {
        {
            let mut inner = self.0.borrow_mut();
            match inner.position(key) {
                Some(i) if inner.params[i].1 == value => return,
                Some(i) => inner.params[i].1 = value.to_string(),
                None => inner.params.push((key.to_string(), value.to_string())),
            }
        }
        log::trace!("store: {key}={value}");
        self.mark_changed(smallvec::smallvec![key.to_string()]);
    }

    fn remove_raw(&self, key: &str) {
        {
            let mut inner = self.0.borrow_mut();
            match inner.position(key) {
                Some(i) => {
                    inner.params.remove(i);
                }
                None => return,
            }
        }
        log::trace!("store: removed {key}");
        self.mark_changed(smallvec::smallvec![key.to_string()]);
    }

    fn subscribe(&self, observer: Observer) -> SubscriptionId {
        self.0.borrow_mut().observers.insert(observer)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.0.borrow_mut().observers.remove(id).is_none() {
            log::warn!("store: unsubscribe of unknown observer {id:?}");
        }
    }
}

#[derive(Clone)]
pub struct WeakQueryStore(Weak<RefCell<Inner>>);

impl WeakQueryStore {
    pub fn upgrade(&self) -> Option<QueryStore> {
        self.0.upgrade().map(QueryStore)
    }
}

struct BatchGuard<'a> {
    store: &'a QueryStore,
}

impl<'a> BatchGuard<'a> {
    fn begin(store: &'a QueryStore) -> Self {
        store.0.borrow_mut().batch_depth += 1;
        BatchGuard { store }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let outermost = {
            let mut inner = self.store.0.borrow_mut();
            inner.batch_depth -= 1;
            inner.batch_depth == 0
        };
        if !outermost {
            return;
        }
        if std::thread::panicking() {
            // Observers are not run while unwinding; the batch's keys are
            // dropped so they cannot leak into the next batch.
            let dropped = std::mem::take(&mut self.store.0.borrow_mut().pending);
            if !dropped.is_empty() {
                log::warn!("store: batch panicked; {dropped:?} changed without notification");
            }
            return;
        }
        self.store.flush_batch();
    }
}
