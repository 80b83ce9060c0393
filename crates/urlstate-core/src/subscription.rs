use std::cell::RefCell;

/// Detaches an observer when cancelled or dropped.
pub struct Subscription(RefCell<Option<Box<dyn FnOnce()>>>);

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self(RefCell::new(Some(Box::new(cancel))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn cancel(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Keep the observer installed for the lifetime of the store.
    pub fn detach(self) {
        self.0.borrow_mut().take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
