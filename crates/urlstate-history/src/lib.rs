//! Browser-like session history over a [`QueryStore`].
//!
//! Every externally observable store update (a single write, or one whole
//! `run_batched` call) becomes a history entry. `back` / `forward` put an
//! earlier query string back into the store, which notifies bound slots the
//! same way an address-bar navigation would.
//!
//! An update is recorded when it leaves the store different from the
//! current entry. Restoring an entry therefore records nothing, even when
//! the restore happens inside a batch, while a write made by a watch
//! callback in reaction to the restore is recorded like any other write.
use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use urlstate_core::{QueryError, QueryStore, RawStore, StoreChange, Subscription, query};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum NavDirection {
    #[default]
    None,
    Push,
    Back,
    Forward,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    pub query: String,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("invalid history JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history has no entries")]
    Empty,
    #[error("index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Query(#[from] QueryError),
}

struct HistoryState {
    entries: Vec<Entry>,
    index: usize,
    next_id: u64,
    last_dir: NavDirection,
}

impl HistoryState {
    fn push(&mut self, query: String) {
        self.entries.truncate(self.index + 1);
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, query });
        self.index = self.entries.len() - 1;
        self.last_dir = NavDirection::Push;
    }
}

#[derive(Serialize, Deserialize)]
struct Saved {
    entries: Vec<Entry>,
    index: usize,
}

pub struct History {
    store: QueryStore,
    state: Rc<RefCell<HistoryState>>,
    _sub: Subscription,
}

impl History {
    /// Starts recording `store`; its current contents become the first entry.
    pub fn new(store: QueryStore) -> Self {
        let state = Rc::new(RefCell::new(HistoryState {
            entries: vec![Entry {
                id: 1,
                query: store.to_query_string(),
            }],
            index: 0,
            next_id: 2,
            last_dir: NavDirection::None,
        }));

        let weak_state = Rc::downgrade(&state);
        let weak_store = store.downgrade();
        let id = store.subscribe(Rc::new(move |_change: &StoreChange| {
            let (Some(state), Some(store)) = (weak_state.upgrade(), weak_store.upgrade()) else {
                return;
            };
            let query = store.to_query_string();
            let mut s = state.borrow_mut();
            if s.entries[s.index].query == query {
                return;
            }
            s.push(query);
        }));
        let sub = Subscription::new({
            let store = store.clone();
            move || store.unsubscribe(id)
        });

        Self {
            store,
            state,
            _sub: sub,
        }
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    /// Navigates to `query` as a fresh entry. A query equal to the current
    /// contents changes nothing and records nothing.
    pub fn push(&self, query: &str) -> Result<(), HistoryError> {
        self.store.replace_all(query)?;
        Ok(())
    }

    pub fn back(&self) -> bool {
        let target = match self.state.borrow().index.checked_sub(1) {
            Some(t) => t,
            None => return false,
        };
        self.navigate(target, NavDirection::Back)
    }

    pub fn forward(&self) -> bool {
        let target = self.state.borrow().index + 1;
        self.navigate(target, NavDirection::Forward)
    }

    /// Moves `delta` entries; negative goes back. Out of range does nothing.
    pub fn go(&self, delta: isize) -> bool {
        let target = match self.state.borrow().index.checked_add_signed(delta) {
            Some(t) => t,
            None => return false,
        };
        let dir = if delta < 0 {
            NavDirection::Back
        } else {
            NavDirection::Forward
        };
        self.navigate(target, dir)
    }

    pub fn can_go_back(&self) -> bool {
        self.state.borrow().index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let s = self.state.borrow();
        s.index + 1 < s.entries.len()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.state.borrow().index
    }

    pub fn current(&self) -> Entry {
        let s = self.state.borrow();
        s.entries[s.index].clone()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.state.borrow().entries.clone()
    }

    pub fn last_dir(&self) -> NavDirection {
        self.state.borrow().last_dir
    }

    pub fn to_json(&self) -> Result<String, HistoryError> {
        let s = self.state.borrow();
        let saved = Saved {
            entries: s.entries.clone(),
            index: s.index,
        };
        Ok(serde_json::to_string(&saved)?)
    }

    /// Replaces all entries with a saved history and restores the store to
    /// its current entry. Every entry must hold a readable query; on error
    /// nothing changes.
    pub fn from_json(&self, json: &str) -> Result<(), HistoryError> {
        let mut saved: Saved = serde_json::from_str(json).inspect_err(|e| {
            log::warn!("history: ignoring unreadable saved state: {e}");
        })?;
        if saved.entries.is_empty() {
            return Err(HistoryError::Empty);
        }
        if saved.index >= saved.entries.len() {
            return Err(HistoryError::IndexOutOfRange {
                index: saved.index,
                len: saved.entries.len(),
            });
        }
        let mut decoded = Vec::with_capacity(saved.entries.len());
        for (i, entry) in saved.entries.iter_mut().enumerate() {
            let params = query::decode(&entry.query).inspect_err(|e| {
                log::warn!("history: saved entry {i} holds an unreadable query: {e}");
            })?;
            // Stored in the store's own spelling so restores compare equal.
            entry.query = query::encode(&params);
            decoded.push(params);
        }
        let params = decoded.swap_remove(saved.index);

        {
            let mut s = self.state.borrow_mut();
            s.next_id = saved.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            s.entries = saved.entries;
            s.index = saved.index;
            s.last_dir = NavDirection::None;
        }
        self.store.replace_params(params);
        Ok(())
    }

    /// Moves to `target` only once its query has decoded; an unreadable
    /// entry leaves both the index and the store where they were.
    fn navigate(&self, target: usize, dir: NavDirection) -> bool {
        let params = {
            let s = self.state.borrow();
            if target >= s.entries.len() || target == s.index {
                return false;
            }
            match query::decode(&s.entries[target].query) {
                Ok(params) => params,
                Err(e) => {
                    log::warn!("history: entry {target} holds an unreadable query: {e}");
                    return false;
                }
            }
        };
        {
            let mut s = self.state.borrow_mut();
            s.index = target;
            s.last_dir = dir;
        }
        self.store.replace_params(params);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use urlstate_core::prelude::*;

    use super::*;

    #[test]
    fn writes_and_batches_become_entries() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        let name = store.bind("name", TextCodec, SlotOptions::new(String::new()));
        let email = store.bind("email", TextCodec, SlotOptions::new(String::new()));

        name.set("Ada".into());
        email.set("ada@example.com".into());
        assert_eq!(history.len(), 3);

        store.run_batched(|| {
            name.set("Grace".into());
            email.set("grace@example.com".into());
        });
        assert_eq!(history.len(), 4);
        assert_eq!(
            history.current().query,
            "name=Grace&email=grace%40example.com"
        );
        assert_eq!(history.last_dir(), NavDirection::Push);
    }

    #[test]
    fn back_and_forward_restore_slots() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        let count = store.bind("demo_count", FromStrCodec::<i64>::new(), SlotOptions::new(0));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = count.watch({
            let seen = seen.clone();
            move |v: &i64| seen.borrow_mut().push(*v)
        });

        count.set(1);
        count.set(2);
        assert!(history.back());
        assert_eq!(count.get(), 1);
        assert!(history.back());
        assert_eq!(count.get(), 0);
        assert!(!history.back());
        assert!(history.forward());
        assert_eq!(count.get(), 1);
        assert_eq!(history.last_dir(), NavDirection::Forward);
        assert_eq!(history.len(), 3);
        assert_eq!(*seen.borrow(), vec![1, 2, 1, 0, 1]);
    }

    #[test]
    fn writing_after_back_drops_forward_entries() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        let q = store.bind("q", TextCodec, SlotOptions::new(String::new()));

        q.set("a".into());
        q.set("b".into());
        history.back();
        q.set("c".into());

        assert!(!history.can_go_forward());
        let queries: Vec<String> = history.entries().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["", "q=a", "q=c"]);
    }

    #[test]
    fn go_moves_by_delta() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        for q in ["a=1", "a=2", "a=3"] {
            history.push(q).unwrap();
        }
        assert!(history.go(-2));
        assert_eq!(store.to_query_string(), "a=1");
        assert!(!history.go(-5));
        assert!(!history.go(0));
        assert!(history.go(2));
        assert_eq!(store.to_query_string(), "a=3");
    }

    #[test]
    fn push_of_identical_query_records_nothing() {
        let store = QueryStore::from_query_string("a=1").unwrap();
        let history = History::new(store.clone());
        history.push("?a=1").unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.push("=oops").is_err());
    }

    #[test]
    fn json_round_trip() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        history.push("state=light%7C0%7C2024-06-01").unwrap();
        history.push("state=dark%7C1%7C2024-01-01").unwrap();
        history.back();
        let json = history.to_json().unwrap();

        let other_store = QueryStore::new();
        let restored = History::new(other_store.clone());
        restored.from_json(&json).unwrap();

        assert_eq!(restored.entries(), history.entries());
        assert_eq!(restored.index(), 1);
        assert_eq!(
            other_store.read_raw("state").as_deref(),
            Some("light|0|2024-06-01")
        );
        assert!(restored.forward());
        assert_eq!(restored.len(), 3);

        other_store.write_raw("state", "x");
        assert_eq!(restored.current().id, 4);
    }

    #[test]
    fn bad_json_changes_nothing() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        history.push("a=1").unwrap();

        assert!(matches!(history.from_json("nope"), Err(HistoryError::Json(_))));
        assert!(matches!(
            history.from_json(r#"{"entries":[],"index":0}"#),
            Err(HistoryError::Empty)
        ));
        assert!(matches!(
            history.from_json(r#"{"entries":[{"id":1,"query":""}],"index":3}"#),
            Err(HistoryError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(history.len(), 2);
        assert_eq!(store.to_query_string(), "a=1");
    }

    #[test]
    fn saved_history_with_unreadable_entry_is_rejected() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        history.push("b=1").unwrap();

        let json = r#"{"entries":[{"id":1,"query":"a=1"},{"id":2,"query":"=bad"}],"index":0}"#;
        assert!(matches!(history.from_json(json), Err(HistoryError::Query(_))));

        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), 1);
        assert_eq!(store.to_query_string(), "b=1");
        assert!(!history.forward());
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn restored_entries_use_store_spelling() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        let json = r#"{"entries":[{"id":1,"query":"?a=%7C"},{"id":2,"query":"a=2"}],"index":0}"#;
        history.from_json(json).unwrap();

        assert_eq!(history.current().query, "a=%7C");
        assert!(history.forward());
        assert!(history.back());
        assert_eq!(store.read_raw("a").as_deref(), Some("|"));
        assert_eq!(history.len(), 2);
        assert!(history.can_go_forward());
    }

    #[test]
    fn navigation_inside_batch_keeps_forward_entries() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        history.push("a=1").unwrap();
        history.push("a=2").unwrap();

        let moved = store.run_batched(|| history.back());

        assert!(moved);
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 1);
        assert!(history.can_go_forward());
        assert_eq!(store.to_query_string(), "a=1");
        let queries: Vec<String> = history.entries().into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["", "a=1", "a=2"]);
    }

    #[test]
    fn watcher_write_during_back_is_recorded() {
        let store = QueryStore::new();
        let history = History::new(store.clone());
        let page = store.bind("page", FromStrCodec::<u32>::new(), SlotOptions::new(0));
        let seen = store.bind("seen", TextCodec, SlotOptions::new(String::new()));

        page.set(1);
        page.set(2);

        let _sub = page.watch({
            let seen = seen.clone();
            move |p: &u32| {
                if *p == 1 {
                    seen.set("yes".into());
                }
            }
        });

        assert!(history.back());
        assert_eq!(store.to_query_string(), "page=1&seen=yes");
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.current().query, "page=1&seen=yes");
        assert!(!history.can_go_forward());
    }
}
