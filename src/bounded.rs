//! Ordered, capacity-limited event collection.
//!
//! Entries are keyed by `(created_at, insertion seq)` so iteration in reverse
//! yields newest-first and the first key is always the eviction victim. Two
//! side indexes keep duplicate detection and replace lookups off the scan
//! path. The type is not synchronized; [`crate::memory::MemoryStore`] puts
//! it behind a lock.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use tracing::{debug, trace};

use crate::event::{Event, ReplaceKey};

/// Position of an entry in the ordered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Slot {
    created_at: u64,
    seq: u64,
}

#[derive(Debug)]
pub struct BoundedStore {
    max_size: usize,
    next_seq: u64,
    entries: BTreeMap<Slot, Arc<Event>>,
    by_id: HashMap<String, Slot>,
    by_key: HashMap<ReplaceKey, BTreeSet<Slot>>,
}

impl BoundedStore {
    /// Create an empty store holding at most `max_size` events.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            next_seq: 0,
            entries: BTreeMap::new(),
            by_id: HashMap::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Event>> {
        self.by_id
            .get(id)
            .and_then(|slot| self.entries.get(slot))
            .cloned()
    }

    /// Insert `event` unless its id is already stored.
    ///
    /// When the insert pushes the store over capacity the entry with the
    /// smallest `created_at` is evicted, older insertions losing ties. That
    /// victim may be `event` itself; the insert still reports `true`.
    pub fn insert(&mut self, event: Event) -> bool {
        if self.by_id.contains_key(&event.id) {
            return false;
        }
        let slot = Slot {
            created_at: event.created_at,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.by_id.insert(event.id.clone(), slot);
        self.by_key.entry(event.replace_key()).or_default().insert(slot);
        self.entries.insert(slot, Arc::new(event));

        while self.entries.len() > self.max_size {
            self.evict_oldest();
        }
        true
    }

    /// Remove the event with `id`. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.by_id.get(id).copied() {
            Some(slot) => {
                self.remove_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Last-write-wins insert keyed by [`Event::replace_key`].
    ///
    /// If any live event under the same key has `created_at` at or after the
    /// candidate's, nothing changes and `false` is returned. Otherwise every
    /// live event under the key is removed before inserting the candidate.
    /// A candidate whose id is already stored is rejected up front, so a
    /// failed replace never drops live events.
    pub fn replace(&mut self, event: Event) -> bool {
        if self.by_id.contains_key(&event.id) {
            debug!(id = %event.id, "replace discarded, id already stored");
            return false;
        }
        let key = event.replace_key();
        let existing: Vec<Slot> = self
            .by_key
            .get(&key)
            .map(|slots| slots.iter().copied().collect())
            .unwrap_or_default();
        if existing.iter().any(|s| s.created_at >= event.created_at) {
            debug!(
                id = %event.id,
                pubkey = %key.pubkey,
                kind = key.kind,
                "replace discarded, newer event already stored"
            );
            return false;
        }
        for slot in existing {
            self.remove_slot(slot);
        }
        self.insert(event)
    }

    /// Point-in-time copy of every entry, newest `created_at` first.
    ///
    /// Entries sharing a timestamp come newest insertion first.
    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.entries.values().rev().cloned().collect()
    }

    fn evict_oldest(&mut self) {
        if let Some((&slot, ev)) = self.entries.iter().next() {
            trace!(id = %ev.id, created_at = slot.created_at, "evicting oldest event");
            self.remove_slot(slot);
        }
    }

    fn remove_slot(&mut self, slot: Slot) {
        let Some(ev) = self.entries.remove(&slot) else {
            return;
        };
        self.by_id.remove(&ev.id);
        let key = ev.replace_key();
        if let Some(slots) = self.by_key.get_mut(&key) {
            slots.remove(&slot);
            if slots.is_empty() {
                self.by_key.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Tag;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn sample_event(id: &str, pubkey: &str, kind: u32, dtag: Option<&str>, created: u64) -> Event {
        let mut tags = vec![];
        if let Some(d) = dtag {
            tags.push(Tag(vec!["d".into(), d.into()]));
        }
        Event {
            id: id.into(),
            pubkey: pubkey.into(),
            kind,
            created_at: created,
            tags,
            content: String::new(),
            sig: String::new(),
        }
    }

    fn ids(store: &BoundedStore) -> Vec<String> {
        store.snapshot().iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn insert_is_idempotent() {
        let mut store = BoundedStore::new(10);
        let ev = sample_event("aa11", "p1", 1, None, 1);
        assert!(store.insert(ev.clone()));
        let before = ids(&store);
        assert!(!store.insert(ev));
        assert_eq!(store.len(), 1);
        assert_eq!(ids(&store), before);
    }

    #[test]
    fn snapshot_is_newest_first_with_insertion_tie_break() {
        let mut store = BoundedStore::new(10);
        store.insert(sample_event("a", "p", 1, None, 10));
        store.insert(sample_event("b", "p", 1, None, 30));
        store.insert(sample_event("c", "p", 1, None, 20));
        store.insert(sample_event("d", "p", 1, None, 20));
        assert_eq!(ids(&store), ["b", "d", "c", "a"]);
    }

    #[test]
    fn eviction_removes_smallest_created_at() {
        let mut store = BoundedStore::new(2);
        store.insert(sample_event("new", "p", 1, None, 50));
        store.insert(sample_event("old", "p", 1, None, 10));
        store.insert(sample_event("mid", "p", 1, None, 30));
        assert_eq!(store.len(), 2);
        assert!(!store.contains("old"));
        assert_eq!(ids(&store), ["new", "mid"]);
    }

    #[test]
    fn eviction_ties_drop_oldest_insertion() {
        let mut store = BoundedStore::new(2);
        store.insert(sample_event("first", "p", 1, None, 10));
        store.insert(sample_event("second", "p", 1, None, 10));
        store.insert(sample_event("third", "p", 1, None, 10));
        assert!(!store.contains("first"));
        assert!(store.contains("second") && store.contains("third"));
    }

    #[test]
    fn insert_older_than_everything_evicts_itself() {
        let mut store = BoundedStore::new(1);
        store.insert(sample_event("keep", "p", 1, None, 10));
        assert!(store.insert(sample_event("stale", "p", 1, None, 5)));
        assert_eq!(ids(&store), ["keep"]);
        // the evicted id is free again
        assert!(store.insert(sample_event("stale", "p", 1, None, 5)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn bound_holds_for_random_sequences() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut store = BoundedStore::new(16);
        for i in 0..500 {
            let created = rng.gen_range(0..100);
            let id = format!("id{i}");
            let before: Vec<Arc<Event>> = store.snapshot();
            store.insert(sample_event(&id, "p", 1, None, created));
            assert!(store.len() <= 16);
            if before.len() == 16 {
                // smallest created_at loses; ties go against the earliest
                // insert and the newcomer is always the latest insert
                let oldest = before.iter().map(|e| e.created_at).min().unwrap();
                let victim = if created < oldest {
                    id.clone()
                } else {
                    before
                        .iter()
                        .rev()
                        .find(|e| e.created_at == oldest)
                        .map(|e| e.id.clone())
                        .unwrap()
                };
                assert!(!store.contains(&victim), "step {i}: {victim} survived");
                let mut expected: Vec<String> = before.iter().map(|e| e.id.clone()).collect();
                expected.push(id);
                expected.retain(|e| *e != victim);
                let mut got = ids(&store);
                expected.sort();
                got.sort();
                assert_eq!(got, expected);
            }
        }
    }

    #[test]
    fn delete_removes_and_ignores_missing() {
        let mut store = BoundedStore::new(10);
        store.insert(sample_event("aa11", "p1", 1, None, 1));
        assert!(store.delete("aa11"));
        assert!(!store.delete("aa11"));
        assert!(store.is_empty());
        assert!(store.get("aa11").is_none());
    }

    #[test]
    fn replace_keeps_latest_per_key() {
        let mut store = BoundedStore::new(10);
        assert!(store.replace(sample_event("v1", "p1", 0, None, 10)));
        assert!(store.replace(sample_event("v3", "p1", 0, None, 30)));
        assert!(!store.replace(sample_event("v2", "p1", 0, None, 20)));
        // equal timestamps do not replace
        assert!(!store.replace(sample_event("v3b", "p1", 0, None, 30)));
        assert_eq!(ids(&store), ["v3"]);
        // other authors and kinds are independent
        assert!(store.replace(sample_event("o1", "p2", 0, None, 5)));
        assert!(store.replace(sample_event("k3", "p1", 3, None, 5)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn replace_addressable_keys_on_pubkey_and_kind() {
        let mut store = BoundedStore::new(10);
        assert!(store.replace(sample_event("a1", "p1", 30023, Some("one"), 1)));
        assert!(!store.replace(sample_event("b1", "p1", 30023, Some("two"), 1)));
        assert!(store.replace(sample_event("a2", "p1", 30023, Some("one"), 2)));
        assert_eq!(ids(&store), ["a2"]);
        // a different d value still replaces the single live record
        assert!(store.replace(sample_event("b2", "p1", 30023, Some("two"), 3)));
        assert_eq!(ids(&store), ["b2"]);
    }

    #[test]
    fn replace_with_stored_id_keeps_existing_records() {
        let mut store = BoundedStore::new(10);
        store.insert(sample_event("x", "p1", 1, None, 5));
        assert!(store.replace(sample_event("y", "p2", 0, None, 1)));
        // same id as "x" but under y's key and newer than y
        assert!(!store.replace(sample_event("x", "p2", 0, None, 10)));
        assert!(store.contains("y"));
        assert_eq!(store.get("x").unwrap().pubkey, "p1");
        assert_eq!(ids(&store), ["x", "y"]);
    }

    #[test]
    fn replace_collapses_duplicates_left_by_plain_inserts() {
        let mut store = BoundedStore::new(10);
        store.insert(sample_event("x1", "p1", 0, None, 1));
        store.insert(sample_event("x2", "p1", 0, None, 2));
        assert!(store.replace(sample_event("x3", "p1", 0, None, 3)));
        assert_eq!(ids(&store), ["x3"]);
    }

    #[test]
    fn replace_invariant_random() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = BoundedStore::new(1000);
        let mut best = 0;
        for i in 0..200 {
            let created = rng.gen_range(1..1000);
            store.replace(sample_event(&format!("r{i}"), "p", 10_002, None, created));
            best = best.max(created);
        }
        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].created_at, best);
    }

    #[test]
    fn indexes_follow_eviction() {
        let mut store = BoundedStore::new(1);
        store.insert(sample_event("a", "p1", 0, None, 1));
        store.insert(sample_event("b", "p2", 1, None, 2));
        assert!(!store.contains("a"));
        // the evicted replaceable no longer blocks an older replace
        assert!(store.replace(sample_event("c", "p1", 0, None, 1)));
        assert_eq!(store.len(), 1);
    }
}
