//! Open-addressed hash table from [`Value`] to [`Value`].
//!
//! Layout: a power-of-two `indices` array probed linearly, pointing into an
//! `entries` vector kept in insertion order. Deleting leaves a tombstone in
//! both arrays; growing rebuilds both and drops the tombstones. Iteration
//! walks `entries`, so it follows storage (insertion) order.

use crate::compare::{hash_key, keys_equal};
use crate::values::Value;

const MIN_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Deleted,
    Full(usize),
}

#[derive(Debug, Clone)]
struct Entry {
    hash: u64,
    key: Value,
    value: Value,
}

#[derive(Debug, Clone)]
pub struct Table {
    indices: Vec<Slot>,
    entries: Vec<Option<Entry>>,
    len: usize,
    cursor: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        Self {
            indices: vec![Slot::Empty; MIN_CAPACITY],
            entries: Vec::new(),
            len: 0,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of index slots.
    pub fn capacity(&self) -> usize {
        self.indices.len()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.get_hashed(hash_key(key), key)
    }

    pub fn get_hashed(&self, hash: u64, key: &Value) -> Option<&Value> {
        let (_, e) = self.find(hash, key)?;
        self.entries[e].as_ref().map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.find(hash_key(key), key).is_some()
    }

    /// Insert or overwrite. An existing key keeps its position and its
    /// original key object.
    pub fn insert(&mut self, key: Value, value: Value) {
        let hash = hash_key(&key);
        if let Some((_, e)) = self.find(hash, &key) {
            if let Some(entry) = self.entries[e].as_mut() {
                entry.value = value;
            }
            return;
        }
        if (self.entries.len() + 1) * 3 > self.indices.len() * 2 {
            self.rebuild(self.len + 1);
        }
        let slot = self.free_slot(hash);
        self.indices[slot] = Slot::Full(self.entries.len());
        self.entries.push(Some(Entry { hash, key, value }));
        self.len += 1;
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let (slot, e) = self.find(hash_key(key), key)?;
        self.indices[slot] = Slot::Deleted;
        let entry = self.entries[e].take()?;
        self.len -= 1;
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        *self = Table::new();
    }

    /// Upsert every entry of `other`, in its storage order.
    pub fn merge(&mut self, other: &Table) {
        for (k, v) in other.iter() {
            self.insert(k.clone(), v.clone());
        }
    }

    /// Caller-driven iteration: `index == 0` rewinds the cursor, every call
    /// returns the key of the next populated entry.
    pub fn next_key(&mut self, index: usize) -> Option<Value> {
        if index == 0 {
            self.cursor = 0;
        }
        while self.cursor < self.entries.len() {
            let at = self.cursor;
            self.cursor += 1;
            if let Some(entry) = &self.entries[at] {
                return Some(entry.key.clone());
            }
        }
        None
    }

    /// Live entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries
            .iter()
            .flatten()
            .map(|entry| (&entry.key, &entry.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(_, v)| v)
    }

    fn mask(&self) -> usize {
        self.indices.len() - 1
    }

    fn find(&self, hash: u64, key: &Value) -> Option<(usize, usize)> {
        let mask = self.mask();
        let mut slot = hash as usize & mask;
        for _ in 0..self.indices.len() {
            match self.indices[slot] {
                Slot::Empty => return None,
                Slot::Deleted => {}
                Slot::Full(e) => {
                    if let Some(entry) = &self.entries[e] {
                        if entry.hash == hash && keys_equal(&entry.key, key) {
                            return Some((slot, e));
                        }
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
        None
    }

    fn free_slot(&self, hash: u64) -> usize {
        let mask = self.mask();
        let mut slot = hash as usize & mask;
        while let Slot::Full(_) = self.indices[slot] {
            slot = (slot + 1) & mask;
        }
        slot
    }

    fn rebuild(&mut self, min_len: usize) {
        let capacity = (min_len * 2).next_power_of_two().max(MIN_CAPACITY);
        let live: Vec<Entry> = self.entries.drain(..).flatten().collect();
        self.indices = vec![Slot::Empty; capacity];
        self.cursor = 0;
        for entry in live {
            let slot = self.free_slot(entry.hash);
            self.indices[slot] = Slot::Full(self.entries.len());
            self.entries.push(Some(entry));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn test_insert_get_overwrite() {
        let mut t = Table::new();
        t.insert(key("a"), Value::from(1));
        t.insert(key("b"), Value::from(2));
        t.insert(key("a"), Value::from(3));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(&key("a")), Some(&Value::from(3)));
        assert_eq!(t.keys().cloned().collect::<Vec<_>>(), vec![key("a"), key("b")]);
    }

    #[test]
    fn test_remove_leaves_other_entries_reachable() {
        let mut t = Table::new();
        for i in 0..5 {
            t.insert(Value::from(i), Value::from(i * 10));
        }
        assert_eq!(t.remove(&Value::from(2)), Some(Value::from(20)));
        assert_eq!(t.remove(&Value::from(2)), None);
        assert_eq!(t.len(), 4);
        for i in [0, 1, 3, 4] {
            assert_eq!(t.get(&Value::from(i)), Some(&Value::from(i * 10)));
        }
    }

    #[test]
    fn test_growth_preserves_order() {
        let mut t = Table::new();
        for i in 0..200 {
            t.insert(Value::from(i), Value::None);
        }
        assert!(t.capacity() >= 300);
        let keys: Vec<Value> = t.keys().cloned().collect();
        assert_eq!(keys.len(), 200);
        assert_eq!(keys[0], Value::from(0));
        assert_eq!(keys[199], Value::from(199));
    }

    #[test]
    fn test_churn_with_tombstones() {
        let mut t = Table::new();
        for round in 0..50 {
            t.insert(Value::from(round), Value::from(round));
            if round % 2 == 0 {
                t.remove(&Value::from(round));
            }
        }
        assert_eq!(t.len(), 25);
        assert!(t.contains(&Value::from(49)));
        assert!(!t.contains(&Value::from(48)));
    }

    #[test]
    fn test_next_key_visits_each_key_once() {
        let mut t = Table::new();
        for s in ["x", "y", "z"] {
            t.insert(key(s), Value::None);
        }
        t.remove(&key("y"));
        let seen: Vec<Value> = (0..t.len()).filter_map(|i| t.next_key(i)).collect();
        assert_eq!(seen, vec![key("x"), key("z")]);
        assert_eq!(t.next_key(2), None);
        // index 0 rewinds
        assert_eq!(t.next_key(0), Some(key("x")));
    }

    #[test]
    fn test_merge_upserts_in_order() {
        let mut a = Table::new();
        a.insert(key("k"), Value::from(1));
        let mut b = Table::new();
        b.insert(key("k"), Value::from(2));
        b.insert(key("n"), Value::from(3));
        a.merge(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(&key("k")), Some(&Value::from(2)));
    }
}
