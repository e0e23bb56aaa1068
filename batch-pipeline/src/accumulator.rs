use std::fmt::Debug;
use std::hash::Hash;

use ahash::AHashMap;

/// A record with a natural key. Two records with the same key describe the
/// same entity, and the later one wins.
pub trait Keyed {
    type Key: Eq + Hash + Debug + Send;

    fn key(&self) -> Self::Key;
}

/// Pending records indexed by key. Adding a record whose key is already
/// present replaces the earlier record, so the batch never holds two records
/// for one key.
pub struct BatchAccumulator<K, T, F> {
    records: AHashMap<K, T>,
    key_of: F,
    capacity: usize,
}

impl<K, T, F> BatchAccumulator<K, T, F>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    pub fn new(key_of: F) -> Self {
        Self::with_capacity(key_of, 0)
    }

    pub fn with_capacity(key_of: F, capacity: usize) -> Self {
        Self {
            records: AHashMap::with_capacity(capacity),
            key_of,
            capacity,
        }
    }

    /// Inserts or replaces the record for its key, returning the record that
    /// was superseded.
    pub fn add(&mut self, record: T) -> Option<T> {
        let key = (self.key_of)(&record);
        self.records.insert(key, record)
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.records.get(key)
    }

    /// Hands back every pending record and leaves the accumulator empty.
    /// Order of the returned records is unspecified.
    pub fn drain(&mut self) -> Vec<T> {
        let records = std::mem::replace(
            &mut self.records,
            AHashMap::with_capacity(self.capacity),
        );
        records.into_values().collect()
    }
}
