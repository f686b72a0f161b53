// ibfundamental/src/memo.rs
// Small bounded cache with least-recently-used eviction

use std::collections::VecDeque;

/// A fixed-capacity LRU cache.
///
/// Intended for a handful of entries, so lookups are linear scans. Entries
/// are kept oldest first; the back of the queue is the most recently used.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
  capacity: usize,
  entries: VecDeque<(K, V)>,
}

impl<K: PartialEq, V> LruCache<K, V> {
  pub fn new(capacity: usize) -> Self {
    LruCache { capacity, entries: VecDeque::with_capacity(capacity) }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Membership test that does not count as a use.
  pub fn contains(&self, key: &K) -> bool {
    self.entries.iter().any(|(k, _)| k == key)
  }

  /// Looks up `key` and marks it most recently used.
  pub fn get(&mut self, key: &K) -> Option<&V> {
    let pos = self.entries.iter().position(|(k, _)| k == key)?;
    let entry = self.entries.remove(pos)?;
    self.entries.push_back(entry);
    self.entries.back().map(|(_, v)| v)
  }

  /// Inserts or replaces `key` as the most recently used entry.
  /// Returns the key evicted to make room, if any.
  pub fn insert(&mut self, key: K, value: V) -> Option<K> {
    if self.capacity == 0 {
      return None;
    }
    if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
      self.entries.remove(pos);
    }
    let evicted = if self.entries.len() >= self.capacity {
      self.entries.pop_front().map(|(k, _)| k)
    } else {
      None
    };
    self.entries.push_back((key, value));
    evicted
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }
}
