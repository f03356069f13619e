// SPDX-License-Identifier: MPL-2.0

//! Ordered collection with an id index.
//!
//! Records live in a `VecDeque` so head inserts (newest posts) and tail
//! inserts (achievements) are both cheap. The index stores an absolute slot
//! per id; a record's position is its slot minus the slot of the front
//! element, so pushing to the front never rewrites the index.

use std::collections::{HashMap, VecDeque};

/// Anything stored in an [`IndexedList`] must expose a stable unique id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for crate::api::Post {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for crate::api::Achievement {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Where a record that is not yet present gets inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Head,
    Tail,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone)]
pub struct IndexedList<T> {
    items: VecDeque<T>,
    slots: HashMap<String, i64>,
    /// Slot of `items[0]`
    front: i64,
}

impl<T> Default for IndexedList<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            slots: HashMap::new(),
            front: 0,
        }
    }
}

impl<T: Keyed> IndexedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in order. A repeated id replaces the earlier
    /// record but keeps the earlier position.
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new();
        for record in records {
            list.upsert(record, Placement::Tail);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.slots.get(id).map(|slot| (slot - self.front) as usize)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.position(id).and_then(|pos| self.items.get(pos))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Keyed::key)
    }

    /// Insert-or-replace by id. Replacing keeps the existing position.
    pub fn upsert(&mut self, record: T, placement: Placement) -> Upsert {
        if let Some(pos) = self.position(record.key()) {
            self.items[pos] = record;
            return Upsert::Replaced;
        }

        let key = record.key().to_string();
        match placement {
            Placement::Head => {
                self.front -= 1;
                self.items.push_front(record);
                self.slots.insert(key, self.front);
            }
            Placement::Tail => {
                let slot = self.front + self.items.len() as i64;
                self.items.push_back(record);
                self.slots.insert(key, slot);
            }
        }
        Upsert::Inserted
    }

    /// Remove by id. Absent ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.position(id)?;
        self.slots.remove(id);
        let removed = self.items.remove(pos)?;

        // Shift whichever side of the gap is shorter.
        if pos < self.items.len() / 2 {
            for item in self.items.range(..pos) {
                if let Some(slot) = self.slots.get_mut(item.key()) {
                    *slot += 1;
                }
            }
            self.front += 1;
        } else {
            for item in self.items.range(pos..) {
                if let Some(slot) = self.slots.get_mut(item.key()) {
                    *slot -= 1;
                }
            }
        }

        Some(removed)
    }

    /// Mutate a record in place. The closure must not change the id.
    pub fn update<R>(&mut self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let pos = self.position(id)?;
        let item = self.items.get_mut(pos)?;
        let result = f(&mut *item);
        debug_assert_eq!(item.key(), id, "update must not change the record id");
        Some(result)
    }

    /// Replace the record `old_id` with `record`, which may carry a
    /// different id, keeping the position. If `record`'s id already exists
    /// elsewhere that copy is dropped. Returns false when `old_id` is absent.
    pub fn replace_keyed(&mut self, old_id: &str, record: T) -> bool {
        if !self.contains(old_id) {
            return false;
        }

        let new_id = record.key().to_string();
        if new_id != old_id {
            self.remove(&new_id);
        }

        let Some(pos) = self.position(old_id) else {
            return false;
        };
        let Some(slot) = self.slots.remove(old_id) else {
            return false;
        };
        self.items[pos] = record;
        self.slots.insert(new_id, slot);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.slots.clear();
        self.front = 0;
    }

    /// Check that every id maps to the record stored at its position and
    /// that no id appears twice.
    pub fn is_consistent(&self) -> bool {
        self.slots.len() == self.items.len()
            && self
                .items
                .iter()
                .enumerate()
                .all(|(pos, item)| self.position(item.key()) == Some(pos))
    }
}

impl<T: Keyed + Clone> IndexedList<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
