//! Parked resources addressed by storage id.
//!
//! A backing store can deliver a pre-built resource for a cell instead of
//! inline content. The resource is parked here under its storage id and
//! moved into the slot when the matching null-content entry is applied.
//! Whatever nobody claims is evicted oldest-first once storage grows past
//! four times the largest batch seen.

use std::collections::{HashMap, VecDeque};

/// Capacity multiplier over the largest batch.
const CAPACITY_PER_BATCH_ENTRY: usize = 4;

/// A pre-built content unit delivered alongside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub payload: String,
}

#[derive(Debug, Default)]
pub struct ResourceStorage {
    parked: HashMap<String, String>,
    /// Parked ids, oldest first.
    order: VecDeque<String>,
    capacity: usize,
}

impl ResourceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a resource, replacing any earlier one with the same id.
    pub fn park(&mut self, resource: Resource) {
        if self.parked.insert(resource.id.clone(), resource.payload).is_none() {
            self.order.push_back(resource.id);
        }
    }

    /// Move a resource out of storage.
    pub fn take(&mut self, id: &str) -> Option<Resource> {
        let payload = self.parked.remove(id)?;
        self.forget(id);
        Some(Resource {
            id: id.to_string(),
            payload,
        })
    }

    /// Drop a resource. Returns whether it was parked.
    pub fn discard(&mut self, id: &str) -> bool {
        if self.parked.remove(id).is_none() {
            return false;
        }
        self.forget(id);
        true
    }

    fn forget(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            self.order.remove(pos);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parked.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.parked.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.parked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow capacity for a batch of `batch_len` coordinates and evict the
    /// oldest resources beyond it. Returns the evicted ids.
    pub fn note_batch(&mut self, batch_len: usize) -> Vec<String> {
        self.capacity = self.capacity.max(batch_len * CAPACITY_PER_BATCH_ENTRY);
        let mut evicted = Vec::new();
        while self.parked.len() > self.capacity {
            let Some(id) = self.order.pop_front() else {
                break;
            };
            self.parked.remove(&id);
            evicted.push(id);
        }
        evicted
    }
}
