//! Content fetch coordinator: batching, the concurrency cap, delivery
//! application and overflow detection.
//!
//! Every dispatched batch gets a [`BatchId`]. The coordinator knows which
//! ids are outstanding, so a delivery it cannot account for is detected
//! exactly instead of by counter arithmetic. An overflow reset bumps the
//! epoch; deliveries from an older epoch are applied but never counted.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::coord::Coord;
use super::dimensions::RenderingMode;
use super::pool::{CellPool, ContentState};
use super::storage::ResourceStorage;
use super::store::Delivery;
use super::surface::{RenderSurface, SlotContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId {
    pub epoch: u64,
    pub seq: u64,
}

/// A batch handed to the host for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchBatch {
    pub id: BatchId,
    pub coords: Vec<Coord>,
}

impl FetchBatch {
    /// Wire keys for [`ContentStore::get_content`](super::store::ContentStore::get_content).
    pub fn keys(&self) -> Vec<String> {
        self.coords.iter().map(|c| c.key()).collect()
    }
}

/// Work the engine asks the host to perform against the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    Fetch(FetchBatch),
    Release(String),
    /// Release every cached resource.
    Reset,
}

/// How a delivery was accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Outstanding batch of the current epoch.
    Counted,
    /// Batch from before the last reset.
    Stale,
    /// Bookkeeping is off; the window must be resynced.
    Overflow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub dispatched: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub stale: u64,
    pub overflows: u64,
}

/// Result of applying one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub settlement: Settlement,
    /// Entries materialized into a live slot.
    pub applied: usize,
    /// Entries with content but no live slot.
    pub missed: usize,
    /// Release hints issued (lookup misses plus evictions).
    pub released: usize,
}

#[derive(Debug)]
pub struct FetchCoordinator {
    allowed: usize,
    outstanding: HashSet<u64>,
    epoch: u64,
    next_seq: u64,
    stats: FetchStats,
}

impl FetchCoordinator {
    pub fn new(requests_allowed: usize) -> Self {
        Self {
            allowed: requests_allowed,
            outstanding: HashSet::new(),
            epoch: 0,
            next_seq: 0,
            stats: FetchStats::default(),
        }
    }

    pub fn in_progress(&self) -> usize {
        self.outstanding.len()
    }

    pub fn allowed(&self) -> usize {
        self.allowed
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Lowering the cap below the outstanding count makes the next counted
    /// delivery overflow.
    pub fn set_requests_allowed(&mut self, allowed: usize) {
        self.allowed = allowed;
    }

    /// Queue a batch unless the cap is reached. An empty batch is a no-op.
    /// Returns the id of the dispatched batch; a dropped batch returns
    /// `None` and is not retried.
    pub fn fetch_from_server(
        &mut self,
        coords: Vec<Coord>,
        commands: &mut Vec<StoreCommand>,
    ) -> Option<BatchId> {
        if coords.is_empty() {
            return None;
        }
        if self.outstanding.len() >= self.allowed {
            self.stats.dropped += 1;
            debug!(
                len = coords.len(),
                in_progress = self.outstanding.len(),
                allowed = self.allowed,
                "fetch batch dropped"
            );
            return None;
        }
        let id = BatchId {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.outstanding.insert(id.seq);
        self.stats.dispatched += 1;
        debug!(seq = id.seq, len = coords.len(), "fetch batch dispatched");
        commands.push(StoreCommand::Fetch(FetchBatch { id, coords }));
        Some(id)
    }

    /// Account for a delivery of `batch`.
    pub fn settle(&mut self, batch: BatchId) -> Settlement {
        if batch.epoch != self.epoch {
            self.stats.stale += 1;
            return Settlement::Stale;
        }
        if self.outstanding.len() > self.allowed || !self.outstanding.remove(&batch.seq) {
            self.stats.overflows += 1;
            warn!(
                seq = batch.seq,
                in_progress = self.outstanding.len(),
                allowed = self.allowed,
                "fetch bookkeeping overflow"
            );
            return Settlement::Overflow;
        }
        self.stats.delivered += 1;
        Settlement::Counted
    }

    /// Forget every outstanding batch and start a new epoch.
    pub fn reset(&mut self) {
        self.outstanding.clear();
        self.epoch += 1;
        self.next_seq = 0;
    }

    /// Settle a delivery and, unless it overflowed, apply it.
    ///
    /// Resources are parked first so entries can claim them. Each entry is
    /// matched to a live slot by coordinate; a null-content entry with no
    /// live slot releases its resource.
    #[allow(clippy::too_many_arguments)]
    pub fn on_delivered<S: RenderSurface>(
        &mut self,
        pool: &mut CellPool,
        surface: &mut S,
        storage: &mut ResourceStorage,
        commands: &mut Vec<StoreCommand>,
        mode: RenderingMode,
        batch: BatchId,
        delivery: Delivery,
    ) -> DeliveryOutcome {
        let settlement = self.settle(batch);
        let mut outcome = DeliveryOutcome {
            settlement,
            applied: 0,
            missed: 0,
            released: 0,
        };
        if settlement == Settlement::Overflow {
            return outcome;
        }

        for resource in delivery.resources {
            storage.park(resource);
        }
        for id in storage.note_batch(delivery.entries.len()) {
            debug!(%id, "resource evicted");
            commands.push(StoreCommand::Release(id));
            outcome.released += 1;
        }

        for mut entry in delivery.entries {
            let coord = entry.coord();
            match (pool.find(coord), entry.content.take()) {
                (Some(slot), Some(content)) => {
                    surface.clear_content(slot);
                    surface.set_content(slot, SlotContent::materialize(mode, content, coord));
                    pool.set_state(slot, ContentState::Filled);
                    outcome.applied += 1;
                }
                (Some(slot), None) => {
                    let key = entry.storage_key();
                    surface.clear_content(slot);
                    match storage.take(&key) {
                        Some(resource) => {
                            surface.set_content(slot, SlotContent::Resource(resource));
                            pool.set_state(slot, ContentState::Filled);
                            outcome.applied += 1;
                        }
                        None => {
                            trace!(%coord, %key, "no stored resource");
                            pool.set_state(slot, ContentState::Empty);
                        }
                    }
                }
                (None, None) => {
                    let key = entry.storage_key();
                    trace!(%coord, %key, "stale resource released");
                    storage.discard(&key);
                    commands.push(StoreCommand::Release(key));
                    outcome.released += 1;
                }
                (None, Some(_)) => {
                    trace!(%coord, "no live slot for delivered content");
                    outcome.missed += 1;
                }
            }
        }
        outcome
    }
}
