//! The grid engine: owns the window and is the only way to drive it.
//!
//! Host input never mutates the window directly. `on_scroll`,
//! `on_delivered` and `request_resync` queue tasks; `tick` runs them. The
//! engine never talks to the backing store either: it queues
//! [`StoreCommand`]s for the host to drain and execute.

use tracing::{debug, info};

use super::dimensions::GridSettings;
use super::fetch::{BatchId, FetchCoordinator, FetchStats, Settlement, StoreCommand};
use super::frozen::FrozenRegion;
use super::pool::{CellPool, ContentState, SlotId};
use super::storage::ResourceStorage;
use super::store::Delivery;
use super::surface::RenderSurface;
use super::tick::{Task, TickQueue};
use super::viewport::Viewport;
use crate::error::ConfigError;

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    /// Scroll tasks processed (after coalescing).
    pub scrolls: u64,
    pub row_shifts: u64,
    pub column_shifts: u64,
    pub rebuilds: u64,
    /// Pool allocations (construction, resize, reconfigure).
    pub reallocations: u64,
    pub resyncs: u64,
}

/// What one [`GridEngine::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub scrolls: usize,
    pub deliveries: usize,
    /// Entries materialized into live slots.
    pub applied: usize,
    pub resyncs: usize,
    pub overflowed: bool,
    pub rebuilt: bool,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.scrolls == 0 && self.deliveries == 0 && self.resyncs == 0
    }
}

pub struct GridEngine<S: RenderSurface> {
    settings: GridSettings,
    viewport: Viewport,
    frozen: FrozenRegion,
    pool: CellPool,
    fetch: FetchCoordinator,
    storage: ResourceStorage,
    queue: TickQueue,
    surface: S,
    commands: Vec<StoreCommand>,
    /// Scroll offset of the last processed scroll task.
    scroll: (u64, u64),
    stats: EngineStats,
}

impl<S: RenderSurface> GridEngine<S> {
    /// Build the pool for the given surface size and queue the first batch
    /// for the window at the origin.
    pub fn new(settings: GridSettings, surface: S, surface_width: u32, surface_height: u32) -> Self {
        let frozen = FrozenRegion::new(settings.dimensions());
        let mut engine = Self {
            viewport: Viewport::new(&settings, surface_width, surface_height),
            pool: CellPool::build(0, 0, frozen.rows(), frozen.columns()),
            fetch: FetchCoordinator::new(settings.requests_allowed()),
            storage: ResourceStorage::new(),
            queue: TickQueue::new(),
            commands: Vec::new(),
            scroll: (0, 0),
            stats: EngineStats::default(),
            settings,
            frozen,
            surface,
        };
        engine.allocate();
        engine.rebuild_window(true);
        engine
    }

    // ───────────────────────────────────────── host input ────

    /// Queue a scroll to `(x, y)` in surface units. Bursts coalesce.
    pub fn on_scroll(&mut self, x: u64, y: u64) {
        self.queue.schedule_scroll(x, y);
    }

    /// Queue a delivery for the next tick.
    pub fn on_delivered(&mut self, batch: BatchId, delivery: Delivery) {
        self.queue.schedule_delivery(batch, delivery);
    }

    /// Queue a full resync: in-flight state and cached resources are
    /// dropped and the whole window is refetched.
    pub fn request_resync(&mut self) {
        self.queue.schedule_resync();
    }

    /// Run every queued task in order.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.stats.ticks += 1;
        while let Some(task) = self.queue.pop() {
            match task {
                Task::Scroll => {
                    if let Some((x, y)) = self.queue.take_scroll() {
                        report.scrolls += 1;
                        report.rebuilt |= self.process_scroll(x, y);
                    }
                }
                Task::Deliver { batch, delivery } => {
                    report.deliveries += 1;
                    let outcome = self.fetch.on_delivered(
                        &mut self.pool,
                        &mut self.surface,
                        &mut self.storage,
                        &mut self.commands,
                        self.settings.rendering_mode(),
                        batch,
                        delivery,
                    );
                    report.applied += outcome.applied;
                    if outcome.settlement == Settlement::Overflow {
                        report.overflowed = true;
                        report.rebuilt = true;
                        self.resync();
                    }
                }
                Task::Resync => {
                    info!("resync requested");
                    report.resyncs += 1;
                    report.rebuilt = true;
                    self.stats.resyncs += 1;
                    self.resync();
                }
            }
        }
        report
    }

    /// Track a new surface size. Reallocates and rebuilds when the window
    /// size changed; returns whether it did.
    pub fn resize(&mut self, surface_width: u32, surface_height: u32) -> bool {
        if !self.viewport.resize(surface_width, surface_height) {
            self.reposition_frozen();
            return false;
        }
        info!(
            width = surface_width,
            height = surface_height,
            max_x = self.viewport.max_x(),
            max_y = self.viewport.max_y(),
            "window resized"
        );
        self.allocate();
        self.rebuild_window(true);
        true
    }

    /// Switch to new settings, keeping the scroll offset.
    pub fn reconfigure(&mut self, settings: GridSettings) {
        info!(?settings, "reconfiguring grid");
        let (width, height) = self.viewport.surface_size();
        let mut viewport = Viewport::new(&settings, width, height);
        let (cx, cy) = viewport.scroll_cell(self.scroll.0, self.scroll.1);
        viewport.set_position(cx, cy);
        self.viewport = viewport;
        self.frozen = FrozenRegion::new(settings.dimensions());
        self.fetch.set_requests_allowed(settings.requests_allowed());
        self.settings = settings;
        self.allocate();
        self.rebuild_window(true);
    }

    /// Relabel the window at the current position and request all of it,
    /// frozen cells included.
    pub fn rebuild(&mut self) {
        self.rebuild_window(true);
    }

    /// Change the concurrency cap at runtime.
    pub fn set_requests_allowed(&mut self, allowed: usize) -> Result<(), ConfigError> {
        let s = &self.settings;
        self.settings = GridSettings::new(
            *s.dimensions(),
            s.buffer_x(),
            s.buffer_y(),
            s.rendering_mode(),
            allowed,
        )?;
        self.fetch.set_requests_allowed(allowed);
        Ok(())
    }

    /// Hand queued store commands to the host.
    pub fn drain_commands(&mut self) -> Vec<StoreCommand> {
        std::mem::take(&mut self.commands)
    }

    // ───────────────────────────────────────── internals ─────

    /// Returns `true` when the scroll caused a full rebuild.
    fn process_scroll(&mut self, x: u64, y: u64) -> bool {
        self.scroll = (x, y);
        self.stats.scrolls += 1;
        let (dx, dy) = self.viewport.compute_delta(x, y);
        if dx == 0 && dy == 0 {
            self.reposition_frozen();
            return false;
        }
        if self.viewport.should_full_rebuild(dx, dy) {
            self.rebuild_window(false);
            return true;
        }

        let mut moved: Vec<SlotId> = Vec::new();
        for _ in 0..dy.unsigned_abs() {
            let slots = if dy > 0 {
                self.pool.shift_rows_forward(&self.frozen)
            } else {
                self.pool.shift_rows_backward(&self.frozen)
            };
            moved.extend(slots);
        }
        for _ in 0..dx.unsigned_abs() {
            let slots = if dx > 0 {
                self.pool.shift_columns_forward(&self.frozen)
            } else {
                self.pool.shift_columns_backward(&self.frozen)
            };
            moved.extend(slots);
        }
        self.stats.row_shifts += dy.unsigned_abs();
        self.stats.column_shifts += dx.unsigned_abs();

        // A slot hit by both rotations is requested once, with its final label.
        moved.sort_unstable();
        moved.dedup();
        moved.retain(|&id| !self.pool.slot(id).is_frozen());
        debug!(dx, dy, slots = moved.len(), "window shifted");
        self.refresh(&moved);
        false
    }

    fn resync(&mut self) {
        debug!(epoch = self.fetch.epoch(), "dropping in-flight state");
        self.fetch.reset();
        self.commands.push(StoreCommand::Reset);
        self.storage.clear();
        self.rebuild_window(true);
    }

    /// Drop the pool and its elements and allocate one for the current
    /// window size.
    fn allocate(&mut self) {
        for id in 0..self.pool.len() {
            self.surface.remove_element(id);
        }
        self.pool = CellPool::build(
            self.viewport.max_x(),
            self.viewport.max_y(),
            self.frozen.rows(),
            self.frozen.columns(),
        );
        let dims = self.settings.dimensions();
        for id in 0..self.pool.len() {
            self.surface
                .create_element(id, dims.cell_width(), dims.cell_height());
        }
        let (extent_x, extent_y) = dims.extent();
        self.surface.set_extent(extent_x, extent_y);
        self.stats.reallocations += 1;
        debug!(
            width = self.pool.width(),
            height = self.pool.height(),
            "pool allocated"
        );
    }

    /// Relabel the scrollable slots for the current position and request
    /// them. Frozen slots keep their labels; they are requested again only
    /// when `with_frozen` is set.
    fn rebuild_window(&mut self, with_frozen: bool) {
        let (start_x, start_y) = self.viewport.window_start();
        let mut slots = self.pool.relabel_all(start_x, start_y, &self.frozen);
        if with_frozen {
            slots.extend(self.pool.frozen_slots());
        }
        self.stats.rebuilds += 1;
        debug!(start_x, start_y, slots = slots.len(), "full rebuild");
        self.refresh(&slots);
    }

    /// Clear and re-place the given slots, request the in-bounds ones in
    /// one batch, and re-pin the frozen region.
    fn refresh(&mut self, slots: &[SlotId]) {
        let (scroll_left, _) = self.scroll;
        let dims = *self.settings.dimensions();
        let mut wanted = Vec::with_capacity(slots.len());
        for &id in slots {
            let slot = self.pool.slot(id);
            let (left, top) = self.frozen.offset(slot, scroll_left);
            let coord = slot.coord;
            self.pool.set_state(id, ContentState::Empty);
            self.surface.clear_content(id);
            self.surface.set_offset(id, left, top);
            if dims.contains(coord) {
                wanted.push(id);
            }
        }
        let coords = wanted.iter().map(|&id| self.pool.slot(id).coord).collect();
        if self
            .fetch
            .fetch_from_server(coords, &mut self.commands)
            .is_some()
        {
            for id in wanted {
                self.pool.set_state(id, ContentState::Pending);
            }
        }
        self.reposition_frozen();
    }

    fn reposition_frozen(&mut self) {
        let (scroll_left, _) = self.scroll;
        self.frozen
            .reposition(&self.pool, &mut self.surface, scroll_left);
    }

    // ───────────────────────────────────────── accessors ─────

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn pool(&self) -> &CellPool {
        &self.pool
    }

    pub fn frozen(&self) -> &FrozenRegion {
        &self.frozen
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn storage(&self) -> &ResourceStorage {
        &self.storage
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn fetch_stats(&self) -> FetchStats {
        self.fetch.stats()
    }

    pub fn in_progress(&self) -> usize {
        self.fetch.in_progress()
    }

    pub fn requests_allowed(&self) -> usize {
        self.fetch.allowed()
    }

    /// Scroll offset of the last processed scroll.
    pub fn scroll_offset(&self) -> (u64, u64) {
        self.scroll
    }

    /// Largest useful scroll offset for the current surface size.
    pub fn max_scroll(&self) -> (u64, u64) {
        let (extent_x, extent_y) = self.settings.dimensions().extent();
        let (width, height) = self.viewport.surface_size();
        (
            extent_x.saturating_sub(u64::from(width)),
            extent_y.saturating_sub(u64::from(height)),
        )
    }

    pub fn has_pending_tasks(&self) -> bool {
        !self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coord::Coord;
    use crate::core::dimensions::{Dimensions, RenderingMode};
    use crate::core::fetch::FetchBatch;
    use crate::core::store::ContentEntry;
    use crate::core::surface::{MemorySurface, SlotContent};

    fn engine(frozen: u32) -> GridEngine<MemorySurface> {
        let dims = Dimensions::new(10, 10, 100, 100, frozen, frozen).unwrap();
        let settings = GridSettings::new(dims, 1, 2, RenderingMode::PlainText, 2).unwrap();
        GridEngine::new(settings, MemorySurface::new(), 40, 40)
    }

    fn fetches(cmds: Vec<StoreCommand>) -> Vec<FetchBatch> {
        cmds.into_iter()
            .filter_map(|c| match c {
                StoreCommand::Fetch(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    fn fill(engine: &mut GridEngine<MemorySurface>, batch: &FetchBatch) {
        let entries = batch
            .coords
            .iter()
            .map(|c| ContentEntry::text(c.x, c.y, format!("({}, {})", c.x, c.y)))
            .collect();
        engine.on_delivered(
            batch.id,
            Delivery {
                entries,
                resources: Vec::new(),
            },
        );
    }

    #[test]
    fn construction_requests_window() {
        let mut e = engine(0);
        // 4 + 1 columns, 4 + 2 rows; first row at seq -1.
        assert_eq!(e.pool().len(), 30);
        assert_eq!(e.surface().len(), 30);
        let batches = fetches(e.drain_commands());
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].coords.len(), 25);
        assert_eq!(e.in_progress(), 1);
        assert_eq!(e.surface().extent(), (1000, 1000));
    }

    #[test]
    fn nothing_happens_until_tick() {
        let mut e = engine(0);
        let batch = fetches(e.drain_commands()).remove(0);
        fill(&mut e, &batch);
        e.on_scroll(0, 10);
        let slot = e.pool().find(Coord::new(0, 0)).unwrap();
        assert_eq!(e.pool().slot(slot).state, ContentState::Pending);
        assert!(e.has_pending_tasks());

        let report = e.tick();
        assert_eq!((report.deliveries, report.scrolls), (1, 1));
        assert_eq!(report.applied, 25);
        assert!(!e.has_pending_tasks());
    }

    #[test]
    fn scroll_within_a_cell_only_repins() {
        let mut e = engine(1);
        e.drain_commands();
        e.on_scroll(5, 5);
        let report = e.tick();
        assert_eq!(report.scrolls, 1);
        assert!(e.drain_commands().is_empty());
        let corner = e.pool().find(Coord::new(0, 0)).unwrap();
        let el = e.surface().element(corner).unwrap();
        assert_eq!((el.left, el.top), (5, 0));
    }

    #[test]
    fn scrolling_never_requests_or_relabels_frozen_cells() {
        let mut e = engine(1);
        let first = fetches(e.drain_commands()).remove(0);
        fill(&mut e, &first);
        let pinned: Vec<_> = e.pool().frozen_slots().map(|id| (id, e.pool().slot(id).coord)).collect();
        // Header row plus one leading slot per scrollable row.
        assert_eq!(pinned.len(), 5 + 5);

        e.on_scroll(0, 10);
        e.tick();
        let batch = fetches(e.drain_commands()).remove(0);
        let expected: Vec<_> = (1..5).map(|x| Coord::new(x, 5)).collect();
        assert_eq!(batch.coords, expected);

        e.on_scroll(10, 500);
        e.tick();
        assert_eq!(e.stats().rebuilds, 2);
        let batch = fetches(e.drain_commands()).remove(0);
        assert_eq!(batch.coords.len(), 5 * 4);
        assert!(batch.coords.iter().all(|c| c.x >= 1 && c.y >= 1));

        for (id, coord) in pinned {
            assert_eq!(e.pool().slot(id).coord, coord);
        }
    }

    #[test]
    fn explicit_rebuild_requests_frozen_cells_again() {
        let mut e = engine(1);
        let first = fetches(e.drain_commands()).remove(0);
        fill(&mut e, &first);
        e.tick();
        e.rebuild();
        let batch = fetches(e.drain_commands()).remove(0);
        assert!(batch.coords.contains(&Coord::new(0, 0)));
        assert!(batch.coords.contains(&Coord::new(3, 0)));
        assert!(batch.coords.contains(&Coord::new(0, 5)));
        let corner = e.pool().find(Coord::new(0, 0)).unwrap();
        assert_eq!(e.pool().slot(corner).state, ContentState::Pending);
    }

    #[test]
    fn delivered_text_lands_on_surface() {
        let mut e = engine(0);
        let batch = fetches(e.drain_commands()).remove(0);
        fill(&mut e, &batch);
        e.tick();
        let slot = e.pool().find(Coord::new(2, 3)).unwrap();
        assert_eq!(e.pool().slot(slot).state, ContentState::Filled);
        assert_eq!(
            e.surface().element(slot).unwrap().content,
            Some(SlotContent::Text("(2, 3)".into()))
        );
        assert_eq!(e.in_progress(), 0);
    }

    #[test]
    fn requests_allowed_rejects_zero() {
        let mut e = engine(0);
        assert!(e.set_requests_allowed(0).is_err());
        assert_eq!(e.requests_allowed(), 2);
        e.set_requests_allowed(3).unwrap();
        assert_eq!(e.requests_allowed(), 3);
        assert_eq!(e.settings().requests_allowed(), 3);
    }

    #[test]
    fn resize_reallocates_only_on_window_change() {
        let mut e = engine(0);
        e.drain_commands();
        assert!(!e.resize(35, 35));
        assert_eq!(e.stats().reallocations, 1);
        assert!(e.resize(80, 40));
        assert_eq!(e.stats().reallocations, 2);
        assert_eq!(e.pool().len(), 9 * 6);
        assert_eq!(e.surface().len(), 54);
    }

    #[test]
    fn max_scroll_is_extent_minus_surface() {
        let e = engine(0);
        assert_eq!(e.max_scroll(), (960, 960));
    }
}
