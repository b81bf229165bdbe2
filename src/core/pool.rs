//! Fixed-capacity cell pool.
//!
//! Slots live in an arena and never move between rows; a row is a ring of
//! slot ids and the pool is a ring of row ids. Scrolling rotates the rings
//! and relabels the rotated slots, so nothing is ever allocated after
//! [`CellPool::build`].
//!
//! Frozen rows sit at the front of the row ring and leading slots at the
//! front of every slot ring. Rotation picks the first/last *non-frozen*
//! entry, so frozen ones keep their positions forever. Frozen slots are
//! labelled once, by `build`, with their grid position; nothing relabels
//! them afterwards.

use std::collections::{HashMap, VecDeque};

use super::coord::Coord;
use super::frozen::FrozenRegion;

pub type SlotId = usize;
pub type RowId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentState {
    #[default]
    Empty,
    /// Requested in a dispatched batch.
    Pending,
    Filled,
}

/// One materialized cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub coord: Coord,
    /// Belongs to a header row; the label never changes.
    pub header: bool,
    /// Belongs to a leading column; the label never changes.
    pub leading: bool,
    pub state: ContentState,
}

impl Slot {
    pub fn is_frozen(&self) -> bool {
        self.header || self.leading
    }
}

/// A horizontal band of slots.
#[derive(Debug, Clone)]
pub struct Row {
    /// Label shared by the row's scrollable slots. Leading slots keep the
    /// label they were built with.
    pub y: i64,
    pub frozen: bool,
    /// Slot ids in on-screen order, leading slots first.
    pub slots: VecDeque<SlotId>,
}

#[derive(Debug, Clone)]
pub struct CellPool {
    slots: Vec<Slot>,
    rows: Vec<Row>,
    /// Row ids in on-screen order, header rows first.
    order: VecDeque<RowId>,
    scrollable: HashMap<Coord, SlotId>,
    frozen: HashMap<Coord, SlotId>,
    frozen_rows: usize,
    frozen_columns: usize,
    width: usize,
}

impl CellPool {
    /// Allocate `width × height` slots. Frozen slots get their permanent
    /// labels: slot `c` of the row at position `r` is `(c, r)`. Scrollable
    /// labels are meaningless until the first
    /// [`relabel_all`](Self::relabel_all).
    pub fn build(width: usize, height: usize, frozen_rows: usize, frozen_columns: usize) -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(width * height),
            rows: Vec::with_capacity(height),
            order: (0..height).collect(),
            scrollable: HashMap::with_capacity(width * height),
            frozen: HashMap::new(),
            frozen_rows,
            frozen_columns,
            width,
        };
        for r in 0..height {
            let header = r < frozen_rows;
            for c in 0..width {
                let leading = c < frozen_columns;
                let coord = if header || leading {
                    Coord::new(c as i64, r as i64)
                } else {
                    Coord::default()
                };
                pool.slots.push(Slot {
                    coord,
                    header,
                    leading,
                    state: ContentState::Empty,
                });
                if header || leading {
                    pool.frozen.insert(coord, r * width + c);
                }
            }
            pool.rows.push(Row {
                y: r as i64,
                frozen: header,
                slots: (r * width..(r + 1) * width).collect(),
            });
        }
        pool
    }

    // ───────────────────────────────────────── relabelling ───

    /// Label the scrollable part of the pool for a window whose first
    /// scrollable column and row have sequence numbers `start_x` /
    /// `start_y`. Relabelled slots are reset to empty and returned in
    /// on-screen order; frozen slots are left alone.
    pub fn relabel_all(&mut self, start_x: i64, start_y: i64, frozen: &FrozenRegion) -> Vec<SlotId> {
        self.scrollable.clear();
        let mut out = Vec::with_capacity(self.slots.len());
        let mut seq_y = start_y;
        for pos in 0..self.order.len() {
            let row_id = self.order[pos];
            if self.rows[row_id].frozen {
                continue;
            }
            let y = frozen.label_y(seq_y);
            seq_y += 1;
            self.rows[row_id].y = y;

            let mut seq_x = start_x;
            for i in 0..self.rows[row_id].slots.len() {
                let slot_id = self.rows[row_id].slots[i];
                if self.slots[slot_id].leading {
                    continue;
                }
                let slot = &mut self.slots[slot_id];
                slot.coord = Coord::new(frozen.label_x(seq_x), y);
                slot.state = ContentState::Empty;
                seq_x += 1;
                self.index(slot_id);
                out.push(slot_id);
            }
        }
        out
    }

    /// Move the first scrollable row to the end. Returns the relabelled
    /// slots; the row's leading slots ride along unchanged.
    pub fn shift_rows_forward(&mut self, frozen: &FrozenRegion) -> Vec<SlotId> {
        let (Some(first), Some(last)) = (self.first_rotating_row(), self.last_rotating_row()) else {
            return Vec::new();
        };
        let last_y = self.rows[self.order[last]].y;
        let Some(row_id) = self.order.remove(first) else {
            return Vec::new();
        };
        self.order.push_back(row_id);
        self.relabel_row(row_id, frozen.next_y_forward(last_y))
    }

    /// Move the last scrollable row in front of the first one.
    pub fn shift_rows_backward(&mut self, frozen: &FrozenRegion) -> Vec<SlotId> {
        let (Some(first), Some(last)) = (self.first_rotating_row(), self.last_rotating_row()) else {
            return Vec::new();
        };
        let first_y = self.rows[self.order[first]].y;
        let Some(row_id) = self.order.remove(last) else {
            return Vec::new();
        };
        self.order.insert(first, row_id);
        self.relabel_row(row_id, frozen.next_y_backward(first_y))
    }

    /// Move the first scrollable slot of every scrollable row to the end
    /// of that row. Header rows are frozen and never rotate. Returns the
    /// recycled slots.
    pub fn shift_columns_forward(&mut self, frozen: &FrozenRegion) -> Vec<SlotId> {
        let mut moved = Vec::with_capacity(self.rows.len());
        for row_id in 0..self.rows.len() {
            if self.rows[row_id].frozen {
                continue;
            }
            let (Some(first), Some(last)) =
                (self.first_rotating_slot(row_id), self.last_rotating_slot(row_id))
            else {
                continue;
            };
            let row = &mut self.rows[row_id];
            let last_x = self.slots[row.slots[last]].coord.x;
            let Some(slot_id) = row.slots.remove(first) else {
                continue;
            };
            row.slots.push_back(slot_id);
            let y = row.y;
            self.relabel(slot_id, Coord::new(frozen.next_x_forward(last_x), y));
            moved.push(slot_id);
        }
        moved
    }

    /// Move the last scrollable slot of every scrollable row in front of
    /// the first one.
    pub fn shift_columns_backward(&mut self, frozen: &FrozenRegion) -> Vec<SlotId> {
        let mut moved = Vec::with_capacity(self.rows.len());
        for row_id in 0..self.rows.len() {
            if self.rows[row_id].frozen {
                continue;
            }
            let (Some(first), Some(last)) =
                (self.first_rotating_slot(row_id), self.last_rotating_slot(row_id))
            else {
                continue;
            };
            let row = &mut self.rows[row_id];
            let first_x = self.slots[row.slots[first]].coord.x;
            let Some(slot_id) = row.slots.remove(last) else {
                continue;
            };
            row.slots.insert(first, slot_id);
            let y = row.y;
            self.relabel(slot_id, Coord::new(frozen.next_x_backward(first_x), y));
            moved.push(slot_id);
        }
        moved
    }

    fn relabel_row(&mut self, row_id: RowId, y: i64) -> Vec<SlotId> {
        self.rows[row_id].y = y;
        let mut moved = Vec::with_capacity(self.width);
        for i in 0..self.rows[row_id].slots.len() {
            let slot_id = self.rows[row_id].slots[i];
            if self.slots[slot_id].leading {
                continue;
            }
            let x = self.slots[slot_id].coord.x;
            self.relabel(slot_id, Coord::new(x, y));
            moved.push(slot_id);
        }
        moved
    }

    fn relabel(&mut self, slot_id: SlotId, coord: Coord) {
        self.unindex(slot_id);
        let slot = &mut self.slots[slot_id];
        slot.coord = coord;
        slot.state = ContentState::Empty;
        self.index(slot_id);
    }

    fn index(&mut self, slot_id: SlotId) {
        self.scrollable.insert(self.slots[slot_id].coord, slot_id);
    }

    fn unindex(&mut self, slot_id: SlotId) {
        let coord = self.slots[slot_id].coord;
        if self.scrollable.get(&coord) == Some(&slot_id) {
            self.scrollable.remove(&coord);
        }
    }

    fn first_rotating_row(&self) -> Option<usize> {
        self.order.iter().position(|&r| !self.rows[r].frozen)
    }

    fn last_rotating_row(&self) -> Option<usize> {
        self.order.iter().rposition(|&r| !self.rows[r].frozen)
    }

    fn first_rotating_slot(&self, row_id: RowId) -> Option<usize> {
        self.rows[row_id]
            .slots
            .iter()
            .position(|&s| !self.slots[s].leading)
    }

    fn last_rotating_slot(&self, row_id: RowId) -> Option<usize> {
        self.rows[row_id]
            .slots
            .iter()
            .rposition(|&s| !self.slots[s].leading)
    }

    // ───────────────────────────────────────── lookup ────────

    /// Live slot labelled `coord`, scrollable region first.
    pub fn find(&self, coord: Coord) -> Option<SlotId> {
        self.scrollable
            .get(&coord)
            .or_else(|| self.frozen.get(&coord))
            .copied()
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn set_state(&mut self, id: SlotId, state: ContentState) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.state = state;
        }
    }

    pub fn row(&self, id: RowId) -> &Row {
        &self.rows[id]
    }

    /// Rows in on-screen order.
    pub fn rows_in_order(&self) -> impl Iterator<Item = &Row> {
        self.order.iter().map(|&r| &self.rows[r])
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn frozen_rows(&self) -> usize {
        self.frozen_rows
    }

    pub fn frozen_columns(&self) -> usize {
        self.frozen_columns
    }

    /// Ids of the frozen slots, in arena order.
    pub fn frozen_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        (0..self.slots.len()).filter(|&id| self.slots[id].is_frozen())
    }

    /// Labels of every slot, in arena order.
    pub fn coordinates(&self) -> Vec<Coord> {
        self.slots.iter().map(|s| s.coord).collect()
    }
}
