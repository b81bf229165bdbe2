//! Frozen region: header rows and leading columns pinned to the left edge
//! of the viewport.
//!
//! Header rows own `y ∈ [0, rows)` and leading columns own
//! `x ∈ [0, columns)`. The scrollable space is labelled past them, so the
//! two coordinate spaces never overlap: a rotation that would land inside a
//! frozen range jumps over it.
//!
//! Frozen slots keep the labels the pool was built with. Scrolling only
//! moves them sideways: they follow the horizontal scroll offset and
//! ignore the vertical one.

use super::dimensions::Dimensions;
use super::pool::{CellPool, Slot};
use super::surface::RenderSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrozenRegion {
    rows: i64,
    columns: i64,
    cell_width: i64,
    cell_height: i64,
}

impl FrozenRegion {
    pub fn new(dims: &Dimensions) -> Self {
        Self {
            rows: i64::from(dims.frozen_rows()),
            columns: i64::from(dims.frozen_columns()),
            cell_width: i64::from(dims.cell_width()),
            cell_height: i64::from(dims.cell_height()),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn columns(&self) -> usize {
        self.columns as usize
    }

    pub fn is_header_row(&self, y: i64) -> bool {
        (0..self.rows).contains(&y)
    }

    pub fn is_leading_column(&self, x: i64) -> bool {
        (0..self.columns).contains(&x)
    }

    // ───────────────────────────────────────── labels ────────

    /// Logical y of the `seq`-th scrollable row. Negative sequence numbers
    /// (buffer above the grid) keep their value.
    pub fn label_y(&self, seq: i64) -> i64 {
        if seq < 0 {
            seq
        } else {
            seq + self.rows
        }
    }

    /// Logical x of the `seq`-th scrollable column.
    pub fn label_x(&self, seq: i64) -> i64 {
        if seq < 0 {
            seq
        } else {
            seq + self.columns
        }
    }

    /// Label for a row appended after `last_y`.
    pub fn next_y_forward(&self, last_y: i64) -> i64 {
        skip_forward(last_y + 1, self.rows)
    }

    /// Label for a row prepended before `first_y`.
    pub fn next_y_backward(&self, first_y: i64) -> i64 {
        skip_backward(first_y - 1, self.rows)
    }

    pub fn next_x_forward(&self, last_x: i64) -> i64 {
        skip_forward(last_x + 1, self.columns)
    }

    pub fn next_x_backward(&self, first_x: i64) -> i64 {
        skip_backward(first_x - 1, self.columns)
    }

    // ───────────────────────────────────────── offsets ───────

    /// On-surface `(left, top)` of a slot: `coordinate × cell size`, plus
    /// the horizontal scroll offset for frozen slots.
    pub fn offset(&self, slot: &Slot, scroll_left: u64) -> (i64, i64) {
        let mut left = slot.coord.x.saturating_mul(self.cell_width);
        let top = slot.coord.y.saturating_mul(self.cell_height);
        if slot.is_frozen() {
            left = left.saturating_add(to_signed(scroll_left));
        }
        (left, top)
    }

    /// Move every frozen slot to follow the horizontal scroll offset.
    pub fn reposition<S: RenderSurface>(&self, pool: &CellPool, surface: &mut S, scroll_left: u64) {
        for slot_id in pool.frozen_slots() {
            let (left, top) = self.offset(pool.slot(slot_id), scroll_left);
            surface.set_offset(slot_id, left, top);
        }
    }
}

fn skip_forward(value: i64, frozen: i64) -> i64 {
    if (0..frozen).contains(&value) {
        value + frozen
    } else {
        value
    }
}

fn skip_backward(value: i64, frozen: i64) -> i64 {
    if (0..frozen).contains(&value) {
        value - frozen
    } else {
        value
    }
}

fn to_signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
