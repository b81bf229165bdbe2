//! Viewport model: scroll position, window size and the shift-vs-rebuild
//! decision.
//!
//! All positions are in surface units (pixels in a browser, terminal cells
//! in the demo). The model only ever deals in whole grid cells: a scroll
//! offset is floored to the cell it falls in.

use super::dimensions::GridSettings;

/// Current window position and size.
#[derive(Debug, Clone)]
pub struct Viewport {
    cell_width: u32,
    cell_height: u32,
    buffer_x: u32,
    buffer_y: u32,
    /// Smallest window that still leaves one rotating column / row.
    min_x: usize,
    min_y: usize,
    surface_width: u32,
    surface_height: u32,
    /// Scroll-cell position recorded by the last delta / rebuild.
    pre_pos_x: i64,
    pre_pos_y: i64,
    max_x: usize,
    max_y: usize,
}

impl Viewport {
    pub fn new(settings: &GridSettings, surface_width: u32, surface_height: u32) -> Self {
        let dims = settings.dimensions();
        let mut viewport = Self {
            cell_width: dims.cell_width(),
            cell_height: dims.cell_height(),
            buffer_x: settings.buffer_x(),
            buffer_y: settings.buffer_y(),
            min_x: dims.frozen_columns() as usize + 1,
            min_y: dims.frozen_rows() as usize + 1,
            surface_width,
            surface_height,
            pre_pos_x: 0,
            pre_pos_y: 0,
            max_x: 0,
            max_y: 0,
        };
        viewport.recompute();
        viewport
    }

    /// Track a new surface size. Returns `true` when the window size changed,
    /// which means the pool has to be rebuilt.
    pub fn resize(&mut self, surface_width: u32, surface_height: u32) -> bool {
        self.surface_width = surface_width;
        self.surface_height = surface_height;
        self.recompute()
    }

    fn recompute(&mut self) -> bool {
        let max_x = (self.visible_columns() + self.buffer_x as usize).max(self.min_x);
        let max_y = (self.visible_rows() + self.buffer_y as usize).max(self.min_y);
        let changed = max_x != self.max_x || max_y != self.max_y;
        self.max_x = max_x;
        self.max_y = max_y;
        changed
    }

    /// Columns needed to cover the surface (partially visible ones count).
    pub fn visible_columns(&self) -> usize {
        self.surface_width.div_ceil(self.cell_width) as usize
    }

    /// Rows needed to cover the surface (partially visible ones count).
    pub fn visible_rows(&self) -> usize {
        self.surface_height.div_ceil(self.cell_height) as usize
    }

    /// Window width in slots.
    pub fn max_x(&self) -> usize {
        self.max_x
    }

    /// Window height in slots.
    pub fn max_y(&self) -> usize {
        self.max_y
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_width, self.surface_height)
    }

    /// Cell containing a scroll offset.
    pub fn scroll_cell(&self, scroll_x: u64, scroll_y: u64) -> (i64, i64) {
        (
            (scroll_x / u64::from(self.cell_width)) as i64,
            (scroll_y / u64::from(self.cell_height)) as i64,
        )
    }

    /// Cell difference between the given scroll offset and the recorded
    /// position. Records the new position.
    pub fn compute_delta(&mut self, scroll_x: u64, scroll_y: u64) -> (i64, i64) {
        let (curr_x, curr_y) = self.scroll_cell(scroll_x, scroll_y);
        let change = (curr_x - self.pre_pos_x, curr_y - self.pre_pos_y);
        self.pre_pos_x = curr_x;
        self.pre_pos_y = curr_y;
        change
    }

    /// Past half a window the old and new windows barely overlap, so one
    /// rebuild is cheaper than shifting row by row.
    pub fn should_full_rebuild(&self, change_x: i64, change_y: i64) -> bool {
        let window_y = (self.visible_rows() + self.buffer_y as usize) as u64;
        let window_x = (self.visible_columns() + self.buffer_x as usize) as u64;
        change_y.unsigned_abs() * 2 > window_y || change_x.unsigned_abs() * 2 > window_x
    }

    /// Recorded scroll-cell position.
    pub fn position(&self) -> (i64, i64) {
        (self.pre_pos_x, self.pre_pos_y)
    }

    pub fn set_position(&mut self, x: i64, y: i64) {
        self.pre_pos_x = x;
        self.pre_pos_y = y;
    }

    /// Scrollable sequence index of the first rotating column and row: the
    /// buffer is split around the visible area.
    pub fn window_start(&self) -> (i64, i64) {
        (
            self.pre_pos_x - i64::from(self.buffer_x / 2),
            self.pre_pos_y - i64::from(self.buffer_y / 2),
        )
    }
}
