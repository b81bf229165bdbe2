//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::engine::GridEngine;
use crate::core::surface::MemorySurface;
use crate::ui::layout::AppLayout;

use super::store_runtime::StoreUpdate;

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Grid,
    Controls,
}

pub struct AppState {
    pub engine: GridEngine<MemorySurface>,
    pub config: AppConfig,
    /// Requested scroll offset in surface units. The engine catches up on
    /// the next tick.
    pub scroll_x: u64,
    pub scroll_y: u64,
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    pub active_view: ActiveView,
    /// Drives the fetch indicator animation.
    pub tick: u64,
}

impl AppState {
    pub fn new(engine: GridEngine<MemorySurface>, config: AppConfig) -> Self {
        Self {
            engine,
            config,
            scroll_x: 0,
            scroll_y: 0,
            should_quit: false,
            status_message: None,
            active_view: ActiveView::default(),
            tick: 0,
        }
    }

    /// Grid surface size (in terminal cells) for a terminal of `area`.
    pub fn surface_size(area: Rect) -> (u32, u32) {
        let grid = AppLayout::from_area(area).grid_inner();
        (u32::from(grid.width), u32::from(grid.height))
    }

    /// Scroll to an absolute offset, clamped to the grid.
    pub fn scroll_to(&mut self, x: u64, y: u64) {
        let (max_x, max_y) = self.engine.max_scroll();
        self.scroll_x = x.min(max_x);
        self.scroll_y = y.min(max_y);
        self.engine.on_scroll(self.scroll_x, self.scroll_y);
    }

    /// Scroll by whole cells.
    pub fn scroll_cells(&mut self, columns: i64, rows: i64) {
        let dims = *self.engine.settings().dimensions();
        let x = offset_by(self.scroll_x, columns, dims.cell_width());
        let y = offset_by(self.scroll_y, rows, dims.cell_height());
        self.scroll_to(x, y);
    }

    /// Scroll by one screen of rows.
    pub fn scroll_pages(&mut self, pages: i64) {
        let rows = self.engine.viewport().visible_rows().max(1);
        self.scroll_cells(0, pages * rows as i64);
    }

    pub fn jump_to_origin(&mut self) {
        self.scroll_to(0, 0);
    }

    pub fn jump_to_last_row(&mut self) {
        let (_, max_y) = self.engine.max_scroll();
        self.scroll_to(self.scroll_x, max_y);
    }

    pub fn resize(&mut self, area: Rect) {
        let (width, height) = Self::surface_size(area);
        self.engine.resize(width, height);
        // A larger surface may lower the maximum offset.
        self.scroll_to(self.scroll_x, self.scroll_y);
    }

    pub fn apply(&mut self, update: StoreUpdate) {
        match update {
            StoreUpdate::Delivered { batch, delivery } => self.engine.on_delivered(batch, delivery),
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.engine.in_progress() > 0
    }
}

fn offset_by(current: u64, cells: i64, cell_size: u32) -> u64 {
    let delta = cells.unsigned_abs().saturating_mul(u64::from(cell_size));
    if cells < 0 {
        current.saturating_sub(delta)
    } else {
        current.saturating_add(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;

    fn state() -> AppState {
        let settings = GridConfig::default().validate().unwrap();
        // 14 × 1 cells; an 80 × 24 terminal.
        let (w, h) = AppState::surface_size(Rect::new(0, 0, 80, 24));
        let engine = GridEngine::new(settings, MemorySurface::new(), w, h);
        AppState::new(engine, AppConfig::default())
    }

    #[test]
    fn scroll_is_clamped() {
        let mut s = state();
        s.scroll_cells(-3, -3);
        assert_eq!((s.scroll_x, s.scroll_y), (0, 0));
        s.scroll_cells(2, 5);
        assert_eq!((s.scroll_x, s.scroll_y), (28, 5));
        s.scroll_to(u64::MAX, u64::MAX);
        assert_eq!((s.scroll_x, s.scroll_y), s.engine.max_scroll());
    }

    #[test]
    fn scroll_reaches_engine_on_tick() {
        let mut s = state();
        s.engine.drain_commands();
        s.scroll_cells(0, 1);
        assert_eq!(s.engine.scroll_offset(), (0, 0));
        s.engine.tick();
        assert_eq!(s.engine.scroll_offset(), (0, 1));
    }

    #[test]
    fn page_moves_one_screen() {
        let mut s = state();
        let rows = s.engine.viewport().visible_rows() as u64;
        s.scroll_pages(1);
        assert_eq!(s.scroll_y, rows);
        s.scroll_pages(-1);
        assert_eq!(s.scroll_y, 0);
    }
}
