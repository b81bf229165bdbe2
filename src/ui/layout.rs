//! Layout helpers: split the terminal area into regions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Grid pane plus a bottom status bar.
pub struct AppLayout {
    pub grid_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    pub fn from_area(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // grid pane
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            grid_area: chunks[0],
            status_area: chunks[1],
        }
    }

    /// The grid pane without its border; this is the rendering surface.
    pub fn grid_inner(&self) -> Rect {
        let a = self.grid_area;
        Rect::new(
            a.x.saturating_add(1),
            a.y.saturating_add(1),
            a.width.saturating_sub(2),
            a.height.saturating_sub(2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_area_drops_border_and_status() {
        let layout = AppLayout::from_area(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.status_area, Rect::new(0, 23, 80, 1));
        assert_eq!(layout.grid_inner(), Rect::new(1, 1, 78, 21));
    }
}
