//! Fetch indicator: a small spinner with the in-flight batch count, rendered
//! in the top-right corner of a given area.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Braille-dot spinner frames.
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Drawn over the grid pane's top border while batches are outstanding.
pub struct FetchIndicator {
    pub in_progress: usize,
    pub allowed: usize,
    /// Drives the spinner frame.
    pub tick: u64,
}

impl FetchIndicator {
    fn label(&self) -> String {
        let frame = SPINNER_FRAMES[(self.tick as usize) % SPINNER_FRAMES.len()];
        format!(" {frame} fetching {}/{} ", self.in_progress, self.allowed)
    }
}

impl Widget for FetchIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.in_progress == 0 || area.height == 0 {
            return;
        }
        let label = self.label();
        let label_width = label.chars().count() as u16;
        if area.width < label_width + 2 {
            return;
        }

        // Top-right, one column in from the border corner.
        let x = area.x + area.width - label_width - 1;
        let line = Line::from(Span::styled(
            label,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(x, area.y, &line, label_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(indicator: FetchIndicator, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        indicator.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn hidden_when_idle() {
        let out = rendered(FetchIndicator { in_progress: 0, allowed: 2, tick: 0 }, 40);
        assert_eq!(out.trim(), "");
    }

    #[test]
    fn shows_counts() {
        let out = rendered(FetchIndicator { in_progress: 1, allowed: 2, tick: 3 }, 40);
        assert!(out.contains("⠸ fetching 1/2"));
        assert!(out.ends_with("  "));
    }

    #[test]
    fn skipped_when_too_narrow() {
        let out = rendered(FetchIndicator { in_progress: 1, allowed: 2, tick: 0 }, 10);
        assert_eq!(out.trim(), "");
    }
}
