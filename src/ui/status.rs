//! Bottom status bar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::core::engine::GridEngine;
use crate::core::surface::MemorySurface;

use super::theme::Theme;

pub struct StatusBar<'a> {
    pub engine: &'a GridEngine<MemorySurface>,
    /// Shown instead of the key hint when set.
    pub message: Option<&'a str>,
    pub hint: &'a str,
}

impl StatusBar<'_> {
    fn line(&self) -> Line<'static> {
        let e = self.engine;
        let (cx, cy) = e.viewport().position();
        let fetch = e.fetch_stats();
        let mut spans = vec![Span::styled(
            format!(
                " cell {cx},{cy} | window {}x{} | in flight {}/{} ",
                e.viewport().max_x(),
                e.viewport().max_y(),
                e.in_progress(),
                e.requests_allowed(),
            ),
            Theme::status_bar_style(),
        )];
        if fetch.dropped > 0 || fetch.overflows > 0 {
            spans.push(Span::styled(
                format!("| dropped {} overflow {} ", fetch.dropped, fetch.overflows),
                Theme::warning_style(),
            ));
        }
        let tail = self.message.unwrap_or(self.hint);
        spans.push(Span::styled(format!("| {tail}"), Theme::status_bar_style()));
        Line::from(spans)
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line())
            .style(Theme::status_bar_style())
            .render(area, buf);
    }
}
