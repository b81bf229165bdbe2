//! Paints the engine's in-memory surface into a ratatui buffer.
//!
//! Every element is drawn at `(left, top)` minus the processed scroll
//! offset. Frozen elements are drawn last so the leading columns cover
//! whatever scrolls underneath them.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

use crate::core::engine::GridEngine;
use crate::core::pool::{ContentState, Slot};
use crate::core::surface::{Element, MemorySurface, SlotContent};

use super::theme::Theme;

const SEPARATOR: char = '│';
const PENDING: &str = "…";

pub struct GridWidget<'a> {
    engine: &'a GridEngine<MemorySurface>,
    block: Option<Block<'a>>,
}

impl<'a> GridWidget<'a> {
    pub fn new(engine: &'a GridEngine<MemorySurface>) -> Self {
        Self { engine, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for GridWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if area.is_empty() {
            return;
        }

        let pool = self.engine.pool();
        let (scroll_left, scroll_top) = self.engine.scroll_offset();
        let mut elements: Vec<_> = self.engine.surface().elements().collect();
        elements.sort_by_key(|&(id, _)| {
            let slot = pool.slot(id);
            (u8::from(slot.header) + u8::from(slot.leading), id)
        });

        for (id, element) in elements {
            let origin = (
                element.left - to_signed(scroll_left),
                element.top - to_signed(scroll_top),
            );
            paint_cell(area, buf, pool.slot(id), element, origin);
        }
    }
}

fn paint_cell(area: Rect, buf: &mut Buffer, slot: &Slot, element: &Element, (x0, y0): (i64, i64)) {
    let (w, h) = (i64::from(element.width), i64::from(element.height));
    let (aw, ah) = (i64::from(area.width), i64::from(area.height));
    if x0 >= aw || y0 >= ah || x0 + w <= 0 || y0 + h <= 0 {
        return;
    }

    let style = cell_style(slot, element.content.as_ref());
    let text = match &element.content {
        Some(content) => content.display_text(),
        None if slot.state == ContentState::Pending => PENDING.to_string(),
        None => String::new(),
    };

    let put = |buf: &mut Buffer, x: i64, y: i64, ch: char, style: Style| {
        if (0..aw).contains(&x) && (0..ah).contains(&y) {
            buf[(area.x + x as u16, area.y + y as u16)]
                .set_char(ch)
                .set_style(style);
        }
    };

    // Blank the whole rect first so pinned cells fully cover what's below.
    for y in y0.max(0)..(y0 + h).min(ah) {
        for x in x0.max(0)..(x0 + w).min(aw) {
            put(buf, x, y, ' ', style);
        }
    }

    let text_width = (w - 1).max(1) as usize;
    for (i, ch) in text.chars().take(text_width).enumerate() {
        put(buf, x0 + i as i64, y0, ch, style);
    }
    if w > 1 {
        for y in y0..y0 + h {
            put(buf, x0 + w - 1, y, SEPARATOR, Theme::separator_style());
        }
    }
}

fn cell_style(slot: &Slot, content: Option<&SlotContent>) -> Style {
    match (slot.header, slot.leading) {
        (true, true) => Theme::corner_style(),
        (true, false) | (false, true) => Theme::header_style(),
        (false, false) => match (content, slot.state) {
            (Some(SlotContent::Resource(_)), _) => Theme::resource_style(),
            (None, ContentState::Pending) => Theme::pending_style(),
            _ => Theme::cell_style(),
        },
    }
}

fn to_signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dimensions::{Dimensions, GridSettings, RenderingMode};
    use crate::core::fetch::StoreCommand;
    use crate::core::store::{ContentEntry, Delivery};

    fn engine() -> GridEngine<MemorySurface> {
        let dims = Dimensions::new(8, 1, 100, 100, 1, 1).unwrap();
        let settings = GridSettings::new(dims, 1, 2, RenderingMode::PlainText, 2).unwrap();
        GridEngine::new(settings, MemorySurface::new(), 32, 6)
    }

    /// Deliver `(x,y)` labels for every outstanding batch.
    fn fill(engine: &mut GridEngine<MemorySurface>) {
        for command in engine.drain_commands() {
            if let StoreCommand::Fetch(batch) = command {
                let entries = batch
                    .coords
                    .iter()
                    .map(|c| ContentEntry::text(c.x, c.y, format!("{},{}", c.x, c.y)))
                    .collect();
                engine.on_delivered(batch.id, Delivery { entries, resources: Vec::new() });
            }
        }
        engine.tick();
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    fn render(engine: &GridEngine<MemorySurface>) -> Buffer {
        let area = Rect::new(0, 0, 32, 6);
        let mut buf = Buffer::empty(area);
        GridWidget::new(engine).render(area, &mut buf);
        buf
    }

    #[test]
    fn paints_delivered_labels() {
        let mut e = engine();
        fill(&mut e);
        let buf = render(&e);
        assert_eq!(row_text(&buf, 0), "0,0    │1,0    │2,0    │3,0    │");
        assert_eq!(row_text(&buf, 1), "0,1    │1,1    │2,1    │3,1    │");
    }

    #[test]
    fn leading_column_follows_horizontal_scroll_only() {
        let mut e = engine();
        fill(&mut e);
        e.on_scroll(16, 3);
        e.tick();
        fill(&mut e);
        let buf = render(&e);
        assert!(row_text(&buf, 0).starts_with("0,3    │3,3    │"));
        assert!(row_text(&buf, 1).starts_with("0,4    │3,4    │"));
        // The header row scrolled up with the content.
        assert!((0..6).all(|y| !row_text(&buf, y).contains("0,0")));
    }

    #[test]
    fn pending_cells_show_placeholder() {
        let e = engine();
        let buf = render(&e);
        assert!(row_text(&buf, 2).starts_with("…"));
    }
}
