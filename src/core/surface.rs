//! Rendering surface interface and an in-memory implementation.
//!
//! The engine never assumes more of a surface than positioned rectangles
//! with replaceable content. Elements are addressed by the slot that owns
//! them, so a recycled slot keeps its element and only moves it.

use std::collections::HashMap;

use super::coord::Coord;
use super::dimensions::RenderingMode;
use super::pool::SlotId;
use super::storage::Resource;

/// Content materialized into one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    /// Markup injected as-is.
    Raw(String),
    /// Plain text.
    Text(String),
    /// A template bound to the coordinate it was delivered for.
    Bound { template: String, coord: Coord },
    /// A pre-built resource moved out of storage.
    Resource(Resource),
}

impl SlotContent {
    /// Wrap delivered content according to the active rendering mode.
    pub fn materialize(mode: RenderingMode, content: String, coord: Coord) -> Self {
        match mode {
            RenderingMode::RawContent => SlotContent::Raw(content),
            RenderingMode::PlainText => SlotContent::Text(content),
            RenderingMode::StructuredBinding => SlotContent::Bound {
                template: content,
                coord,
            },
        }
    }

    /// Text a surface without markup support would show.
    ///
    /// Bound templates get their `[[x]]` / `[[y]]` placeholders filled in.
    pub fn display_text(&self) -> String {
        match self {
            SlotContent::Raw(markup) => strip_markup(markup),
            SlotContent::Text(text) => text.clone(),
            SlotContent::Bound { template, coord } => template
                .replace("[[x]]", &coord.x.to_string())
                .replace("[[y]]", &coord.y.to_string()),
            SlotContent::Resource(resource) => resource.payload.clone(),
        }
    }
}

/// Drop anything between `<` and `>`.
fn strip_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

// ───────────────────────────────────────── trait ─────────────

/// Primitives the engine needs from whatever draws the grid.
pub trait RenderSurface {
    /// Create the element backing `slot`.
    fn create_element(&mut self, slot: SlotId, width: u32, height: u32);

    fn remove_element(&mut self, slot: SlotId);

    /// Move the element to `(left, top)` in surface units.
    fn set_offset(&mut self, slot: SlotId, left: i64, top: i64);

    fn set_content(&mut self, slot: SlotId, content: SlotContent);

    fn clear_content(&mut self, slot: SlotId);

    /// Size of the scrollable area (cell count × cell size per axis).
    fn set_extent(&mut self, width: u64, height: u64);
}

// ───────────────────────────────────────── memory surface ────

/// One positioned rectangle on a [`MemorySurface`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
    pub content: Option<SlotContent>,
}

/// Surface that keeps its elements in memory.
///
/// The terminal UI paints from it and tests inspect it.
#[derive(Debug, Default)]
pub struct MemorySurface {
    elements: HashMap<SlotId, Element>,
    extent: (u64, u64),
    /// Total elements ever created; stays flat while scrolling.
    created: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self, slot: SlotId) -> Option<&Element> {
        self.elements.get(&slot)
    }

    pub fn elements(&self) -> impl Iterator<Item = (SlotId, &Element)> {
        self.elements.iter().map(|(&id, el)| (id, el))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn extent(&self) -> (u64, u64) {
        self.extent
    }

    pub fn created(&self) -> usize {
        self.created
    }
}

impl RenderSurface for MemorySurface {
    fn create_element(&mut self, slot: SlotId, width: u32, height: u32) {
        self.created += 1;
        self.elements.insert(
            slot,
            Element {
                width,
                height,
                ..Element::default()
            },
        );
    }

    fn remove_element(&mut self, slot: SlotId) {
        self.elements.remove(&slot);
    }

    fn set_offset(&mut self, slot: SlotId, left: i64, top: i64) {
        if let Some(el) = self.elements.get_mut(&slot) {
            el.left = left;
            el.top = top;
        }
    }

    fn set_content(&mut self, slot: SlotId, content: SlotContent) {
        if let Some(el) = self.elements.get_mut(&slot) {
            el.content = Some(content);
        }
    }

    fn clear_content(&mut self, slot: SlotId) {
        if let Some(el) = self.elements.get_mut(&slot) {
            el.content = None;
        }
    }

    fn set_extent(&mut self, width: u64, height: u64) {
        self.extent = (width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_follows_mode() {
        let c = Coord::new(3, 4);
        assert_eq!(
            SlotContent::materialize(RenderingMode::PlainText, "a".into(), c),
            SlotContent::Text("a".into())
        );
        assert_eq!(
            SlotContent::materialize(RenderingMode::RawContent, "<b>a</b>".into(), c),
            SlotContent::Raw("<b>a</b>".into())
        );
        assert_eq!(
            SlotContent::materialize(RenderingMode::StructuredBinding, "[[x]]".into(), c),
            SlotContent::Bound {
                template: "[[x]]".into(),
                coord: c
            }
        );
    }

    #[test]
    fn display_text() {
        let bound = SlotContent::Bound {
            template: "<button>[[x]], [[y]]</button>".into(),
            coord: Coord::new(7, 42),
        };
        assert_eq!(bound.display_text(), "<button>7, 42</button>");
        assert_eq!(SlotContent::Raw("<i>hi</i> there".into()).display_text(), "hi there");
        assert_eq!(SlotContent::Raw("1 < 2".into()).display_text(), "1 ");
    }

    #[test]
    fn memory_surface_ignores_unknown_slots() {
        let mut surface = MemorySurface::new();
        surface.set_offset(9, 10, 10);
        surface.set_content(9, SlotContent::Text("x".into()));
        assert!(surface.is_empty());

        surface.create_element(0, 100, 20);
        surface.set_offset(0, -100, 40);
        surface.set_content(0, SlotContent::Text("x".into()));
        let el = surface.element(0).unwrap();
        assert_eq!((el.left, el.top, el.width, el.height), (-100, 40, 100, 20));
        surface.clear_content(0);
        assert_eq!(surface.element(0).unwrap().content, None);
        assert_eq!(surface.created(), 1);
    }
}
