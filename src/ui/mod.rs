//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! The grid itself is painted from the engine's in-memory surface; the
//! engine never sees a terminal.

pub mod grid_widget;
pub mod layout;
pub mod popup;
pub mod spinner;
pub mod status;
pub mod theme;
