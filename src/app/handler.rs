//! Input handling: maps key/mouse events to state mutations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::config::Action;

use super::state::{ActiveView, AppState};

/// Rows (or columns) moved per mouse wheel notch.
const WHEEL_STEP: i64 = 3;

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Grid => handle_grid_key(state, key),
        ActiveView::Controls => handle_controls_key(state, key),
    }
}

fn handle_grid_key(state: &mut AppState, key: KeyEvent) {
    let Some(action) = state.config.match_key(key) else {
        return;
    };
    state.status_message = None;
    match action {
        Action::ScrollUp => state.scroll_cells(0, -1),
        Action::ScrollDown => state.scroll_cells(0, 1),
        Action::ScrollLeft => state.scroll_cells(-1, 0),
        Action::ScrollRight => state.scroll_cells(1, 0),
        Action::PageUp => state.scroll_pages(-1),
        Action::PageDown => state.scroll_pages(1),
        Action::Top => state.jump_to_origin(),
        Action::Bottom => state.jump_to_last_row(),
        Action::Resync => {
            state.engine.request_resync();
            state.status_message = Some("Resync requested".into());
        }
        Action::ShowControls => state.active_view = ActiveView::Controls,
        Action::Quit => state.should_quit = true,
    }
}

/// The controls popup is read-only: its own binding, Esc or `q` closes it.
fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let closes = matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter)
        || state.config.match_key(key) == Some(Action::ShowControls);
    if closes {
        state.active_view = ActiveView::Grid;
    }
}

pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.active_view != ActiveView::Grid {
        return;
    }
    let horizontal = mouse.modifiers.contains(KeyModifiers::SHIFT);
    match (mouse.kind, horizontal) {
        (MouseEventKind::ScrollDown, false) => state.scroll_cells(0, WHEEL_STEP),
        (MouseEventKind::ScrollUp, false) => state.scroll_cells(0, -WHEEL_STEP),
        (MouseEventKind::ScrollDown, true) | (MouseEventKind::ScrollRight, _) => {
            state.scroll_cells(1, 0)
        }
        (MouseEventKind::ScrollUp, true) | (MouseEventKind::ScrollLeft, _) => {
            state.scroll_cells(-1, 0)
        }
        _ => {}
    }
}
