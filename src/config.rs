//! User configuration: grid settings, keybindings and persistence.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/infinite-grid/config.toml` (default
//! `~/.config/infinite-grid/config.toml`). Grid values are kept raw and
//! signed so a bad value is reported by [`GridConfig::validate`] instead of
//! silently wrapping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::core::dimensions::{
    Dimensions, GridSettings, RenderingMode, DEFAULT_BUFFER_X, DEFAULT_BUFFER_Y,
    DEFAULT_REQUESTS_ALLOWED,
};
use crate::error::ConfigError;

// ───────────────────────────────────────── actions ───────────

/// All rebindable actions in the grid view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Resync,
    ShowControls,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls popup).
    pub const ALL: &[Action] = &[
        Action::ScrollUp,
        Action::ScrollDown,
        Action::ScrollLeft,
        Action::ScrollRight,
        Action::PageUp,
        Action::PageDown,
        Action::Top,
        Action::Bottom,
        Action::Resync,
        Action::ShowControls,
        Action::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::ScrollUp => "Scroll Up",
            Action::ScrollDown => "Scroll Down",
            Action::ScrollLeft => "Scroll Left",
            Action::ScrollRight => "Scroll Right",
            Action::PageUp => "Page Up",
            Action::PageDown => "Page Down",
            Action::Top => "Jump to Origin",
            Action::Bottom => "Jump to Last Row",
            Action::Resync => "Force Resync",
            Action::ShowControls => "Show Controls",
            Action::Quit => "Quit",
        }
    }

    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollUp => "scroll_up",
            Action::ScrollDown => "scroll_down",
            Action::ScrollLeft => "scroll_left",
            Action::ScrollRight => "scroll_right",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::Resync => "resync",
            Action::ShowControls => "show_controls",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A key code plus modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

/// Only these modifiers take part in matching.
const MODIFIER_MASK: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT);

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn matches(&self, event: KeyEvent) -> bool {
        self.code == event.code && (self.modifiers & MODIFIER_MASK) == (event.modifiers & MODIFIER_MASK)
    }

    /// Display string for the UI (e.g. `"Ctrl+c"`, `"↑"`).
    pub fn display(&self) -> String {
        self.render(true)
    }

    /// Config-file form (e.g. `"Ctrl+c"`, `"Up"`).
    fn to_config_string(&self) -> String {
        self.render(false)
    }

    fn render(&self, pretty: bool) -> String {
        let mut s = String::new();
        for (flag, name) in [
            (KeyModifiers::CONTROL, "Ctrl+"),
            (KeyModifiers::ALT, "Alt+"),
            (KeyModifiers::SHIFT, "Shift+"),
        ] {
            if self.modifiers.contains(flag) {
                s.push_str(name);
            }
        }
        let key = match (self.code, pretty) {
            (KeyCode::Char(' '), _) => "Space".to_string(),
            (KeyCode::Char(c), _) => c.to_string(),
            (KeyCode::Up, true) => "↑".into(),
            (KeyCode::Down, true) => "↓".into(),
            (KeyCode::Left, true) => "←".into(),
            (KeyCode::Right, true) => "→".into(),
            (KeyCode::PageUp, true) => "PgUp".into(),
            (KeyCode::PageDown, true) => "PgDn".into(),
            (KeyCode::F(n), _) => format!("F{n}"),
            (other, _) => format!("{other:?}"),
        };
        s.push_str(&key);
        s
    }

    /// Parse `"Ctrl+c"`, `"Shift+Down"`, `"PageUp"`, `"?"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let (prefix, key) = match s.rsplit_once('+') {
            // A lone "+" is the plus key.
            Some((p, "")) => (p.strip_suffix('+').unwrap_or(p), "+"),
            Some((p, k)) => (p, k),
            None => ("", s),
        };
        for part in prefix.split('+').filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            k if k.starts_with('f') && k.len() > 1 => KeyCode::F(k[1..].parse().ok()?),
            _ if key.chars().count() == 1 => KeyCode::Char(key.chars().next()?),
            _ => return None,
        };
        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── grid config ───────

/// Grid settings as written by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    pub cell_width: i64,
    pub cell_height: i64,
    pub cell_count_x: i64,
    pub cell_count_y: i64,
    pub frozen_rows: i64,
    pub frozen_columns: i64,
    pub buffer_x: i64,
    pub buffer_y: i64,
    pub rendering_mode: RenderingMode,
    pub requests_allowed: i64,
}

impl Default for GridConfig {
    /// Terminal-sized cells: 14 columns wide, one line high.
    fn default() -> Self {
        Self {
            cell_width: 14,
            cell_height: 1,
            cell_count_x: 1000,
            cell_count_y: 100_000,
            frozen_rows: 1,
            frozen_columns: 1,
            buffer_x: i64::from(DEFAULT_BUFFER_X),
            buffer_y: i64::from(DEFAULT_BUFFER_Y),
            rendering_mode: RenderingMode::default(),
            requests_allowed: DEFAULT_REQUESTS_ALLOWED as i64,
        }
    }
}

impl GridConfig {
    /// Check every value and build engine settings.
    pub fn validate(&self) -> Result<GridSettings, ConfigError> {
        let dims = Dimensions::new(
            positive("cell_width", self.cell_width)?,
            positive("cell_height", self.cell_height)?,
            count("cell_count_x", self.cell_count_x)?,
            count("cell_count_y", self.cell_count_y)?,
            frozen("frozen_rows", self.frozen_rows)?,
            frozen("frozen_columns", self.frozen_columns)?,
        )?;
        if self.requests_allowed <= 0 {
            return Err(ConfigError::NonPositive {
                field: "requests_allowed",
                value: self.requests_allowed,
            });
        }
        let requests_allowed =
            usize::try_from(self.requests_allowed).map_err(|_| ConfigError::OutOfRange {
                field: "requests_allowed",
                value: self.requests_allowed,
            })?;
        GridSettings::new(
            dims,
            positive("buffer_x", self.buffer_x)?,
            positive("buffer_y", self.buffer_y)?,
            self.rendering_mode,
            requests_allowed,
        )
    }

    /// Apply one `key = value` line. Returns `false` for unknown keys.
    fn set(&mut self, key: &str, value: &str) -> bool {
        let field = match key {
            "cell_width" => &mut self.cell_width,
            "cell_height" => &mut self.cell_height,
            "cell_count_x" => &mut self.cell_count_x,
            "cell_count_y" => &mut self.cell_count_y,
            "frozen_rows" => &mut self.frozen_rows,
            "frozen_columns" => &mut self.frozen_columns,
            "buffer_x" => &mut self.buffer_x,
            "buffer_y" => &mut self.buffer_y,
            "requests_allowed" => &mut self.requests_allowed,
            "rendering_mode" => {
                match value.parse() {
                    Ok(mode) => self.rendering_mode = mode,
                    Err(e) => warn!("ignoring config value: {e}"),
                }
                return true;
            }
            _ => return false,
        };
        match value.parse::<i64>() {
            Ok(v) => *field = v,
            Err(_) => warn!(key, value, "ignoring non-numeric config value"),
        }
        true
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange { field, value })
}

fn count(field: &'static str, value: i64) -> Result<u64, ConfigError> {
    u64::try_from(value).map_err(|_| ConfigError::Negative { field, value })
}

fn frozen(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::Negative { field, value });
    }
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange { field, value })
}

// ───────────────────────────────────────── app config ────────

pub struct AppConfig {
    pub grid: GridConfig,
    pub bindings: HashMap<Action, Vec<KeyBind>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            bindings: Self::default_bindings(),
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(ScrollUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(ScrollDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(ScrollLeft, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(ScrollRight, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(Action::PageUp, vec![KeyBind::new(KeyCode::PageUp, n)]);
        m.insert(Action::PageDown, vec![KeyBind::new(KeyCode::PageDown, n), KeyBind::new(Char(' '), n)]);
        m.insert(Top, vec![KeyBind::new(Home, n), KeyBind::new(Char('g'), n)]);
        m.insert(Bottom, vec![KeyBind::new(End, n), KeyBind::new(Char('G'), KeyModifiers::SHIFT)]);
        m.insert(Resync, vec![KeyBind::new(Char('r'), n)]);
        m.insert(ShowControls, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n), KeyBind::new(Esc, n)]);

        m
    }

    /// Action bound to a key event. With several matches the binding with
    /// the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .flat_map(|(&action, binds)| binds.iter().map(move |b| (action, b)))
            .filter(|(_, b)| b.matches(event))
            .max_by_key(|(_, b)| b.modifiers.bits().count_ones())
            .map(|(action, _)| action)
    }

    /// Format the bindings of an action (e.g. `"↑/k"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(KeyBind::display).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    fn short_binding(&self, action: Action) -> String {
        self.bindings
            .get(&action)
            .and_then(|b| b.first())
            .map_or_else(|| "?".into(), KeyBind::display)
    }

    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}: resync | {}: controls | {}: quit",
            self.short_binding(Action::Resync),
            self.short_binding(Action::ShowControls),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(_) => Self::default(),
        }
    }

    /// Persist to the default location; returns the path written.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.serialise())?;
        Ok(())
    }

    fn parse(s: &str) -> Self {
        let mut config = Self::default();
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if config.grid.set(key, value) {
                continue;
            }
            let Some(action) = Action::from_config_key(key) else {
                warn!(key, "unknown config key");
                continue;
            };
            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }
        config
    }

    fn serialise(&self) -> String {
        let g = &self.grid;
        let mut lines = vec![
            "# infinite-grid configuration".to_string(),
            String::new(),
            "# Grid".to_string(),
            format!("cell_width = {}", g.cell_width),
            format!("cell_height = {}", g.cell_height),
            format!("cell_count_x = {}", g.cell_count_x),
            format!("cell_count_y = {}", g.cell_count_y),
            format!("frozen_rows = {}", g.frozen_rows),
            format!("frozen_columns = {}", g.frozen_columns),
            format!("buffer_x = {}", g.buffer_x),
            format!("buffer_y = {}", g.buffer_y),
            format!("rendering_mode = {}", g.rendering_mode),
            format!("requests_allowed = {}", g.requests_allowed),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            String::new(),
        ];
        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(KeyBind::to_config_string).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// `$XDG_CONFIG_HOME/infinite-grid/config.toml`.
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join(env!("CARGO_PKG_NAME")).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn defaults_validate() {
        let settings = GridConfig::default().validate().unwrap();
        assert_eq!(settings.buffer_y(), 14);
        assert_eq!(settings.dimensions().frozen_rows(), 1);
    }

    #[test_case("cell_width", 0 ; "zero width")]
    #[test_case("cell_height", -3 ; "negative height")]
    #[test_case("buffer_x", 0 ; "zero horizontal buffer")]
    #[test_case("buffer_y", -1 ; "negative vertical buffer")]
    #[test_case("requests_allowed", 0 ; "zero cap")]
    fn rejects_non_positive(field: &'static str, value: i64) {
        let mut grid = GridConfig::default();
        assert!(grid.set(field, &value.to_string()));
        assert_eq!(grid.validate(), Err(ConfigError::NonPositive { field, value }));
    }

    #[test]
    fn rejects_negative_counts() {
        let mut grid = GridConfig::default();
        grid.cell_count_y = -5;
        assert_eq!(
            grid.validate(),
            Err(ConfigError::Negative { field: "cell_count_y", value: -5 })
        );
        let mut grid = GridConfig::default();
        grid.frozen_columns = -1;
        assert!(matches!(grid.validate(), Err(ConfigError::Negative { .. })));
    }

    #[test]
    fn rejects_oversized_cell() {
        let mut grid = GridConfig::default();
        grid.cell_width = i64::from(u32::MAX) + 1;
        assert!(matches!(grid.validate(), Err(ConfigError::OutOfRange { field: "cell_width", .. })));
    }

    #[test]
    fn parses_grid_and_bindings() {
        let cfg = AppConfig::parse(
            "# comment\n\
             cell_width = 10\n\
             frozen_rows = 0\n\
             rendering_mode = bind\n\
             cell_height = lots\n\
             resync = Ctrl+r, F5\n\
             bogus = 1\n",
        );
        assert_eq!(cfg.grid.cell_width, 10);
        assert_eq!(cfg.grid.frozen_rows, 0);
        assert_eq!(cfg.grid.cell_height, 1);
        assert_eq!(cfg.grid.rendering_mode, RenderingMode::StructuredBinding);
        assert_eq!(
            cfg.match_key(key(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Action::Resync)
        );
        assert_eq!(cfg.match_key(key(KeyCode::F(5), KeyModifiers::NONE)), Some(Action::Resync));
        assert_eq!(cfg.match_key(key(KeyCode::Char('r'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn serialised_config_reads_back() {
        let mut cfg = AppConfig::default();
        cfg.grid.cell_count_x = 42;
        cfg.grid.rendering_mode = RenderingMode::RawContent;
        let back = AppConfig::parse(&cfg.serialise());
        assert_eq!(back.grid, cfg.grid);
        assert_eq!(back.bindings, cfg.bindings);
    }

    #[test_case("Ctrl+c", KeyCode::Char('c'), KeyModifiers::CONTROL)]
    #[test_case("Shift+Down", KeyCode::Down, KeyModifiers::SHIFT)]
    #[test_case("pgdn", KeyCode::PageDown, KeyModifiers::NONE)]
    #[test_case("+", KeyCode::Char('+'), KeyModifiers::NONE)]
    #[test_case("Alt++", KeyCode::Char('+'), KeyModifiers::ALT)]
    #[test_case("?", KeyCode::Char('?'), KeyModifiers::NONE)]
    fn parses_key(s: &str, code: KeyCode, modifiers: KeyModifiers) {
        assert_eq!(KeyBind::parse(s), Some(KeyBind::new(code, modifiers)));
    }

    #[test]
    fn default_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.match_key(key(KeyCode::Char('j'), KeyModifiers::NONE)), Some(Action::ScrollDown));
        assert_eq!(cfg.match_key(key(KeyCode::Char('G'), KeyModifiers::SHIFT)), Some(Action::Bottom));
        assert_eq!(cfg.display_bindings(Action::ScrollUp), "↑/k");
    }
}
