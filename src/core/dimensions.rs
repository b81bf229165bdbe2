//! Logical grid shape and validated engine settings.
//!
//! Everything here is checked once, at construction. The rest of the engine
//! divides by cell sizes and sizes the window from the buffers without
//! re-checking, so a zero in any of them must never get this far.

use std::fmt;
use std::str::FromStr;

use super::coord::Coord;
use crate::error::ConfigError;

/// Extra columns materialized beyond the visible area.
pub const DEFAULT_BUFFER_X: u32 = 1;
/// Extra rows materialized beyond the visible area (split above/below).
pub const DEFAULT_BUFFER_Y: u32 = 14;
/// Concurrent outstanding batches allowed against the backing store.
pub const DEFAULT_REQUESTS_ALLOWED: usize = 2;

// ───────────────────────────────────────── rendering mode ────

/// How delivered content is materialized into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingMode {
    /// Content is markup injected as-is.
    RawContent,
    /// Content is assigned as plain text.
    #[default]
    PlainText,
    /// Content is a template bound to the slot's coordinate.
    StructuredBinding,
}

impl RenderingMode {
    pub const ALL: &[RenderingMode] = &[
        RenderingMode::RawContent,
        RenderingMode::PlainText,
        RenderingMode::StructuredBinding,
    ];

    /// Key used in the config file and on the command line.
    pub fn config_key(self) -> &'static str {
        match self {
            RenderingMode::RawContent => "raw",
            RenderingMode::PlainText => "text",
            RenderingMode::StructuredBinding => "bind",
        }
    }
}

impl fmt::Display for RenderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

impl FromStr for RenderingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" | "raw_content" | "rawcontent" => Ok(RenderingMode::RawContent),
            "text" | "plain_text" | "plaintext" => Ok(RenderingMode::PlainText),
            "bind" | "structured_binding" | "structuredbinding" => {
                Ok(RenderingMode::StructuredBinding)
            }
            other => Err(ConfigError::UnknownRenderingMode(other.to_string())),
        }
    }
}

// ───────────────────────────────────────── dimensions ────────

/// Logical grid shape, fixed for a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    cell_width: u32,
    cell_height: u32,
    cell_count_x: u64,
    cell_count_y: u64,
    frozen_rows: u32,
    frozen_columns: u32,
}

impl Dimensions {
    pub fn new(
        cell_width: u32,
        cell_height: u32,
        cell_count_x: u64,
        cell_count_y: u64,
        frozen_rows: u32,
        frozen_columns: u32,
    ) -> Result<Self, ConfigError> {
        if cell_width == 0 {
            return Err(ConfigError::NonPositive { field: "cell_width", value: 0 });
        }
        if cell_height == 0 {
            return Err(ConfigError::NonPositive { field: "cell_height", value: 0 });
        }
        // Coordinates are signed; counts must fit.
        for (field, count) in [("cell_count_x", cell_count_x), ("cell_count_y", cell_count_y)] {
            if i64::try_from(count).is_err() {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: i64::MAX,
                });
            }
        }
        if u64::from(frozen_rows) > cell_count_y {
            return Err(ConfigError::FrozenExceedsCount {
                field: "frozen_rows",
                axis: "row",
                value: u64::from(frozen_rows),
                count: cell_count_y,
            });
        }
        if u64::from(frozen_columns) > cell_count_x {
            return Err(ConfigError::FrozenExceedsCount {
                field: "frozen_columns",
                axis: "column",
                value: u64::from(frozen_columns),
                count: cell_count_x,
            });
        }
        Ok(Self {
            cell_width,
            cell_height,
            cell_count_x,
            cell_count_y,
            frozen_rows,
            frozen_columns,
        })
    }

    pub const fn cell_width(&self) -> u32 {
        self.cell_width
    }

    pub const fn cell_height(&self) -> u32 {
        self.cell_height
    }

    pub const fn cell_count_x(&self) -> u64 {
        self.cell_count_x
    }

    pub const fn cell_count_y(&self) -> u64 {
        self.cell_count_y
    }

    pub const fn frozen_rows(&self) -> u32 {
        self.frozen_rows
    }

    pub const fn frozen_columns(&self) -> u32 {
        self.frozen_columns
    }

    /// Is `coord` inside `[0, cell_count_x) × [0, cell_count_y)`?
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u64) < self.cell_count_x
            && (coord.y as u64) < self.cell_count_y
    }

    /// Full scrollable extent of the logical grid, in surface units.
    pub fn extent(&self) -> (u64, u64) {
        (
            self.cell_count_x.saturating_mul(u64::from(self.cell_width)),
            self.cell_count_y.saturating_mul(u64::from(self.cell_height)),
        )
    }
}

// ───────────────────────────────────────── settings ──────────

/// Everything the engine needs to know about a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
    dimensions: Dimensions,
    buffer_x: u32,
    buffer_y: u32,
    rendering_mode: RenderingMode,
    requests_allowed: usize,
}

impl GridSettings {
    pub fn new(
        dimensions: Dimensions,
        buffer_x: u32,
        buffer_y: u32,
        rendering_mode: RenderingMode,
        requests_allowed: usize,
    ) -> Result<Self, ConfigError> {
        if buffer_x == 0 {
            return Err(ConfigError::NonPositive { field: "buffer_x", value: 0 });
        }
        if buffer_y == 0 {
            return Err(ConfigError::NonPositive { field: "buffer_y", value: 0 });
        }
        if requests_allowed == 0 {
            return Err(ConfigError::NonPositive {
                field: "requests_allowed",
                value: 0,
            });
        }
        Ok(Self {
            dimensions,
            buffer_x,
            buffer_y,
            rendering_mode,
            requests_allowed,
        })
    }

    /// Settings with the default buffers, plain-text rendering and request cap.
    pub fn with_defaults(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            buffer_x: DEFAULT_BUFFER_X,
            buffer_y: DEFAULT_BUFFER_Y,
            rendering_mode: RenderingMode::default(),
            requests_allowed: DEFAULT_REQUESTS_ALLOWED,
        }
    }

    pub const fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub const fn buffer_x(&self) -> u32 {
        self.buffer_x
    }

    pub const fn buffer_y(&self) -> u32 {
        self.buffer_y
    }

    pub const fn rendering_mode(&self) -> RenderingMode {
        self.rendering_mode
    }

    pub const fn requests_allowed(&self) -> usize {
        self.requests_allowed
    }
}
