//! Typed errors for the grid engine and its configuration.
//!
//! Content that has not arrived yet, deliveries for recycled cells and
//! request overflow are all normal engine states and never show up here.
//! Only configuration that would make the window math undefined, and
//! malformed coordinate keys coming back from a backing store, are errors.

/// Invalid grid configuration, rejected before any window is computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Cell sizes and buffers divide or size the window; zero or less is undefined.
    #[error("{field} must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: i64 },

    /// Counts may be zero but never negative.
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    /// More frozen rows/columns than the grid has.
    #[error("{field} ({value}) exceeds the grid's {axis} count ({count})")]
    FrozenExceedsCount {
        field: &'static str,
        axis: &'static str,
        value: u64,
        count: u64,
    },

    /// The value does not fit the type the engine uses for it.
    #[error("{field} is out of range (got {value})")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("unknown rendering mode `{0}` (expected raw, text or bind)")]
    UnknownRenderingMode(String),
}

/// All errors surfaced by the library.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A `"<x>_<y>"` key that is not two non-negative decimal integers.
    #[error("malformed coordinate key `{0}`")]
    CoordinateKey(String),
}
