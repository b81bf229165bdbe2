//! A recycling, lazily-fetched virtual grid.
//!
//! Only a window of cells (visible area plus a buffer) ever exists. Scrolling
//! relabels those cells instead of creating new ones, and their content is
//! pulled from a backing store in throttled batches.
//!
//! [`core`] is the headless engine; [`app`] and [`ui`] are the terminal demo
//! built on it.

pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod ui;

pub use error::{ConfigError, GridError};
