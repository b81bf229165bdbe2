//! Logical grid coordinates and their wire encoding.
//!
//! A request to the backing store names cells as `"<x>_<y>"` keys, and the
//! same key (prefixed with `id`) addresses parked resources in storage.
//! Decimal digits never contain the separator, so the encoding is
//! collision-free for every valid coordinate.

use std::fmt;
use std::str::FromStr;

use crate::error::GridError;

/// Separator between the two halves of a coordinate key.
pub const SEPARATOR: char = '_';

/// Prefix of the storage id derived from a coordinate.
const STORAGE_PREFIX: &str = "id";

/// A logical cell coordinate.
///
/// Coordinates are signed: the window buffer extends above/left of the grid
/// when scrolled to the origin, and those slots carry negative labels. They
/// are always out of bounds and never requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The `"<x>_<y>"` correlation key sent to the backing store.
    pub fn key(self) -> String {
        self.to_string()
    }

    /// Storage id for a resource parked for this coordinate (`"id<x>_<y>"`).
    pub fn storage_id(self) -> String {
        format!("{STORAGE_PREFIX}{self}")
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.x, self.y)
    }
}

impl FromStr for Coord {
    type Err = GridError;

    /// Parse a `"<x>_<y>"` key. Both halves must be non-negative decimals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || GridError::CoordinateKey(s.to_string());
        let (x, y) = s.split_once(SEPARATOR).ok_or_else(malformed)?;
        Ok(Self {
            x: parse_component(x).ok_or_else(malformed)?,
            y: parse_component(y).ok_or_else(malformed)?,
        })
    }
}

fn parse_component(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
