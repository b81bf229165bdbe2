//! Core engine: windowing, cell recycling, the frozen region and content
//! fetching.
//!
//! Nothing in this module depends on any TUI or rendering crate. Rendering
//! goes through [`surface::RenderSurface`] and content through
//! [`store::ContentStore`].

pub mod coord;
pub mod dimensions;
pub mod engine;
pub mod fetch;
pub mod frozen;
pub mod pool;
pub mod storage;
pub mod store;
pub mod surface;
pub mod tick;
pub mod viewport;

pub use coord::Coord;
pub use dimensions::{Dimensions, GridSettings, RenderingMode};
pub use engine::{EngineStats, GridEngine, TickReport};
pub use fetch::{BatchId, FetchBatch, StoreCommand};
pub use store::{ContentEntry, ContentStore, Delivery, GeneratorStore};
pub use surface::{MemorySurface, RenderSurface, SlotContent};
