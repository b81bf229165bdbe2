//! Application orchestration: state, the event loop's inputs, and the
//! store runtime.

pub mod event;
pub mod handler;
pub mod state;
pub mod store_runtime;
