//! Dispatcher module exports.
//!
//! The dispatcher owns the per-connection read loop: frame in, request out,
//! decoded in arrival order, served concurrently.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, DEFAULT_MAX_FRAME_BYTES, DEFAULT_MAX_IN_FLIGHT};
