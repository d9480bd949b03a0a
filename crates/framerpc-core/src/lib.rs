//! framerpc core: runtime-free protocol primitives and error types.
//!
//! This crate defines the wire-level contracts shared by the server and test
//! tooling: message kinds, the positional decoder and its envelope, the frame
//! length prefix, and the reply tuple. It carries no async runtime so it can
//! be reused by clients and fuzzers alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `RpcError`/`DecodeError` so a malformed frame never takes the
//! process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Dynamic MessagePack value carried by arguments, results and wire errors.
pub use rmpv::Value;

pub use error::{DecodeError, ErrorCode, HandlerError, Result, RpcError};
