//! Transport layer (length-prefixed msgpack over any async byte stream).
//!
//! The reader side is owned by exactly one dispatch loop; the transmitter is
//! shared by every in-flight call and serializes its own writes.

pub mod framed;
pub mod transmit;

pub use framed::FrameReader;
pub use transmit::{FramedTransmitter, Transmitter};
