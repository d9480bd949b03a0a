//! Protocol modules.
//!
//! Wire shape of a message: `[kind, ...positional fields]` as a msgpack
//! array, preceded by a msgpack-encoded length prefix:
//! - `kind`: call-kind discriminant (`MessageKind`).
//! - `envelope`/`decoder`: progressive positional decoding with a field budget.
//! - `frame`: length prefix split/join.
//! - `reply`: the fixed 4-tuple written back for calls.
//!
//! All parsers are panic-free: malformed input surfaces as an error value.

pub mod decoder;
pub mod envelope;
pub mod frame;
pub mod kind;
pub mod reply;

pub use decoder::{Decoder, MsgPackDecoder};
pub use envelope::{decode_into, decode_message, DecodeSlot, Envelope, Message, SeqNumber};
pub use kind::MessageKind;
pub use reply::Reply;
