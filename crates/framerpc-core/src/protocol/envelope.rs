//! Generic per-message decode state.
//!
//! An `Envelope` bounds how many positional values a request may still pull
//! from the decoder and lists the typed slots its header is decoded into.
//! Slots run strictly in declared order and the first failure aborts the pass.

use crate::error::DecodeError;
use crate::protocol::decoder::Decoder;
use crate::Value;

/// Correlation id pairing a call with its reply.
pub type SeqNumber = i64;

/// Typed decode target bound to a `Message` field.
pub type DecodeSlot = fn(&mut Message, &mut dyn Decoder) -> Result<(), DecodeError>;

/// Positional field budget plus declared decode slots.
#[derive(Debug, Clone)]
pub struct Envelope {
    remaining_fields: usize,
    decode_slots: &'static [DecodeSlot],
}

impl Envelope {
    pub fn new(remaining_fields: usize, decode_slots: &'static [DecodeSlot]) -> Self {
        Self {
            remaining_fields,
            decode_slots,
        }
    }

    pub fn remaining_fields(&self) -> usize {
        self.remaining_fields
    }

    /// Lower the budget to what the wire actually carries. Never raises it.
    pub fn limit_to(&mut self, wire_fields: usize) {
        self.remaining_fields = self.remaining_fields.min(wire_fields);
    }

    pub fn decode_slots(&self) -> &'static [DecodeSlot] {
        self.decode_slots
    }
}

/// Header fields common to every request kind.
#[derive(Debug, Clone)]
pub struct Message {
    pub envelope: Envelope,
    pub seqno: SeqNumber,
    pub method: String,
}

impl Message {
    pub fn new(envelope: Envelope) -> Self {
        Self {
            envelope,
            seqno: 0,
            method: String::new(),
        }
    }
}

/// Decode one positional value, charging it against the envelope budget.
pub fn decode_message(dec: &mut dyn Decoder, envelope: &mut Envelope) -> Result<Value, DecodeError> {
    if envelope.remaining_fields == 0 {
        return Err(DecodeError::TooFewFields);
    }
    envelope.remaining_fields -= 1;
    dec.decode_value()
}

/// Run every declared slot of `msg` in order, failing fast.
pub fn decode_into(msg: &mut Message, dec: &mut dyn Decoder) -> Result<(), DecodeError> {
    let slots = msg.envelope.decode_slots();
    for slot in slots {
        slot(msg, dec)?;
    }
    Ok(())
}

/// Slot: sequence number (integer).
pub fn seqno_slot(msg: &mut Message, dec: &mut dyn Decoder) -> Result<(), DecodeError> {
    let v = decode_message(dec, &mut msg.envelope)?;
    msg.seqno = v.as_i64().ok_or_else(|| DecodeError::InvalidField {
        field: "seqno",
        reason: format!("expected integer, got {v}"),
    })?;
    Ok(())
}

/// Slot: method name (string).
pub fn method_slot(msg: &mut Message, dec: &mut dyn Decoder) -> Result<(), DecodeError> {
    let v = decode_message(dec, &mut msg.envelope)?;
    match v {
        Value::String(s) => match s.into_str() {
            Some(name) => {
                msg.method = name;
                Ok(())
            }
            None => Err(DecodeError::InvalidField {
                field: "method",
                reason: "not valid utf-8".into(),
            }),
        },
        other => Err(DecodeError::InvalidField {
            field: "method",
            reason: format!("expected string, got {other}"),
        }),
    }
}
