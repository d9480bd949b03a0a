//! Reply tuple for calls: `[response-tag, seqno, error, result]`.

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::error::{Result, RpcError};
use crate::protocol::envelope::SeqNumber;
use crate::protocol::kind::MessageKind;
use crate::Value;

/// Outcome of one call, ready to be written back to the peer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub seqno: SeqNumber,
    /// Wrapped error, `None` on success.
    pub error: Option<Value>,
    /// Handler result, `None` on failure.
    pub result: Option<Value>,
}

impl Reply {
    /// Encode as a msgpack array (without frame prefix).
    pub fn encode(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self)
            .map_err(|e| RpcError::Internal(format!("reply encode failed: {e}")))
    }
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(4)?;
        tup.serialize_element(&MessageKind::Response.as_wire())?;
        tup.serialize_element(&self.seqno)?;
        tup.serialize_element(&self.error)?;
        tup.serialize_element(&self.result)?;
        tup.end()
    }
}
