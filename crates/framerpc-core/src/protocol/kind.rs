//! Call-kind discriminant (first element of every wire message).

/// Wire-level message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Request expecting a reply.
    Call,
    /// Reply to a previous call.
    Response,
    /// Fire-and-forget request.
    Notify,
    /// Cancellation intent for an outstanding call.
    Cancel,
}

impl MessageKind {
    /// All known kinds, in wire order.
    pub const ALL: [MessageKind; 4] = [
        MessageKind::Call,
        MessageKind::Response,
        MessageKind::Notify,
        MessageKind::Cancel,
    ];

    /// Parse the wire discriminant. Unknown tags yield `None`.
    pub fn from_wire(tag: i64) -> Option<Self> {
        match tag {
            0 => Some(MessageKind::Call),
            1 => Some(MessageKind::Response),
            2 => Some(MessageKind::Notify),
            3 => Some(MessageKind::Cancel),
            _ => None,
        }
    }

    /// Wire discriminant.
    pub fn as_wire(self) -> i64 {
        match self {
            MessageKind::Call => 0,
            MessageKind::Response => 1,
            MessageKind::Notify => 2,
            MessageKind::Cancel => 3,
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Call => "call",
            MessageKind::Response => "response",
            MessageKind::Notify => "notify",
            MessageKind::Cancel => "cancel",
        }
    }
}
