//! Handler descriptions: argument shape plus synchronous handler.
//!
//! A description decodes the next positional value into the handler's
//! argument type on the reading context and hands back an `Invocation` that
//! runs the handler later, on whatever execution unit the serve path picks.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use framerpc_core::protocol::{decode_message, Decoder, Envelope};
use framerpc_core::{DecodeError, HandlerError, Value};

/// Result of a handler call, already in wire form.
pub type HandlerResult = Result<Value, HandlerError>;

type MakeArg = dyn Fn(Value) -> Result<Invocation, DecodeError> + Send + Sync;

/// Deferred handler call bound to its decoded argument.
pub struct Invocation(Box<dyn FnOnce() -> HandlerResult + Send>);

impl Invocation {
    pub fn run(self) -> HandlerResult {
        (self.0)()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invocation")
    }
}

/// Outcome of the lazy argument decode.
#[derive(Debug)]
pub struct DecodedArg {
    /// The raw wire value, if one could be read (kept for logging).
    pub raw: Option<Value>,
    pub invocation: Result<Invocation, DecodeError>,
}

pub struct ServeHandlerDescription {
    make_arg: Box<MakeArg>,
}

impl ServeHandlerDescription {
    /// Describe a typed handler. The argument is decoded into `A`; the result
    /// is converted from `R` into a wire value.
    pub fn new<A, R, F>(handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize,
        F: Fn(A) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self {
            make_arg: Box::new(move |raw: Value| {
                let arg: A = rmpv::ext::from_value(raw)
                    .map_err(|e| DecodeError::Shape(e.to_string()))?;
                let handler = Arc::clone(&handler);
                Ok(Invocation(Box::new(move || {
                    let res = handler(arg)?;
                    rmpv::ext::to_value(res)
                        .map_err(|e| HandlerError::failed(format!("result encode failed: {e}")))
                })))
            }),
        }
    }

    /// Describe a handler taking the raw wire value (any shape accepted).
    pub fn raw<F>(handler: F) -> Self
    where
        F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self {
            make_arg: Box::new(move |raw: Value| {
                let handler = Arc::clone(&handler);
                Ok(Invocation(Box::new(move || handler(raw))))
            }),
        }
    }

    /// Fallback for unregistered methods: always fails with `MethodNotFound`.
    pub fn method_not_found(method: &str) -> Self {
        let method = method.to_owned();
        Self::raw(move |_| Err(HandlerError::MethodNotFound(method.clone())))
    }

    /// Decode the argument (one positional field) and bind the handler to it.
    pub fn get_arg(&self, dec: &mut dyn Decoder, envelope: &mut Envelope) -> DecodedArg {
        match decode_message(dec, envelope) {
            Ok(raw) => DecodedArg {
                invocation: (self.make_arg)(raw.clone()),
                raw: Some(raw),
            },
            Err(e) => DecodedArg {
                raw: None,
                invocation: Err(e),
            },
        }
    }
}

impl fmt::Debug for ServeHandlerDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeHandlerDescription").finish_non_exhaustive()
    }
}
