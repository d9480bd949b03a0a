//! Error wrapping: application/decode errors -> wire-transmissible values.

use std::sync::Arc;

use framerpc_core::{RpcError, Value};

/// Pluggable transform supplied by server configuration.
pub type WrapErrorFn = Arc<dyn Fn(&RpcError) -> Value + Send + Sync>;

/// Wrap an optional error. `None` always maps to `None`.
///
/// Without a configured function the error's display string is sent.
pub fn wrap_error(f: Option<&WrapErrorFn>, err: Option<&RpcError>) -> Option<Value> {
    let err = err?;
    Some(match f {
        Some(f) => f(err),
        None => Value::from(err.to_string()),
    })
}

/// Wrapper producing `{code, desc}` maps with stable codes.
pub fn status_wrap() -> WrapErrorFn {
    Arc::new(|err: &RpcError| {
        Value::Map(vec![
            (Value::from("code"), Value::from(err.code().as_str())),
            (Value::from("desc"), Value::from(err.to_string())),
        ])
    })
}
