use framerpc_core::Value;

use crate::handler::{HandlerRegistry, ServeHandlerDescription};

/// Echo the argument back unchanged. Useful to prove the call path end to end.
pub fn echo() -> ServeHandlerDescription {
    ServeHandlerDescription::raw(Ok)
}

/// Liveness probe over the RPC channel itself.
pub fn ping() -> ServeHandlerDescription {
    ServeHandlerDescription::raw(|_| Ok(Value::from("pong")))
}

/// Register the built-in methods.
pub fn register_builtins(registry: &HandlerRegistry) {
    registry.register("echo", echo());
    registry.register("ping", ping());
}
