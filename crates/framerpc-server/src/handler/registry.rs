use std::sync::Arc;

use dashmap::DashMap;

use super::ServeHandlerDescription;

/// Method name -> handler description.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<String, Arc<ServeHandlerDescription>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register (or replace) the handler for `method`.
    pub fn register(&self, method: impl Into<String>, desc: ServeHandlerDescription) {
        let method = method.into();
        if self.handlers.insert(method.clone(), Arc::new(desc)).is_some() {
            tracing::warn!(%method, "handler replaced");
        }
    }

    /// Look up `method`, falling back to a description that reports
    /// `MethodNotFound` so calls still receive an error reply.
    pub fn lookup(&self, method: &str) -> Arc<ServeHandlerDescription> {
        match self.handlers.get(method) {
            Some(e) => Arc::clone(e.value()),
            None => Arc::new(ServeHandlerDescription::method_not_found(method)),
        }
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn methods(&self) -> Vec<String> {
        let mut out: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use framerpc_core::{HandlerError, Value};

    use super::*;

    #[test]
    fn registered_methods_are_listed_sorted() {
        let reg = HandlerRegistry::new();
        reg.register("zeta", ServeHandlerDescription::raw(Ok));
        reg.register("alpha", ServeHandlerDescription::raw(|_| Ok(Value::Nil)));

        assert!(reg.contains("alpha"));
        assert!(!reg.contains("beta"));
        assert_eq!(reg.methods(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn missing_method_gets_fallback() {
        let reg = HandlerRegistry::new();
        let desc = reg.lookup("ghost");
        let mut env = framerpc_core::protocol::Envelope::new(1, &[]);
        let mut dec = framerpc_core::protocol::MsgPackDecoder::new(bytes::Bytes::from_static(&[0xc0]));
        let decoded = desc.get_arg(&mut dec, &mut env);
        let outcome = decoded.invocation.map(|inv| inv.run());
        assert!(matches!(
            outcome,
            Ok(Err(HandlerError::MethodNotFound(ref m))) if m == "ghost"
        ));
    }
}
