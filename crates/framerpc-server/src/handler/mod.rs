//! Handler descriptions and the method registry.

pub mod description;
pub mod registry;

pub use description::{DecodedArg, HandlerResult, Invocation, ServeHandlerDescription};
pub use registry::HandlerRegistry;
