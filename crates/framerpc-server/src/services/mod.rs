//! Built-in methods registered by the server binary.

pub mod builtin;

pub use builtin::register_builtins;
