//! Top-level facade crate for framerpc.
//!
//! Re-exports the protocol core and the server library so users can depend on a single crate.

pub mod core {
    pub use framerpc_core::*;
}

pub mod server {
    pub use framerpc_server::*;
}
