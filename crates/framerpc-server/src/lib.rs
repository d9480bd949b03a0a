//! framerpc server library entry.
//!
//! This crate wires the framed transport, request variants, serve protocol,
//! handler registry and observability into a server stack. It is consumed
//! by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod obs;
pub mod ops;
pub mod request;
pub mod server;
pub mod services;
pub mod transport;
pub mod wrap;
