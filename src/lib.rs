//! Punchbag - fixed-response load target for HTTP front-ends
//!
//! Core library for the connection engine and precomputed responses.

pub mod config;
pub mod http;
pub mod server;
