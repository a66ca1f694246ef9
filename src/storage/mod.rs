//! Storage Layer
//!
//! JSON config persistence. Chat history is owned by the host.

pub mod config;

pub use config::*;
