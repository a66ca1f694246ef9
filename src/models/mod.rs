//! Data Models

pub mod settings;

pub use settings::*;
