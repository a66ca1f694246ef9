//! Services Layer
//!
//! Business logic for the chat orchestrator and its collaborators.

pub mod chat;
pub mod focus;
pub mod paper_tools;
