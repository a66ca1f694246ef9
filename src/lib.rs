//! Paper Desk
//!
//! Backend of the Paper Desk research assistant: a chat orchestrator that
//! lets a plain text-completion model call host tools through fenced `tool`
//! blocks.
//!
//! - `services::chat` - the turn loop, in collect and streaming form
//! - `services::focus` - resolution of the paper the user has open
//! - `services::paper_tools` - built-in tools
//! - `storage` / `models` - JSON-backed chat settings

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{ChatSettings, SettingsUpdate};
pub use services::chat::{ChatEventStream, ChatRequest, ChatService, ChatStream, TurnResult};
pub use services::focus::{FocusEntity, FocusResolver, NoFocusResolver, StaticFocusResolver};
pub use services::paper_tools::register_builtin_tools;
pub use storage::config::ConfigService;
pub use utils::error::{AppError, AppResult};

// Workspace crates, re-exported for hosts
pub use paper_desk_core;
pub use paper_desk_llm;
pub use paper_desk_tools;
