//! viewerq library root.

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod web;

pub use chat::{ChatSender, CommandTemplates};
pub use cli::Commands;
pub use commands::{run_binder_sync, ChatDispatcher, ChatSpeaker, CommandBinder};
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use store::{
    spawn_store, JsonFileDb, Layout, QueueEvent, QueueKind, QueueStore, QueueViewer, StoreHandle,
    ViewerQueue,
};
pub use web::{run_web_server, AppState};
