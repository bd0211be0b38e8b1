//! Web server module (Axum + API) backing the moderator panel.

pub mod api;
pub mod router;
pub mod server;

use std::sync::Arc;

use crate::commands::ChatDispatcher;
use crate::store::StoreHandle;

pub use server::{run_web_server, WebServerConfig};

/// Shared state for every API handler.
#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub dispatcher: Arc<ChatDispatcher>,
}
