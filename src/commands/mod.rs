//! Chat command surface - per-queue triggers and the dispatcher.

pub mod binder;
pub mod dispatch;

pub use binder::{command_id, sub_command, trigger_slug, CommandBinder, QueueCommand, SubCommand};
pub use dispatch::{run_binder_sync, ChatDispatcher, ChatSpeaker};
