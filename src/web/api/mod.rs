//! API endpoints module.

pub mod chat;
pub mod events;
pub mod layout;
pub mod queues;

pub use chat::inject_chat;
pub use events::stream_events;
pub use layout::{get_layout, update_layout};
pub use queues::{
    add_viewer, clear_queue, create_queue, delete_queue, get_queue, list_queues, remove_viewer,
    roll_viewer, roll_viewers, toggle_queue, update_queue,
};
