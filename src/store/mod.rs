//! Queue storage - schema, JSON file persistence, and the store task.

pub mod db;
pub mod events;
pub mod handle;
pub mod queues;
pub mod schema;

pub use db::{JsonFileDb, PathStore};
pub use events::{event_channel, EventReceiver, EventSender, QueueEvent};
pub use handle::{spawn_store, StoreHandle};
pub use queues::QueueStore;
pub use schema::{DatabaseSchema, Layout, QueueKind, QueueViewer, ViewerQueue};
