//! Queue change notifications.

use serde::Serialize;
use tokio::sync::broadcast;

use super::schema::ViewerQueue;

/// Slow subscribers drop old events past this many.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A change to the queue database, broadcast to every subscriber after the
/// change has been persisted.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum QueueEvent {
    QueueAdded { queue: ViewerQueue },
    QueueUpdated { queue: ViewerQueue },
    #[serde(rename_all = "camelCase")]
    QueueDeleted { queue_id: String },
}

pub type EventSender = broadcast::Sender<QueueEvent>;
pub type EventReceiver = broadcast::Receiver<QueueEvent>;

/// Create the event channel. The receiver half can be dropped; subscribers
/// come and go through [`EventSender::subscribe`].
pub fn event_channel() -> (EventSender, EventReceiver) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
