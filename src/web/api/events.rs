//! Server-sent event stream of queue changes.
//!
//! The panel subscribes here and re-renders on every queue mutation instead
//! of polling the queue list.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::store::EventReceiver;
use crate::web::AppState;

fn event_stream(receiver: EventReceiver) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => match Event::default().json_data(&event) {
            Ok(event) => Some(Ok(event)),
            Err(error) => {
                warn!("Failed to serialize queue event: {}", error);
                None
            }
        },
        Err(error) => {
            // A lagged subscriber skips events rather than stalling the stream.
            warn!("Queue event stream lagged: {}", error);
            None
        }
    })
}

/// Stream queue events as SSE.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(event_stream(state.store.subscribe())).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{event_channel, QueueEvent};

    #[tokio::test]
    async fn test_stream_forwards_queue_events() {
        let (sender, receiver) = event_channel();
        let mut stream = Box::pin(event_stream(receiver));

        sender
            .send(QueueEvent::QueueDeleted {
                queue_id: "q1".to_string(),
            })
            .unwrap();
        drop(sender);

        let event = stream.next().await;
        assert!(matches!(event, Some(Ok(_))));
        // The sender is gone, so the stream ends.
        assert!(stream.next().await.is_none());
    }
}
