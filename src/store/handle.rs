//! Store task and handle.
//!
//! Every surface (chat dispatcher, web API, CLI) talks to one store task
//! through a cloneable [`StoreHandle`]. The task applies requests strictly
//! in arrival order and replies only after the change hit disk, so no two
//! mutations ever interleave.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

use super::events::{EventReceiver, EventSender};
use super::queues::QueueStore;
use super::schema::{Layout, QueueKind, QueueViewer, ViewerQueue};

const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Requests handled by the store task.
pub enum StoreRequest {
    CreateQueue {
        name: String,
        kind: QueueKind,
        open: bool,
        reply: oneshot::Sender<Result<ViewerQueue>>,
    },
    DeleteQueue {
        queue_id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    AddViewer {
        queue_id: String,
        viewer: QueueViewer,
        reply: oneshot::Sender<Result<bool>>,
    },
    RemoveViewer {
        queue_id: String,
        viewer_id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    ClearQueue {
        queue_id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    ToggleQueue {
        queue_id: String,
        reply: oneshot::Sender<Result<Option<bool>>>,
    },
    RenameQueue {
        queue_id: String,
        name: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    RetypeQueue {
        queue_id: String,
        kind: QueueKind,
        reply: oneshot::Sender<Result<bool>>,
    },
    RollViewers {
        queue_id: String,
        count: i64,
        reply: oneshot::Sender<Result<Option<Vec<QueueViewer>>>>,
    },
    RollViewer {
        queue_id: String,
        viewer_id: String,
        reply: oneshot::Sender<Result<Option<QueueViewer>>>,
    },
    GetQueue {
        queue_id: String,
        reply: oneshot::Sender<Option<ViewerQueue>>,
    },
    GetQueues {
        reply: oneshot::Sender<HashMap<String, ViewerQueue>>,
    },
    GetLayout {
        reply: oneshot::Sender<Layout>,
    },
    UpdateLayout {
        layout: Layout,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Spawn the store task and return the handle every surface shares.
pub fn spawn_store(store: QueueStore) -> StoreHandle {
    let events = store.event_sender();
    let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
    tokio::spawn(run_store(store, rx));

    StoreHandle { tx, events }
}

/// Run the store task until every handle is dropped.
pub async fn run_store(mut store: QueueStore, mut requests: mpsc::Receiver<StoreRequest>) {
    while let Some(request) = requests.recv().await {
        handle_request(&mut store, request);
    }
    tracing::debug!("Queue store task stopped");
}

fn handle_request(store: &mut QueueStore, request: StoreRequest) {
    // A dropped reply means the caller gave up; nothing to do about it.
    match request {
        StoreRequest::CreateQueue {
            name,
            kind,
            open,
            reply,
        } => {
            let _ = reply.send(store.create_queue(&name, kind, open));
        }
        StoreRequest::DeleteQueue { queue_id, reply } => {
            let _ = reply.send(store.delete_queue(&queue_id));
        }
        StoreRequest::AddViewer {
            queue_id,
            viewer,
            reply,
        } => {
            let _ = reply.send(store.add_viewer(&queue_id, viewer));
        }
        StoreRequest::RemoveViewer {
            queue_id,
            viewer_id,
            reply,
        } => {
            let _ = reply.send(store.remove_viewer(&queue_id, &viewer_id));
        }
        StoreRequest::ClearQueue { queue_id, reply } => {
            let _ = reply.send(store.clear_queue(&queue_id));
        }
        StoreRequest::ToggleQueue { queue_id, reply } => {
            let _ = reply.send(store.toggle_queue(&queue_id));
        }
        StoreRequest::RenameQueue {
            queue_id,
            name,
            reply,
        } => {
            let _ = reply.send(store.rename_queue(&queue_id, &name));
        }
        StoreRequest::RetypeQueue {
            queue_id,
            kind,
            reply,
        } => {
            let _ = reply.send(store.retype_queue(&queue_id, kind));
        }
        StoreRequest::RollViewers {
            queue_id,
            count,
            reply,
        } => {
            let _ = reply.send(store.roll_viewers(&queue_id, count));
        }
        StoreRequest::RollViewer {
            queue_id,
            viewer_id,
            reply,
        } => {
            let _ = reply.send(store.roll_viewer(&queue_id, &viewer_id));
        }
        StoreRequest::GetQueue { queue_id, reply } => {
            let _ = reply.send(store.get_queue(&queue_id));
        }
        StoreRequest::GetQueues { reply } => {
            let _ = reply.send(store.get_queues());
        }
        StoreRequest::GetLayout { reply } => {
            let _ = reply.send(store.get_layout());
        }
        StoreRequest::UpdateLayout { layout, reply } => {
            let _ = reply.send(store.update_layout(layout));
        }
    }
}

/// Cloneable handle to the store task.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreRequest>,
    events: EventSender,
}

impl StoreHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> StoreRequest,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| Error::Store("Queue store task is not running".to_string()))?;
        reply_rx
            .await
            .map_err(|_| Error::Store("Queue store task dropped the request".to_string()))
    }

    /// Subscribe to queue change events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub async fn create_queue(
        &self,
        name: &str,
        kind: QueueKind,
        open: bool,
    ) -> Result<ViewerQueue> {
        let name = name.to_string();
        self.request(|reply| StoreRequest::CreateQueue {
            name,
            kind,
            open,
            reply,
        })
        .await?
    }

    pub async fn delete_queue(&self, queue_id: &str) -> Result<bool> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::DeleteQueue { queue_id, reply })
            .await?
    }

    pub async fn add_viewer(&self, queue_id: &str, viewer: QueueViewer) -> Result<bool> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::AddViewer {
            queue_id,
            viewer,
            reply,
        })
        .await?
    }

    pub async fn remove_viewer(&self, queue_id: &str, viewer_id: &str) -> Result<bool> {
        let queue_id = queue_id.to_string();
        let viewer_id = viewer_id.to_string();
        self.request(|reply| StoreRequest::RemoveViewer {
            queue_id,
            viewer_id,
            reply,
        })
        .await?
    }

    pub async fn clear_queue(&self, queue_id: &str) -> Result<bool> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::ClearQueue { queue_id, reply })
            .await?
    }

    pub async fn toggle_queue(&self, queue_id: &str) -> Result<Option<bool>> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::ToggleQueue { queue_id, reply })
            .await?
    }

    pub async fn rename_queue(&self, queue_id: &str, name: &str) -> Result<bool> {
        let queue_id = queue_id.to_string();
        let name = name.to_string();
        self.request(|reply| StoreRequest::RenameQueue {
            queue_id,
            name,
            reply,
        })
        .await?
    }

    pub async fn retype_queue(&self, queue_id: &str, kind: QueueKind) -> Result<bool> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::RetypeQueue {
            queue_id,
            kind,
            reply,
        })
        .await?
    }

    pub async fn roll_viewers(
        &self,
        queue_id: &str,
        count: i64,
    ) -> Result<Option<Vec<QueueViewer>>> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::RollViewers {
            queue_id,
            count,
            reply,
        })
        .await?
    }

    pub async fn roll_viewer(
        &self,
        queue_id: &str,
        viewer_id: &str,
    ) -> Result<Option<QueueViewer>> {
        let queue_id = queue_id.to_string();
        let viewer_id = viewer_id.to_string();
        self.request(|reply| StoreRequest::RollViewer {
            queue_id,
            viewer_id,
            reply,
        })
        .await?
    }

    pub async fn get_queue(&self, queue_id: &str) -> Result<Option<ViewerQueue>> {
        let queue_id = queue_id.to_string();
        self.request(|reply| StoreRequest::GetQueue { queue_id, reply })
            .await
    }

    pub async fn get_queues(&self) -> Result<HashMap<String, ViewerQueue>> {
        self.request(|reply| StoreRequest::GetQueues { reply }).await
    }

    pub async fn get_layout(&self) -> Result<Layout> {
        self.request(|reply| StoreRequest::GetLayout { reply }).await
    }

    pub async fn update_layout(&self, layout: Layout) -> Result<()> {
        self.request(|reply| StoreRequest::UpdateLayout { layout, reply })
            .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::db::JsonFileDb;
    use crate::store::events::{event_channel, QueueEvent};
    use tempfile::TempDir;

    fn viewer(id: &str) -> QueueViewer {
        QueueViewer {
            id: id.to_string(),
            username: format!("user{}", id),
            display_name: format!("User {}", id),
            avatar_url: String::new(),
        }
    }

    fn spawn_test_store(dir: &TempDir) -> StoreHandle {
        let (events, _) = event_channel();
        let db = JsonFileDb::new(dir.path().join("queues.json"));
        let store = QueueStore::load(Box::new(db), events).unwrap();
        spawn_store(store)
    }

    #[tokio::test]
    async fn test_handle_roundtrip() {
        let dir = TempDir::new().unwrap();
        let handle = spawn_test_store(&dir);

        let queue = handle.create_queue("Main", QueueKind::Queue, false).await.unwrap();
        assert!(handle.add_viewer(&queue.id, viewer("1")).await.unwrap());
        assert!(!handle.add_viewer(&queue.id, viewer("1")).await.unwrap());
        assert_eq!(handle.toggle_queue(&queue.id).await.unwrap(), Some(true));

        let fetched = handle.get_queue(&queue.id).await.unwrap().unwrap();
        assert!(fetched.open);
        assert_eq!(fetched.viewers.len(), 1);

        assert!(handle.delete_queue(&queue.id).await.unwrap());
        assert!(handle.get_queue(&queue.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_handle_events() {
        let dir = TempDir::new().unwrap();
        let handle = spawn_test_store(&dir);
        let mut events = handle.subscribe();

        let queue = handle.create_queue("Main", QueueKind::Queue, false).await.unwrap();
        handle.add_viewer(&queue.id, viewer("1")).await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            QueueEvent::QueueAdded { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            QueueEvent::QueueUpdated { .. }
        ));
    }

    #[tokio::test]
    async fn test_handle_shared_across_tasks() {
        let dir = TempDir::new().unwrap();
        let handle = spawn_test_store(&dir);
        let queue = handle.create_queue("Main", QueueKind::Queue, false).await.unwrap();

        let mut joins = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            let queue_id = queue.id.clone();
            joins.push(tokio::spawn(async move {
                handle.add_viewer(&queue_id, viewer(&i.to_string())).await
            }));
        }
        for join in joins {
            assert!(join.await.unwrap().unwrap());
        }

        let fetched = handle.get_queue(&queue.id).await.unwrap().unwrap();
        assert_eq!(fetched.viewers.len(), 8);
    }

    #[tokio::test]
    async fn test_layout_through_handle() {
        let dir = TempDir::new().unwrap();
        let handle = spawn_test_store(&dir);

        assert_eq!(handle.get_layout().await.unwrap(), Layout::default());
        handle
            .update_layout(Layout {
                queues_table: "60%".to_string(),
                viewer_list: "40%".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(handle.get_layout().await.unwrap().queues_table, "60%");
    }
}
