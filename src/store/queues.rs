//! The queue store.
//!
//! Owns the in-memory schema and the persistence collaborator. Every
//! mutation follows the same discipline: mutate, persist, notify once,
//! return. Domain misses (unknown queue, duplicate viewer) are soft results,
//! not errors.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::db::PathStore;
use super::events::{EventSender, QueueEvent};
use super::schema::{DatabaseSchema, Layout, QueueKind, QueueViewer, ViewerQueue};

pub struct QueueStore {
    schema: DatabaseSchema,
    db: Box<dyn PathStore>,
    events: EventSender,
}

impl QueueStore {
    /// Load the store from its backing database, writing an empty schema on
    /// first run.
    pub fn load(mut db: Box<dyn PathStore>, events: EventSender) -> Result<Self> {
        let schema = match db.load()? {
            Some(document) => serde_json::from_value(document)?,
            None => {
                let schema = DatabaseSchema::default();
                db.upsert("/", &serde_json::to_value(&schema)?)?;
                schema
            }
        };

        tracing::info!("Queue store loaded with {} queue(s)", schema.queues.len());
        Ok(Self { schema, db, events })
    }

    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    fn persist_queue(&mut self, queue_id: &str) -> Result<()> {
        let queue = self
            .schema
            .queues
            .get(queue_id)
            .ok_or_else(|| Error::Store(format!("Queue {} missing during persist", queue_id)))?;
        let value = serde_json::to_value(queue)?;
        self.db.upsert(&format!("/queues/{}", queue_id), &value)
    }

    fn notify(&self, event: QueueEvent) {
        // send only fails when nobody is subscribed
        let _ = self.events.send(event);
    }

    /// Create an empty queue with a fresh id.
    pub fn create_queue(&mut self, name: &str, kind: QueueKind, open: bool) -> Result<ViewerQueue> {
        let mut id = Uuid::new_v4().to_string();
        while self.schema.queues.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let queue = ViewerQueue::new(id.clone(), name, kind, open);
        self.schema.queues.insert(id.clone(), queue.clone());
        self.persist_queue(&id)?;

        tracing::info!("Created {} queue '{}' ({})", kind, name, id);
        self.notify(QueueEvent::QueueAdded {
            queue: queue.clone(),
        });
        Ok(queue)
    }

    /// Delete a queue. Returns false if it did not exist.
    pub fn delete_queue(&mut self, queue_id: &str) -> Result<bool> {
        if self.schema.queues.remove(queue_id).is_none() {
            return Ok(false);
        }
        self.db.delete(&format!("/queues/{}", queue_id))?;

        tracing::info!("Deleted queue {}", queue_id);
        self.notify(QueueEvent::QueueDeleted {
            queue_id: queue_id.to_string(),
        });
        Ok(true)
    }

    /// Add a viewer to the back of a queue. Returns false if the queue does
    /// not exist or the viewer is already in it.
    pub fn add_viewer(&mut self, queue_id: &str, viewer: QueueViewer) -> Result<bool> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(false);
        };
        if queue.viewer_index(&viewer.id).is_some() {
            return Ok(false);
        }

        tracing::debug!("Viewer {} joined queue {}", viewer.username, queue_id);
        queue.viewers.push(viewer);
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(true)
    }

    /// Remove a viewer by id. Returns false if the queue or viewer is
    /// missing.
    pub fn remove_viewer(&mut self, queue_id: &str, viewer_id: &str) -> Result<bool> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(false);
        };
        let Some(index) = queue.viewer_index(viewer_id) else {
            return Ok(false);
        };

        queue.viewers.remove(index);
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(true)
    }

    /// Drop every viewer from a queue. Returns false if it did not exist.
    pub fn clear_queue(&mut self, queue_id: &str) -> Result<bool> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(false);
        };

        queue.viewers.clear();
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(true)
    }

    /// Flip a queue between open and closed. Returns the new state, or None
    /// for an unknown queue.
    pub fn toggle_queue(&mut self, queue_id: &str) -> Result<Option<bool>> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(None);
        };

        queue.open = !queue.open;
        let open = queue.open;
        let updated = queue.clone();
        self.persist_queue(queue_id)?;

        tracing::info!(
            "Queue {} is now {}",
            queue_id,
            if open { "open" } else { "closed" }
        );
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(Some(open))
    }

    /// Rename a queue. Returns false if it did not exist.
    pub fn rename_queue(&mut self, queue_id: &str, name: &str) -> Result<bool> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(false);
        };

        queue.name = name.to_string();
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(true)
    }

    /// Change a queue's picking policy. Returns false if it did not exist.
    /// Waiting viewers keep their arrival order.
    pub fn retype_queue(&mut self, queue_id: &str, kind: QueueKind) -> Result<bool> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(false);
        };

        queue.kind = kind;
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(true)
    }

    /// Pick up to `count` viewers according to the queue's policy, removing
    /// them from the queue.
    ///
    /// Returns None for an unknown or empty queue. A non-positive count
    /// picks nobody and leaves the queue untouched.
    pub fn roll_viewers(&mut self, queue_id: &str, count: i64) -> Result<Option<Vec<QueueViewer>>> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(None);
        };
        if queue.viewers.is_empty() {
            return Ok(None);
        }
        if count <= 0 {
            return Ok(Some(Vec::new()));
        }
        let count = count as usize;

        let mut picked: Vec<QueueViewer> = Vec::new();
        match queue.kind {
            QueueKind::Queue => {
                let take = count.min(queue.viewers.len());
                picked.extend(queue.viewers.drain(..take));
            }
            QueueKind::Stack => {
                // Most recent joiner first.
                let take = count.min(queue.viewers.len());
                let start = queue.viewers.len() - take;
                picked.extend(queue.viewers.drain(start..).rev());
            }
            QueueKind::Random => {
                let mut rng = rand::thread_rng();
                for _ in 0..count {
                    if queue.viewers.is_empty() {
                        break;
                    }
                    let index = rng.gen_range(0..queue.viewers.len());
                    picked.push(queue.viewers.remove(index));
                }
            }
        }

        tracing::debug!("Rolled {} viewer(s) from queue {}", picked.len(), queue_id);
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(Some(picked))
    }

    /// Pick one specific viewer out of a queue, removing them. Returns None
    /// if the queue or viewer is missing.
    pub fn roll_viewer(&mut self, queue_id: &str, viewer_id: &str) -> Result<Option<QueueViewer>> {
        let Some(queue) = self.schema.queues.get_mut(queue_id) else {
            return Ok(None);
        };
        let Some(index) = queue.viewer_index(viewer_id) else {
            return Ok(None);
        };

        let viewer = queue.viewers.remove(index);
        let updated = queue.clone();
        self.persist_queue(queue_id)?;
        self.notify(QueueEvent::QueueUpdated { queue: updated });
        Ok(Some(viewer))
    }

    pub fn get_queue(&self, queue_id: &str) -> Option<ViewerQueue> {
        self.schema.queues.get(queue_id).cloned()
    }

    pub fn get_queues(&self) -> HashMap<String, ViewerQueue> {
        self.schema.queues.clone()
    }

    pub fn get_layout(&self) -> Layout {
        self.schema.layout.clone()
    }

    /// Replace the panel layout. Layout changes do not emit queue events.
    pub fn update_layout(&mut self, layout: Layout) -> Result<()> {
        self.schema.layout = layout;
        let value = serde_json::to_value(&self.schema.layout)?;
        self.db.upsert("/layout", &value)
    }
}
