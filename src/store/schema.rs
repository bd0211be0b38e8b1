//! Queue data model and on-disk schema.
//!
//! Field names follow the JSON the moderator panel already speaks
//! (`displayName`, `avatarUrl`, `type`), so existing database files load
//! unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Error;

/// A chat viewer waiting in a queue.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueViewer {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
}

/// Picking policy for a queue.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Queue,
    Stack,
    Random,
}

impl Default for QueueKind {
    fn default() -> Self {
        QueueKind::Queue
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Queue => write!(f, "queue"),
            QueueKind::Stack => write!(f, "stack"),
            QueueKind::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for QueueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "queue" => Ok(QueueKind::Queue),
            "stack" => Ok(QueueKind::Stack),
            "random" => Ok(QueueKind::Random),
            other => Err(Error::Other(format!(
                "Unknown queue type '{}' (expected queue, stack, or random)",
                other
            ))),
        }
    }
}

/// A named viewer queue.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ViewerQueue {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: QueueKind,
    pub viewers: Vec<QueueViewer>,
    pub open: bool,
}

impl ViewerQueue {
    /// Create an empty queue.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: QueueKind,
        open: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            viewers: Vec::new(),
            open,
        }
    }

    /// Zero-based position of a viewer, by viewer id.
    pub fn viewer_index(&self, viewer_id: &str) -> Option<usize> {
        self.viewers.iter().position(|v| v.id == viewer_id)
    }
}

/// Moderator panel layout proportions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub queues_table: String,
    pub viewer_list: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            queues_table: "50%".to_string(),
            viewer_list: "50%".to_string(),
        }
    }
}

/// The full database document.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DatabaseSchema {
    #[serde(default)]
    pub queues: HashMap<String, ViewerQueue>,
    #[serde(default)]
    pub layout: Layout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("queue".parse::<QueueKind>().unwrap(), QueueKind::Queue);
        assert_eq!("STACK".parse::<QueueKind>().unwrap(), QueueKind::Stack);
        assert_eq!("Random".parse::<QueueKind>().unwrap(), QueueKind::Random);
        assert!("lifo".parse::<QueueKind>().is_err());
    }

    #[test]
    fn test_queue_json_shape() {
        let mut queue = ViewerQueue::new("q1", "Duo Queue", QueueKind::Stack, false);
        queue.viewers.push(QueueViewer {
            id: "42".to_string(),
            username: "dennis".to_string(),
            display_name: "Dennis".to_string(),
            avatar_url: "https://example.com/dennis.png".to_string(),
        });

        let json = serde_json::to_value(&queue).unwrap();
        assert_eq!(json["type"], "stack");
        assert_eq!(json["open"], false);
        assert_eq!(json["viewers"][0]["displayName"], "Dennis");
        assert_eq!(json["viewers"][0]["avatarUrl"], "https://example.com/dennis.png");

        let back: ViewerQueue = serde_json::from_value(json).unwrap();
        assert_eq!(back, queue);
    }

    #[test]
    fn test_schema_defaults() {
        let schema: DatabaseSchema = serde_json::from_str("{}").unwrap();
        assert!(schema.queues.is_empty());
        assert_eq!(schema.layout.queues_table, "50%");
        assert_eq!(schema.layout.viewer_list, "50%");
    }

    #[test]
    fn test_viewer_index() {
        let mut queue = ViewerQueue::new("q1", "Main", QueueKind::Queue, false);
        for i in 0..3 {
            queue.viewers.push(QueueViewer {
                id: i.to_string(),
                username: format!("user{}", i),
                display_name: format!("User {}", i),
                avatar_url: String::new(),
            });
        }

        assert_eq!(queue.viewer_index("0"), Some(0));
        assert_eq!(queue.viewer_index("2"), Some(2));
        assert_eq!(queue.viewer_index("9"), None);
    }
}
