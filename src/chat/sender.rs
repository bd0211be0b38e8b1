//! Outbound chat delivery seam.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Delivers rendered responses to chat. The daemon wires in whichever
/// transport the host platform provides.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Prints responses to stdout. Used by `viewerq serve` and the one-shot
/// `viewerq chat` command.
pub struct ConsoleSender;

#[async_trait]
impl ChatSender for ConsoleSender {
    async fn send(&self, message: &str) -> Result<()> {
        println!("[chat] {}", message);
        Ok(())
    }
}

/// Collects responses instead of delivering them. The chat injection
/// endpoint uses this to report what would have been said; tests use it for
/// assertions.
#[derive(Default)]
pub struct BufferSender {
    messages: Mutex<Vec<String>>,
}

impl BufferSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything collected so far.
    pub fn drain(&self) -> Result<Vec<String>> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| Error::Chat("Message buffer lock poisoned".to_string()))?;
        Ok(messages.drain(..).collect())
    }
}

#[async_trait]
impl ChatSender for BufferSender {
    async fn send(&self, message: &str) -> Result<()> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| Error::Chat("Message buffer lock poisoned".to_string()))?;
        messages.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffer_sender_collects_in_order() {
        let sender = BufferSender::new();
        sender.send("first").await.unwrap();
        sender.send("second").await.unwrap();

        assert_eq!(sender.drain().unwrap(), vec!["first", "second"]);
        assert!(sender.drain().unwrap().is_empty());
    }
}
