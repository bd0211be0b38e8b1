//! Chat line dispatcher.
//!
//! Resolves the trigger word against the binder, loads the queue, and runs
//! the matched subcommand against the store. Every response goes through
//! the templates; mutations reach the store before their confirmation is
//! sent.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;

use crate::chat::{normalize_username, render_template, ChatSender, CommandTemplates};
use crate::error::Result;
use crate::store::{QueueKind, QueueViewer, StoreHandle, ViewerQueue};

use super::binder::{sub_command, CommandBinder, SubCommand};

/// The chat user a message came from.
#[derive(Clone, Debug)]
pub struct ChatSpeaker {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    /// Moderator or broadcaster.
    pub elevated: bool,
}

impl ChatSpeaker {
    fn as_viewer(&self) -> QueueViewer {
        QueueViewer {
            id: self.id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    fn chat_name(&self) -> String {
        normalize_username(&self.username, &self.display_name)
    }
}

fn queue_status(queue: &ViewerQueue) -> String {
    if queue.open { "Open" } else { "Closed" }.to_string()
}

fn join_users(viewers: &[QueueViewer]) -> String {
    viewers
        .iter()
        .map(|v| normalize_username(&v.username, &v.display_name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ensure_allowed(speaker: &ChatSpeaker, trigger: &str, sub: &SubCommand) -> bool {
    if !sub.elevated || speaker.elevated {
        return true;
    }
    tracing::debug!(
        "Ignoring {} {} from non-moderator {}",
        trigger,
        sub.arg,
        speaker.username
    );
    false
}

/// Dispatches chat lines to queue subcommands.
pub struct ChatDispatcher {
    store: StoreHandle,
    templates: CommandTemplates,
    binder: Arc<RwLock<CommandBinder>>,
}

impl ChatDispatcher {
    pub fn new(
        store: StoreHandle,
        templates: CommandTemplates,
        binder: Arc<RwLock<CommandBinder>>,
    ) -> Self {
        Self {
            store,
            templates,
            binder,
        }
    }

    /// Bind commands for every queue already in the store. Returns how many
    /// are bound afterwards.
    pub async fn bind_existing(&self) -> Result<usize> {
        let queues = self.store.get_queues().await?;
        let mut binder = self.binder.write().await;
        for queue in queues.values() {
            binder.bind(queue);
        }
        Ok(binder.len())
    }

    /// Handle one chat line. Returns false when the line does not start
    /// with a bound trigger.
    pub async fn dispatch(
        &self,
        line: &str,
        speaker: &ChatSpeaker,
        sender: &dyn ChatSender,
    ) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(trigger) = parts.next() else {
            return Ok(false);
        };

        let queue_id = {
            let binder = self.binder.read().await;
            match binder.resolve(trigger) {
                Some(command) => command.queue_id.clone(),
                None => return Ok(false),
            }
        };

        let Some(queue) = self.store.get_queue(&queue_id).await? else {
            tracing::error!(
                "Trigger {} is bound to queue {} but the queue is gone",
                trigger,
                queue_id
            );
            return Ok(true);
        };

        let Some(token) = parts.next() else {
            self.cmd_base(&queue, speaker, sender).await?;
            return Ok(true);
        };

        // Anything outside the subcommand table reads as the base command.
        let Some(sub) = sub_command(&token.to_lowercase()) else {
            self.cmd_base(&queue, speaker, sender).await?;
            return Ok(true);
        };
        if !ensure_allowed(speaker, trigger, sub) {
            return Ok(true);
        }

        match sub.arg {
            "join" => self.cmd_join(&queue, speaker, sender).await?,
            "position" => self.cmd_position(&queue, speaker, sender).await?,
            "leave" => self.cmd_leave(&queue, speaker, sender).await?,
            "clear" => self.cmd_clear(&queue, sender).await?,
            "pick" => self.cmd_pick(&queue, parts.next(), sender).await?,
            "open" => self.cmd_open(&queue, sender).await?,
            "close" => self.cmd_close(&queue, sender).await?,
            other => tracing::error!("Subcommand {} has no handler", other),
        }

        Ok(true)
    }

    async fn say(
        &self,
        sender: &dyn ChatSender,
        template: &str,
        variables: Vec<(&str, String)>,
    ) -> Result<()> {
        if let Some(message) = render_template(template, &variables) {
            sender.send(&message).await?;
        }
        Ok(())
    }

    async fn queue_length(&self, queue_id: &str) -> Result<usize> {
        Ok(self
            .store
            .get_queue(queue_id)
            .await?
            .map_or(0, |q| q.viewers.len()))
    }

    async fn cmd_base(
        &self,
        queue: &ViewerQueue,
        speaker: &ChatSpeaker,
        sender: &dyn ChatSender,
    ) -> Result<()> {
        let t = &self.templates;
        match queue.viewer_index(&speaker.id) {
            None => {
                self.say(
                    sender,
                    &t.base_command_not_joined_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queueLength", queue.viewers.len().to_string()),
                        ("queueStatus", queue_status(queue)),
                    ],
                )
                .await
            }
            Some(_) if queue.kind == QueueKind::Random => {
                self.say(
                    sender,
                    &t.base_command_joined_random_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queueLength", queue.viewers.len().to_string()),
                        ("queueStatus", queue_status(queue)),
                    ],
                )
                .await
            }
            Some(index) => {
                self.say(
                    sender,
                    &t.base_command_joined_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queuePosition", (index + 1).to_string()),
                        ("queuePeopleAhead", index.to_string()),
                        ("queueLength", queue.viewers.len().to_string()),
                        ("queueStatus", queue_status(queue)),
                    ],
                )
                .await
            }
        }
    }

    async fn cmd_join(
        &self,
        queue: &ViewerQueue,
        speaker: &ChatSpeaker,
        sender: &dyn ChatSender,
    ) -> Result<()> {
        let t = &self.templates;
        match queue.viewer_index(&speaker.id) {
            None => {
                // The closed gate only applies to viewers not yet in the
                // queue; members always get the already-joined response.
                if !queue.open {
                    return self
                        .say(
                            sender,
                            &t.join_command_closed_template,
                            vec![
                                ("username", speaker.chat_name()),
                                ("queueName", queue.name.clone()),
                            ],
                        )
                        .await;
                }

                self.store.add_viewer(&queue.id, speaker.as_viewer()).await?;

                // Position and length reflect the queue after joining.
                let length = self
                    .store
                    .get_queue(&queue.id)
                    .await?
                    .map_or(queue.viewers.len() + 1, |q| q.viewers.len());

                if queue.kind == QueueKind::Random {
                    return self
                        .say(
                            sender,
                            &t.join_command_joined_random_template,
                            vec![
                                ("username", speaker.chat_name()),
                                ("queueName", queue.name.clone()),
                                ("queueLength", length.to_string()),
                            ],
                        )
                        .await;
                }

                self.say(
                    sender,
                    &t.join_command_joined_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queuePosition", length.to_string()),
                        ("queuePeopleAhead", length.saturating_sub(1).to_string()),
                        ("queueLength", length.to_string()),
                    ],
                )
                .await
            }
            Some(_) if queue.kind == QueueKind::Random => {
                self.say(
                    sender,
                    &t.join_command_already_joined_random_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queueLength", queue.viewers.len().to_string()),
                    ],
                )
                .await
            }
            Some(index) => {
                self.say(
                    sender,
                    &t.join_command_already_joined_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queuePosition", (index + 1).to_string()),
                        ("queuePeopleAhead", index.to_string()),
                        ("queueLength", queue.viewers.len().to_string()),
                    ],
                )
                .await
            }
        }
    }

    async fn cmd_position(
        &self,
        queue: &ViewerQueue,
        speaker: &ChatSpeaker,
        sender: &dyn ChatSender,
    ) -> Result<()> {
        let t = &self.templates;
        match queue.viewer_index(&speaker.id) {
            None => {
                self.say(
                    sender,
                    &t.position_command_not_joined_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queueLength", queue.viewers.len().to_string()),
                        ("queueStatus", queue_status(queue)),
                    ],
                )
                .await
            }
            Some(_) if queue.kind == QueueKind::Random => {
                self.say(
                    sender,
                    &t.position_command_is_random_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queueLength", queue.viewers.len().to_string()),
                        ("queueStatus", queue_status(queue)),
                    ],
                )
                .await
            }
            Some(index) => {
                self.say(
                    sender,
                    &t.position_command_position_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                        ("queuePosition", (index + 1).to_string()),
                        ("queuePeopleAhead", index.to_string()),
                        ("queueLength", queue.viewers.len().to_string()),
                        ("queueStatus", queue_status(queue)),
                    ],
                )
                .await
            }
        }
    }

    async fn cmd_leave(
        &self,
        queue: &ViewerQueue,
        speaker: &ChatSpeaker,
        sender: &dyn ChatSender,
    ) -> Result<()> {
        let t = &self.templates;
        if queue.viewer_index(&speaker.id).is_none() {
            return self
                .say(
                    sender,
                    &t.leave_command_not_joined_template,
                    vec![
                        ("username", speaker.chat_name()),
                        ("queueName", queue.name.clone()),
                    ],
                )
                .await;
        }

        self.store.remove_viewer(&queue.id, &speaker.id).await?;
        let length = self.queue_length(&queue.id).await?;

        self.say(
            sender,
            &t.leave_command_left_template,
            vec![
                ("username", speaker.chat_name()),
                ("queueName", queue.name.clone()),
                ("queueLength", length.to_string()),
            ],
        )
        .await
    }

    async fn cmd_clear(&self, queue: &ViewerQueue, sender: &dyn ChatSender) -> Result<()> {
        self.store.clear_queue(&queue.id).await?;
        self.say(
            sender,
            &self.templates.clear_command_cleared_template,
            vec![("queueName", queue.name.clone())],
        )
        .await
    }

    async fn cmd_pick(
        &self,
        queue: &ViewerQueue,
        count_arg: Option<&str>,
        sender: &dyn ChatSender,
    ) -> Result<()> {
        let t = &self.templates;
        if queue.viewers.is_empty() {
            return self
                .say(
                    sender,
                    &t.pick_command_no_viewers_template,
                    vec![("queueName", queue.name.clone())],
                )
                .await;
        }

        // Missing or unparseable counts pick one viewer.
        let count: i64 = count_arg.and_then(|a| a.parse().ok()).unwrap_or(1);

        if !t.pick_command_auto_split_message {
            let picked = self
                .store
                .roll_viewers(&queue.id, count)
                .await?
                .unwrap_or_default();
            let length = self.queue_length(&queue.id).await?;
            return self
                .say(
                    sender,
                    &t.pick_command_picked_template,
                    vec![
                        ("users", join_users(&picked)),
                        ("queueName", queue.name.clone()),
                        ("queueLength", length.to_string()),
                    ],
                )
                .await;
        }

        let split = t.pick_command_auto_split_count.max(1);
        let mut picked_count: i64 = 0;
        loop {
            let amount = split.min(count - picked_count);
            let picked = self
                .store
                .roll_viewers(&queue.id, amount)
                .await?
                .unwrap_or_default();
            let length = self.queue_length(&queue.id).await?;
            self.say(
                sender,
                &t.pick_command_picked_template,
                vec![
                    ("users", join_users(&picked)),
                    ("queueName", queue.name.clone()),
                    ("queueLength", length.to_string()),
                ],
            )
            .await?;

            picked_count += amount;
            if picked_count >= count || length == 0 {
                break;
            }
        }
        Ok(())
    }

    async fn cmd_open(&self, queue: &ViewerQueue, sender: &dyn ChatSender) -> Result<()> {
        let t = &self.templates;
        if queue.open {
            return self
                .say(
                    sender,
                    &t.open_command_already_open_template,
                    vec![("queueName", queue.name.clone())],
                )
                .await;
        }

        self.store.toggle_queue(&queue.id).await?;
        self.say(
            sender,
            &t.open_command_opened_template,
            vec![("queueName", queue.name.clone())],
        )
        .await
    }

    async fn cmd_close(&self, queue: &ViewerQueue, sender: &dyn ChatSender) -> Result<()> {
        let t = &self.templates;
        if !queue.open {
            return self
                .say(
                    sender,
                    &t.close_command_already_closed_template,
                    vec![("queueName", queue.name.clone())],
                )
                .await;
        }

        self.store.toggle_queue(&queue.id).await?;
        self.say(
            sender,
            &t.close_command_closed_template,
            vec![("queueName", queue.name.clone())],
        )
        .await
    }
}

/// Keep a shared binder in step with queue changes. Runs until the store
/// task stops. A lagged subscription triggers a full resync.
pub async fn run_binder_sync(store: StoreHandle, binder: Arc<RwLock<CommandBinder>>) {
    let mut events = store.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => binder.write().await.apply_event(&event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Command binder missed {} queue event(s), resyncing", skipped);
                match store.get_queues().await {
                    Ok(queues) => {
                        let mut binder = binder.write().await;
                        binder.reset();
                        for queue in queues.values() {
                            binder.bind(queue);
                        }
                    }
                    Err(e) => tracing::error!("Command binder resync failed: {}", e),
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::debug!("Command binder sync stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::BufferSender;
    use crate::store::{event_channel, spawn_store, JsonFileDb, QueueStore};
    use tempfile::TempDir;

    fn speaker(id: &str, elevated: bool) -> ChatSpeaker {
        ChatSpeaker {
            id: id.to_string(),
            username: format!("user{}", id),
            display_name: format!("User {}", id),
            avatar_url: String::new(),
            elevated,
        }
    }

    fn dennis() -> ChatSpeaker {
        ChatSpeaker {
            id: "42".to_string(),
            username: "dennis".to_string(),
            display_name: "Dennis".to_string(),
            avatar_url: String::new(),
            elevated: false,
        }
    }

    async fn setup(dir: &TempDir) -> (ChatDispatcher, StoreHandle) {
        let (events, _) = event_channel();
        let db = JsonFileDb::new(dir.path().join("queues.json"));
        let store = QueueStore::load(Box::new(db), events).unwrap();
        let handle = spawn_store(store);

        let binder = Arc::new(RwLock::new(CommandBinder::new("!")));
        let dispatcher = ChatDispatcher::new(handle.clone(), CommandTemplates::default(), binder);
        (dispatcher, handle)
    }

    /// Create an open queue and bind its command.
    async fn open_queue(
        dispatcher: &ChatDispatcher,
        handle: &StoreHandle,
        name: &str,
        kind: QueueKind,
    ) -> String {
        let queue = handle.create_queue(name, kind, true).await.unwrap();
        dispatcher.bind_existing().await.unwrap();
        queue.id
    }

    #[tokio::test]
    async fn test_unbound_trigger_is_ignored() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, _handle) = setup(&dir).await;
        let sender = BufferSender::new();

        assert!(!dispatcher
            .dispatch("!nothing join", &dennis(), &sender)
            .await
            .unwrap());
        assert!(!dispatcher.dispatch("", &dennis(), &sender).await.unwrap());
        assert!(sender.drain().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_join_then_position_then_leave() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let _queue_id = open_queue(&dispatcher, &handle, "Duo Queue", QueueKind::Queue).await;
        let sender = BufferSender::new();
        let dennis = dennis();

        assert!(dispatcher
            .dispatch("!duo-queue join", &dennis, &sender)
            .await
            .unwrap());
        assert_eq!(
            sender.drain().unwrap(),
            vec!["You have joined the queue, Dennis! You are currently #1/1."]
        );

        dispatcher
            .dispatch("!duo-queue position", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["Your position in the queue is #1/1, Dennis."]
        );

        dispatcher
            .dispatch("!duo-queue leave", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["You have successfully left the queue, Dennis."]
        );

        let queue = handle.get_queues().await.unwrap();
        assert!(queue.values().next().unwrap().viewers.is_empty());
    }

    #[tokio::test]
    async fn test_join_when_closed() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let queue = handle.create_queue("Snipes", QueueKind::Queue, false).await.unwrap();
        dispatcher.bind_existing().await.unwrap();
        let sender = BufferSender::new();

        dispatcher
            .dispatch("!snipes join", &dennis(), &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["Sorry Dennis, the queue is currently closed."]
        );
        assert!(handle
            .get_queue(&queue.id)
            .await
            .unwrap()
            .unwrap()
            .viewers
            .is_empty());
    }

    #[tokio::test]
    async fn test_member_of_closed_queue_gets_already_joined() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let queue_id = open_queue(&dispatcher, &handle, "Snipes", QueueKind::Queue).await;
        let sender = BufferSender::new();
        let dennis = dennis();

        dispatcher
            .dispatch("!snipes join", &dennis, &sender)
            .await
            .unwrap();
        sender.drain().unwrap();

        // Close the queue with the member still inside.
        handle.toggle_queue(&queue_id).await.unwrap();

        dispatcher
            .dispatch("!snipes join", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["You are already in the queue, Dennis! You are currently #1/1."]
        );
    }

    #[tokio::test]
    async fn test_base_command_variants() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let _queue_id = open_queue(&dispatcher, &handle, "Games", QueueKind::Queue).await;
        let sender = BufferSender::new();
        let dennis = dennis();

        dispatcher.dispatch("!games", &dennis, &sender).await.unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["The queue is currently Open and there are 0 people in the queue."]
        );

        dispatcher
            .dispatch("!games join", &dennis, &sender)
            .await
            .unwrap();
        sender.drain().unwrap();

        dispatcher.dispatch("!games", &dennis, &sender).await.unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["The queue is currently Open and you are #1/1 in the queue."]
        );

        // Unknown subcommands read as the base command.
        dispatcher
            .dispatch("!games banana", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["The queue is currently Open and you are #1/1 in the queue."]
        );
    }

    #[tokio::test]
    async fn test_random_queue_hides_positions() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let _queue_id = open_queue(&dispatcher, &handle, "Raffle", QueueKind::Random).await;
        let sender = BufferSender::new();
        let dennis = dennis();

        dispatcher
            .dispatch("!raffle join", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["You have joined the queue, Dennis! There are currently 1 people in the queue."]
        );

        dispatcher
            .dispatch("!raffle position", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["You are currently in the queue, Dennis."]
        );

        dispatcher
            .dispatch("!raffle join", &dennis, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["You are already in the queue, Dennis!"]
        );
    }

    #[tokio::test]
    async fn test_moderator_gate() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let queue_id = open_queue(&dispatcher, &handle, "Games", QueueKind::Queue).await;
        let sender = BufferSender::new();

        for i in 0..3 {
            dispatcher
                .dispatch("!games join", &speaker(&i.to_string(), false), &sender)
                .await
                .unwrap();
        }
        sender.drain().unwrap();

        // Viewers cannot pick, open, or close.
        for line in ["!games pick", "!games open", "!games close"] {
            dispatcher
                .dispatch(line, &speaker("0", false), &sender)
                .await
                .unwrap();
        }
        assert!(sender.drain().unwrap().is_empty());
        assert_eq!(
            handle.get_queue(&queue_id).await.unwrap().unwrap().viewers.len(),
            3
        );

        // Anyone may clear (matching the stock permission table).
        dispatcher
            .dispatch("!games clear", &speaker("0", false), &sender)
            .await
            .unwrap();
        assert_eq!(sender.drain().unwrap(), vec!["The queue has been cleared."]);
    }

    #[tokio::test]
    async fn test_pick_announces_and_removes() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let queue_id = open_queue(&dispatcher, &handle, "Games", QueueKind::Queue).await;
        let sender = BufferSender::new();
        let moderator = speaker("99", true);

        for i in 0..2 {
            dispatcher
                .dispatch("!games join", &speaker(&i.to_string(), false), &sender)
                .await
                .unwrap();
        }
        sender.drain().unwrap();

        dispatcher
            .dispatch("!games pick", &moderator, &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["User 0 (user0), you're up next! There are 1 people remaining in the queue."]
        );
        assert_eq!(
            handle.get_queue(&queue_id).await.unwrap().unwrap().viewers.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_pick_auto_split() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let _queue_id = open_queue(&dispatcher, &handle, "Games", QueueKind::Queue).await;
        let sender = BufferSender::new();
        let moderator = speaker("99", true);

        for i in 0..7 {
            dispatcher
                .dispatch("!games join", &speaker(&i.to_string(), false), &sender)
                .await
                .unwrap();
        }
        sender.drain().unwrap();

        // Default split size is 3, so 7 picks means messages of 3, 3, 1.
        dispatcher
            .dispatch("!games pick 7", &moderator, &sender)
            .await
            .unwrap();
        let messages = sender.drain().unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("User 0 (user0), User 1 (user1), User 2 (user2),"));
        assert!(messages[2].starts_with("User 6 (user6),"));
        assert!(messages[2].contains("There are 0 people remaining"));
    }

    #[tokio::test]
    async fn test_pick_empty_queue() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let _queue_id = open_queue(&dispatcher, &handle, "Games", QueueKind::Queue).await;
        let sender = BufferSender::new();

        dispatcher
            .dispatch("!games pick 5", &speaker("99", true), &sender)
            .await
            .unwrap();
        assert_eq!(
            sender.drain().unwrap(),
            vec!["There is nobody in the queue to pick from."]
        );
    }

    #[tokio::test]
    async fn test_pick_bad_count_falls_back_to_one() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let queue_id = open_queue(&dispatcher, &handle, "Games", QueueKind::Queue).await;
        let sender = BufferSender::new();

        for i in 0..3 {
            dispatcher
                .dispatch("!games join", &speaker(&i.to_string(), false), &sender)
                .await
                .unwrap();
        }
        sender.drain().unwrap();

        dispatcher
            .dispatch("!games pick banana", &speaker("99", true), &sender)
            .await
            .unwrap();
        assert_eq!(sender.drain().unwrap().len(), 1);
        assert_eq!(
            handle.get_queue(&queue_id).await.unwrap().unwrap().viewers.len(),
            2
        );
    }

    #[tokio::test]
    async fn test_open_close() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let queue = handle.create_queue("Games", QueueKind::Queue, false).await.unwrap();
        dispatcher.bind_existing().await.unwrap();
        let sender = BufferSender::new();
        let moderator = speaker("99", true);

        dispatcher
            .dispatch("!games open", &moderator, &sender)
            .await
            .unwrap();
        assert_eq!(sender.drain().unwrap(), vec!["The queue is now open!"]);
        assert!(handle.get_queue(&queue.id).await.unwrap().unwrap().open);

        dispatcher
            .dispatch("!games open", &moderator, &sender)
            .await
            .unwrap();
        assert_eq!(sender.drain().unwrap(), vec!["The queue is already open."]);

        dispatcher
            .dispatch("!games close", &moderator, &sender)
            .await
            .unwrap();
        assert_eq!(sender.drain().unwrap(), vec!["The queue is now closed!"]);
        assert!(!handle.get_queue(&queue.id).await.unwrap().unwrap().open);

        dispatcher
            .dispatch("!games close", &moderator, &sender)
            .await
            .unwrap();
        assert_eq!(sender.drain().unwrap(), vec!["The queue is already closed."]);
    }

    #[tokio::test]
    async fn test_blank_template_suppresses_response() {
        let dir = TempDir::new().unwrap();
        let (events, _) = event_channel();
        let db = JsonFileDb::new(dir.path().join("queues.json"));
        let store = QueueStore::load(Box::new(db), events).unwrap();
        let handle = spawn_store(store);

        let mut templates = CommandTemplates::default();
        templates.clear_command_cleared_template = String::new();
        let binder = Arc::new(RwLock::new(CommandBinder::new("!")));
        let dispatcher = ChatDispatcher::new(handle.clone(), templates, binder);

        handle.create_queue("Games", QueueKind::Queue, false).await.unwrap();
        dispatcher.bind_existing().await.unwrap();
        let sender = BufferSender::new();

        // Still handled, just silently.
        assert!(dispatcher
            .dispatch("!games clear", &dennis(), &sender)
            .await
            .unwrap());
        assert!(sender.drain().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_binder_sync_follows_store_events() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, handle) = setup(&dir).await;
        let binder = dispatcher.binder.clone();
        tokio::spawn(run_binder_sync(handle.clone(), binder.clone()));
        // Give the sync task a moment to subscribe.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let queue = handle.create_queue("Duo Queue", QueueKind::Queue, false).await.unwrap();
        handle.rename_queue(&queue.id, "Trio Queue").await.unwrap();

        // Let the sync task drain the events.
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            if binder.read().await.resolve("!trio-queue").is_some() {
                break;
            }
        }

        let binder = binder.read().await;
        assert!(binder.resolve("!trio-queue").is_some());
        assert!(binder.resolve("!duo-queue").is_none());
    }
}
