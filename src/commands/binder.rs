//! Per-queue chat command registry.
//!
//! Every queue carries exactly one chat command whose trigger is derived
//! from the queue name. The binder keeps the registry in step with queue
//! changes: renames move the trigger, deletes drop the command, and the
//! registry id stays stable for the queue's whole life.

use regex::Regex;
use std::collections::HashMap;

use crate::store::{QueueEvent, ViewerQueue};

/// Stable registry id for a queue's command.
pub fn command_id(queue_id: &str) -> String {
    format!("viewerq:queue:{}", queue_id)
}

/// Trigger word for a queue name: whitespace runs become dashes, the rest is
/// lowercased. Punctuation is kept as typed.
pub fn trigger_slug(name: &str) -> String {
    match Regex::new(r"\s+") {
        Ok(re) => re.replace_all(name, "-").to_lowercase(),
        Err(_) => name.to_lowercase(),
    }
}

/// One subcommand of a queue command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubCommand {
    pub arg: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    /// Restricted to moderators and the broadcaster.
    pub elevated: bool,
}

/// The subcommands every queue command carries.
pub const SUB_COMMANDS: &[SubCommand] = &[
    SubCommand {
        arg: "join",
        usage: "join",
        description: "Join the queue if it is open.",
        elevated: false,
    },
    SubCommand {
        arg: "position",
        usage: "position",
        description: "View your position in the queue if you are in it.",
        elevated: false,
    },
    SubCommand {
        arg: "leave",
        usage: "leave",
        description: "Leave the queue if you are in it.",
        elevated: false,
    },
    SubCommand {
        arg: "clear",
        usage: "clear",
        description: "Clear all viewers from the queue.",
        elevated: false,
    },
    SubCommand {
        arg: "pick",
        usage: "pick <count>",
        description: "Pick one or more viewers from the queue. Defaults to 1 if no count is provided.",
        elevated: true,
    },
    SubCommand {
        arg: "open",
        usage: "open",
        description: "Open the queue to allow viewers to join.",
        elevated: true,
    },
    SubCommand {
        arg: "close",
        usage: "close",
        description: "Close the queue to prevent viewers from joining.",
        elevated: true,
    },
];

/// Look up a subcommand descriptor by its argument word.
pub fn sub_command(arg: &str) -> Option<&'static SubCommand> {
    SUB_COMMANDS.iter().find(|s| s.arg == arg)
}

/// Descriptor for one queue's chat command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueCommand {
    pub id: String,
    pub queue_id: String,
    /// Full trigger word including the command prefix.
    pub trigger: String,
    pub name: String,
    pub description: String,
}

impl QueueCommand {
    pub fn for_queue(prefix: &str, queue: &ViewerQueue) -> Self {
        Self {
            id: command_id(&queue.id),
            queue_id: queue.id.clone(),
            trigger: format!("{}{}", prefix, trigger_slug(&queue.name)),
            name: format!("{} Management", queue.name),
            description: format!("Allows management of the \"{}\" viewer queue", queue.name),
        }
    }

    /// Every queue command exposes the same subcommand set.
    pub fn sub_commands(&self) -> &'static [SubCommand] {
        SUB_COMMANDS
    }
}

/// Registry of bound queue commands, keyed by command id.
pub struct CommandBinder {
    prefix: String,
    commands: HashMap<String, QueueCommand>,
}

impl CommandBinder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
        }
    }

    /// Bind (or replace) the command for a queue.
    pub fn bind(&mut self, queue: &ViewerQueue) {
        let command = QueueCommand::for_queue(&self.prefix, queue);
        if let Some(existing) = self
            .commands
            .values()
            .find(|c| c.trigger == command.trigger && c.queue_id != command.queue_id)
        {
            tracing::warn!(
                "Trigger {} is already bound to queue {}; the lowest queue id wins",
                command.trigger,
                existing.queue_id
            );
        }

        tracing::debug!("Bound {} -> queue {}", command.trigger, command.queue_id);
        self.commands.insert(command.id.clone(), command);
    }

    /// Rebind after a queue change. The trigger may move on rename.
    pub fn rebind(&mut self, queue: &ViewerQueue) {
        self.commands.remove(&command_id(&queue.id));
        self.bind(queue);
    }

    /// Drop a queue's command. Returns false if it was not bound.
    pub fn unbind(&mut self, queue_id: &str) -> bool {
        let removed = self.commands.remove(&command_id(queue_id)).is_some();
        if removed {
            tracing::debug!("Unbound command for queue {}", queue_id);
        }
        removed
    }

    /// Find the command for a trigger word. When two queues share a trigger
    /// the one with the lowest queue id wins, so resolution is stable.
    pub fn resolve(&self, word: &str) -> Option<&QueueCommand> {
        self.commands
            .values()
            .filter(|c| c.trigger.eq_ignore_ascii_case(word))
            .min_by(|a, b| a.queue_id.cmp(&b.queue_id))
    }

    /// Apply a queue change to the registry.
    pub fn apply_event(&mut self, event: &QueueEvent) {
        match event {
            QueueEvent::QueueAdded { queue } => self.bind(queue),
            QueueEvent::QueueUpdated { queue } => self.rebind(queue),
            QueueEvent::QueueDeleted { queue_id } => {
                self.unbind(queue_id);
            }
        }
    }

    /// Drop every binding.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::QueueKind;

    fn queue(id: &str, name: &str) -> ViewerQueue {
        ViewerQueue::new(id, name, QueueKind::Queue, false)
    }

    #[test]
    fn test_trigger_slug() {
        assert_eq!(trigger_slug("Duo Queue"), "duo-queue");
        assert_eq!(trigger_slug("Viewer   Games"), "viewer-games");
        assert_eq!(trigger_slug("snipes"), "snipes");
        assert_eq!(trigger_slug("Mario Kart!"), "mario-kart!");
    }

    #[test]
    fn test_bind_and_resolve() {
        let mut binder = CommandBinder::new("!");
        binder.bind(&queue("q1", "Duo Queue"));

        let command = binder.resolve("!duo-queue").unwrap();
        assert_eq!(command.queue_id, "q1");
        assert_eq!(command.id, "viewerq:queue:q1");

        // Chat is case-insensitive about triggers.
        assert!(binder.resolve("!Duo-Queue").is_some());
        assert!(binder.resolve("!snipes").is_none());
    }

    #[test]
    fn test_rename_moves_trigger() {
        let mut binder = CommandBinder::new("!");
        binder.bind(&queue("q1", "Duo Queue"));
        binder.rebind(&queue("q1", "Trio Queue"));

        assert!(binder.resolve("!duo-queue").is_none());
        assert_eq!(binder.resolve("!trio-queue").unwrap().queue_id, "q1");
        assert_eq!(binder.len(), 1);
    }

    #[test]
    fn test_unbind() {
        let mut binder = CommandBinder::new("!");
        binder.bind(&queue("q1", "Duo Queue"));

        assert!(binder.unbind("q1"));
        assert!(!binder.unbind("q1"));
        assert!(binder.resolve("!duo-queue").is_none());
    }

    #[test]
    fn test_trigger_collision_resolves_to_lowest_queue_id() {
        let mut binder = CommandBinder::new("!");
        binder.bind(&queue("b", "Games"));
        binder.bind(&queue("a", "games"));

        assert_eq!(binder.resolve("!games").unwrap().queue_id, "a");

        binder.unbind("a");
        assert_eq!(binder.resolve("!games").unwrap().queue_id, "b");
    }

    #[test]
    fn test_apply_event_lifecycle() {
        let mut binder = CommandBinder::new("!");

        binder.apply_event(&QueueEvent::QueueAdded {
            queue: queue("q1", "Duo Queue"),
        });
        assert!(binder.resolve("!duo-queue").is_some());

        binder.apply_event(&QueueEvent::QueueUpdated {
            queue: queue("q1", "Solo Queue"),
        });
        assert!(binder.resolve("!duo-queue").is_none());
        assert!(binder.resolve("!solo-queue").is_some());

        binder.apply_event(&QueueEvent::QueueDeleted {
            queue_id: "q1".to_string(),
        });
        assert!(binder.is_empty());
    }

    #[test]
    fn test_custom_prefix() {
        let mut binder = CommandBinder::new("~");
        binder.bind(&queue("q1", "Duo Queue"));

        assert!(binder.resolve("~duo-queue").is_some());
        assert!(binder.resolve("!duo-queue").is_none());
    }

    #[test]
    fn test_sub_command_table() {
        let command = QueueCommand::for_queue("!", &queue("q1", "Duo Queue"));
        assert_eq!(command.sub_commands().len(), 7);

        for arg in ["join", "position", "leave", "clear"] {
            assert!(!sub_command(arg).unwrap().elevated, "{}", arg);
        }
        for arg in ["pick", "open", "close"] {
            assert!(sub_command(arg).unwrap().elevated, "{}", arg);
        }

        assert_eq!(sub_command("pick").unwrap().usage, "pick <count>");
        assert!(sub_command("banana").is_none());
    }
}
