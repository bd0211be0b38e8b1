//! Response templates for queue chat commands.
//!
//! Every response the dispatcher sends is rendered from one of these
//! templates. Placeholders are literal `{name}` tokens; a blank template
//! silences that response entirely. Overrides come from settings.json under
//! `templates`, keyed by the camelCase field names.

use serde::{Deserialize, Serialize};

/// Fill `{name}` placeholders and return the message, or None when the
/// template is blank.
pub fn render_template(template: &str, variables: &[(&str, String)]) -> Option<String> {
    if template.trim().is_empty() {
        return None;
    }

    let mut message = template.to_string();
    for (key, value) in variables {
        message = message.replace(&format!("{{{}}}", key), value);
    }
    Some(message)
}

/// Chat-facing name for a viewer: the display name, with the login in
/// parentheses when the two differ.
pub fn normalize_username(username: &str, display_name: &str) -> String {
    if username.to_lowercase() == display_name.to_lowercase() {
        display_name.to_string()
    } else {
        format!("{} ({})", display_name, username)
    }
}

/// Templates for every queue command response.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommandTemplates {
    /// Base command, speaker not in the queue.
    /// Placeholders: {username}, {queueName}, {queueLength}, {queueStatus}.
    #[serde(default = "default_base_not_joined")]
    pub base_command_not_joined_template: String,

    /// Base command, speaker in a random queue.
    /// Placeholders: {username}, {queueName}, {queueLength}, {queueStatus}.
    #[serde(default = "default_base_joined_random")]
    pub base_command_joined_random_template: String,

    /// Base command, speaker in an ordered queue.
    /// Placeholders: {username}, {queueName}, {queuePosition},
    /// {queuePeopleAhead}, {queueLength}, {queueStatus}.
    #[serde(default = "default_base_joined")]
    pub base_command_joined_template: String,

    /// Join, speaker already in an ordered queue.
    /// Placeholders: {username}, {queueName}, {queuePosition},
    /// {queuePeopleAhead}, {queueLength}.
    #[serde(default = "default_join_already_joined")]
    pub join_command_already_joined_template: String,

    /// Join, speaker already in a random queue.
    /// Placeholders: {username}, {queueName}, {queueLength}.
    #[serde(default = "default_join_already_joined_random")]
    pub join_command_already_joined_random_template: String,

    /// Join while the queue is closed.
    /// Placeholders: {username}, {queueName}.
    #[serde(default = "default_join_closed")]
    pub join_command_closed_template: String,

    /// Successful join of an ordered queue.
    /// Placeholders: {username}, {queueName}, {queuePosition},
    /// {queuePeopleAhead}, {queueLength}.
    #[serde(default = "default_join_joined")]
    pub join_command_joined_template: String,

    /// Successful join of a random queue.
    /// Placeholders: {username}, {queueName}, {queueLength}.
    #[serde(default = "default_join_joined_random")]
    pub join_command_joined_random_template: String,

    /// Position, speaker not in the queue.
    /// Placeholders: {username}, {queueName}, {queueLength}, {queueStatus}.
    #[serde(default = "default_position_not_joined")]
    pub position_command_not_joined_template: String,

    /// Position in an ordered queue.
    /// Placeholders: {username}, {queueName}, {queuePosition},
    /// {queuePeopleAhead}, {queueLength}, {queueStatus}.
    #[serde(default = "default_position_position")]
    pub position_command_position_template: String,

    /// Position in a random queue (no meaningful position to report).
    /// Placeholders: {username}, {queueName}, {queueLength}, {queueStatus}.
    #[serde(default = "default_position_is_random")]
    pub position_command_is_random_template: String,

    /// Leave, speaker not in the queue.
    /// Placeholders: {username}, {queueName}.
    #[serde(default = "default_leave_not_joined")]
    pub leave_command_not_joined_template: String,

    /// Successful leave.
    /// Placeholders: {username}, {queueName}, {queueLength}.
    #[serde(default = "default_leave_left")]
    pub leave_command_left_template: String,

    /// Queue cleared.
    /// Placeholders: {queueName}.
    #[serde(default = "default_clear_cleared")]
    pub clear_command_cleared_template: String,

    /// Viewers picked from the queue.
    /// Placeholders: {users}, {queueName}, {queueLength}.
    #[serde(default = "default_pick_picked")]
    pub pick_command_picked_template: String,

    /// Pick on an empty queue.
    /// Placeholders: {queueName}.
    #[serde(default = "default_pick_no_viewers")]
    pub pick_command_no_viewers_template: String,

    /// Split multi-viewer picks into several messages.
    #[serde(default = "default_pick_auto_split_message")]
    pub pick_command_auto_split_message: bool,

    /// Viewers announced per message when splitting.
    #[serde(default = "default_pick_auto_split_count")]
    pub pick_command_auto_split_count: i64,

    /// Queue opened.
    /// Placeholders: {queueName}.
    #[serde(default = "default_open_opened")]
    pub open_command_opened_template: String,

    /// Open on an already open queue.
    /// Placeholders: {queueName}.
    #[serde(default = "default_open_already_open")]
    pub open_command_already_open_template: String,

    /// Queue closed.
    /// Placeholders: {queueName}.
    #[serde(default = "default_close_closed")]
    pub close_command_closed_template: String,

    /// Close on an already closed queue.
    /// Placeholders: {queueName}.
    #[serde(default = "default_close_already_closed")]
    pub close_command_already_closed_template: String,
}

fn default_base_not_joined() -> String {
    "The queue is currently {queueStatus} and there are {queueLength} people in the queue."
        .to_string()
}

fn default_base_joined_random() -> String {
    "The queue is currently {queueStatus} and there are {queueLength} people in the queue, including you."
        .to_string()
}

fn default_base_joined() -> String {
    "The queue is currently {queueStatus} and you are #{queuePosition}/{queueLength} in the queue."
        .to_string()
}

fn default_join_already_joined() -> String {
    "You are already in the queue, {username}! You are currently #{queuePosition}/{queueLength}."
        .to_string()
}

fn default_join_already_joined_random() -> String {
    "You are already in the queue, {username}!".to_string()
}

fn default_join_closed() -> String {
    "Sorry {username}, the queue is currently closed.".to_string()
}

fn default_join_joined() -> String {
    "You have joined the queue, {username}! You are currently #{queuePosition}/{queueLength}."
        .to_string()
}

fn default_join_joined_random() -> String {
    "You have joined the queue, {username}! There are currently {queueLength} people in the queue."
        .to_string()
}

fn default_position_not_joined() -> String {
    "You are not currently in the queue, {username}.".to_string()
}

fn default_position_position() -> String {
    "Your position in the queue is #{queuePosition}/{queueLength}, {username}.".to_string()
}

fn default_position_is_random() -> String {
    "You are currently in the queue, {username}.".to_string()
}

fn default_leave_not_joined() -> String {
    "You are not currently in the queue, {username}.".to_string()
}

fn default_leave_left() -> String {
    "You have successfully left the queue, {username}.".to_string()
}

fn default_clear_cleared() -> String {
    "The queue has been cleared.".to_string()
}

fn default_pick_picked() -> String {
    "{users}, you're up next! There are {queueLength} people remaining in the queue.".to_string()
}

fn default_pick_no_viewers() -> String {
    "There is nobody in the queue to pick from.".to_string()
}

fn default_pick_auto_split_message() -> bool {
    true
}

fn default_pick_auto_split_count() -> i64 {
    3
}

fn default_open_opened() -> String {
    "The queue is now open!".to_string()
}

fn default_open_already_open() -> String {
    "The queue is already open.".to_string()
}

fn default_close_closed() -> String {
    "The queue is now closed!".to_string()
}

fn default_close_already_closed() -> String {
    "The queue is already closed.".to_string()
}

impl Default for CommandTemplates {
    fn default() -> Self {
        Self {
            base_command_not_joined_template: default_base_not_joined(),
            base_command_joined_random_template: default_base_joined_random(),
            base_command_joined_template: default_base_joined(),
            join_command_already_joined_template: default_join_already_joined(),
            join_command_already_joined_random_template: default_join_already_joined_random(),
            join_command_closed_template: default_join_closed(),
            join_command_joined_template: default_join_joined(),
            join_command_joined_random_template: default_join_joined_random(),
            position_command_not_joined_template: default_position_not_joined(),
            position_command_position_template: default_position_position(),
            position_command_is_random_template: default_position_is_random(),
            leave_command_not_joined_template: default_leave_not_joined(),
            leave_command_left_template: default_leave_left(),
            clear_command_cleared_template: default_clear_cleared(),
            pick_command_picked_template: default_pick_picked(),
            pick_command_no_viewers_template: default_pick_no_viewers(),
            pick_command_auto_split_message: default_pick_auto_split_message(),
            pick_command_auto_split_count: default_pick_auto_split_count(),
            open_command_opened_template: default_open_opened(),
            open_command_already_open_template: default_open_already_open(),
            close_command_closed_template: default_close_closed(),
            close_command_already_closed_template: default_close_already_closed(),
        }
    }
}
