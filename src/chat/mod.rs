//! Chat responses - delivery seam, templates, and rendering.

pub mod sender;
pub mod templates;

pub use sender::{BufferSender, ChatSender, ConsoleSender};
pub use templates::{normalize_username, render_template, CommandTemplates};
