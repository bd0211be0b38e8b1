//! CLI commands for viewerq using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chat::ConsoleSender;
use crate::commands::{run_binder_sync, ChatDispatcher, ChatSpeaker, CommandBinder};
use crate::config::{get_database_path, load_settings_or_default, Settings};
use crate::store::{
    event_channel, spawn_store, JsonFileDb, Layout, QueueKind, QueueStore, QueueViewer,
    ViewerQueue,
};
use crate::web::{run_web_server, AppState, WebServerConfig};

/// viewerq - Named viewer queues for streamer chat.
#[derive(Parser)]
#[command(name = "viewerq")]
#[command(version = "0.1.0")]
#[command(about = "Named viewer queues for streamer chat", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the queue service (chat commands + moderator panel API)
    Serve {
        /// Bind host (overrides settings)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides settings)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage queues
    #[command(subcommand, alias = "q")]
    Queue(QueueCommand),

    /// Manage viewers in a queue
    #[command(subcommand, alias = "v")]
    Viewer(ViewerCommand),

    /// Panel layout
    #[command(subcommand)]
    Layout(LayoutCommand),

    /// Run one chat line through the queue commands
    Chat {
        /// Chat line, e.g. "!duo-queue join"
        message: String,

        /// Speaker username
        #[arg(long, default_value = "cli")]
        username: String,

        /// Platform user id (defaults to the username)
        #[arg(long)]
        user_id: Option<String>,

        /// Display name (defaults to the username)
        #[arg(long)]
        display_name: Option<String>,

        /// Treat the speaker as a moderator
        #[arg(long)]
        elevated: bool,
    },
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List all queues
    List,

    /// Create a new queue
    Create {
        /// Queue name
        name: String,

        /// Picking policy: queue, stack, random
        #[arg(long = "type", default_value = "queue")]
        kind: String,

        /// Create the queue already open for joins
        #[arg(long)]
        open: bool,
    },

    /// Show a queue and its viewers
    Show {
        /// Queue ID
        queue_id: String,
    },

    /// Rename a queue
    Rename {
        /// Queue ID
        queue_id: String,

        /// New name
        name: String,
    },

    /// Change a queue's picking policy
    Retype {
        /// Queue ID
        queue_id: String,

        /// Picking policy: queue, stack, random
        kind: String,
    },

    /// Toggle a queue between open and closed
    Toggle {
        /// Queue ID
        queue_id: String,
    },

    /// Remove every viewer from a queue
    Clear {
        /// Queue ID
        queue_id: String,
    },

    /// Delete a queue
    Delete {
        /// Queue ID
        queue_id: String,
    },

    /// Pick viewers out of a queue by its policy
    Roll {
        /// Queue ID
        queue_id: String,

        /// How many viewers to pick
        #[arg(default_value = "1")]
        count: i64,
    },

    /// Pick one specific viewer out of a queue
    Pick {
        /// Queue ID
        queue_id: String,

        /// Viewer ID
        viewer_id: String,
    },
}

#[derive(Subcommand)]
pub enum ViewerCommand {
    /// Add a viewer to the back of a queue
    Add {
        /// Queue ID
        queue_id: String,

        /// Viewer username
        username: String,

        /// Platform user id (defaults to the username)
        #[arg(long)]
        id: Option<String>,

        /// Display name (defaults to the username)
        #[arg(long)]
        display_name: Option<String>,

        /// Avatar URL
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Remove a viewer from a queue
    Remove {
        /// Queue ID
        queue_id: String,

        /// Viewer ID
        viewer_id: String,
    },
}

#[derive(Subcommand)]
pub enum LayoutCommand {
    /// Show the saved panel layout
    Show,

    /// Set panel layout sizes
    Set {
        /// Queues table size (e.g. 60%)
        #[arg(long)]
        queues_table: Option<String>,

        /// Viewer list size (e.g. 40%)
        #[arg(long)]
        viewer_list: Option<String>,
    },
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Serve { host, port } => cmd_serve(host.as_deref(), *port).await,
            Command::Queue(cmd) => cmd_queue(cmd).await,
            Command::Viewer(cmd) => cmd_viewer(cmd).await,
            Command::Layout(cmd) => cmd_layout(cmd).await,
            Command::Chat {
                message,
                username,
                user_id,
                display_name,
                elevated,
            } => {
                cmd_chat(
                    message,
                    username,
                    user_id.as_deref(),
                    display_name.as_deref(),
                    *elevated,
                )
                .await
            }
        }
    }
}

// Command implementations

/// Open the queue store directly from its database file. One-shot commands
/// use this; `serve` holds the store behind its task instead.
fn open_store(settings: &Settings) -> Result<QueueStore> {
    let (events, _) = event_channel();
    let db = JsonFileDb::new(get_database_path(settings)?);
    Ok(QueueStore::load(Box::new(db), events)?)
}

fn describe_queue(queue: &ViewerQueue) -> String {
    format!(
        "{} | {} | {} | {} viewer(s) | {}",
        queue.id,
        queue.name,
        queue.kind,
        queue.viewers.len(),
        if queue.open { "open" } else { "closed" }
    )
}

/// Name comparison for the duplicate warning: lowercased, whitespace removed.
fn normalized_name(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

async fn cmd_serve(host: Option<&str>, port: Option<u16>) -> Result<()> {
    let settings = load_settings_or_default();
    let db_path = get_database_path(&settings)?;

    let (events, _) = event_channel();
    let db = JsonFileDb::new(db_path.clone());
    let store = QueueStore::load(Box::new(db), events)?;
    let handle = spawn_store(store);

    let binder = Arc::new(RwLock::new(CommandBinder::new(
        &settings.chat.command_prefix,
    )));
    let dispatcher = Arc::new(ChatDispatcher::new(
        handle.clone(),
        settings.templates.clone(),
        binder.clone(),
    ));
    let bound = dispatcher.bind_existing().await?;

    let web_config = WebServerConfig {
        host: host.unwrap_or(&settings.web.host).to_string(),
        port: port.unwrap_or(settings.web.port),
    };

    println!(
        "Serving {} queue command(s) from {}",
        bound,
        db_path.display()
    );
    println!("API endpoints:");
    println!(
        "  http://{}:{}/api/queues",
        web_config.host, web_config.port
    );
    println!(
        "  http://{}:{}/api/events",
        web_config.host, web_config.port
    );
    println!("  http://{}:{}/health", web_config.host, web_config.port);
    println!();
    println!("Press Ctrl+C to stop");

    let state = AppState {
        store: handle.clone(),
        dispatcher,
    };

    // Run the web server and command binder sync concurrently.
    tokio::select! {
        result = run_web_server(web_config, state) => {
            if let Err(e) = result {
                tracing::error!("Web server error: {}", e);
            }
        }
        _ = run_binder_sync(handle, binder) => {}
    }

    Ok(())
}

async fn cmd_queue(cmd: &QueueCommand) -> Result<()> {
    let settings = load_settings_or_default();
    let mut store = open_store(&settings)?;

    match cmd {
        QueueCommand::List => {
            let mut queues: Vec<ViewerQueue> = store.get_queues().into_values().collect();
            queues.sort_by(|a, b| a.name.cmp(&b.name));

            if queues.is_empty() {
                println!("No queues yet. Create one with 'viewerq queue create <name>'.");
                return Ok(());
            }
            println!("Queues:");
            for queue in &queues {
                println!("  {}", describe_queue(queue));
            }
        }
        QueueCommand::Create { name, kind, open } => {
            let kind: QueueKind = kind.parse()?;
            let wanted = normalized_name(name);
            if store
                .get_queues()
                .values()
                .any(|q| normalized_name(&q.name) == wanted)
            {
                println!("Warning: a queue named '{}' already exists.", name);
            }

            let queue = store.create_queue(name, kind, *open)?;
            println!("Created {}", describe_queue(&queue));
            println!(
                "Chat trigger: {}{}",
                settings.chat.command_prefix,
                crate::commands::trigger_slug(&queue.name)
            );
        }
        QueueCommand::Show { queue_id } => {
            let queue = store
                .get_queue(queue_id)
                .ok_or_else(|| anyhow::anyhow!("No queue with id {}", queue_id))?;
            println!("{}", describe_queue(&queue));
            for (i, viewer) in queue.viewers.iter().enumerate() {
                println!("  #{} {} ({})", i + 1, viewer.display_name, viewer.username);
            }
        }
        QueueCommand::Rename { queue_id, name } => {
            if !store.rename_queue(queue_id, name)? {
                anyhow::bail!("No queue with id {}", queue_id);
            }
            println!("Renamed queue {} to '{}'", queue_id, name);
        }
        QueueCommand::Retype { queue_id, kind } => {
            let kind: QueueKind = kind.parse()?;
            if !store.retype_queue(queue_id, kind)? {
                anyhow::bail!("No queue with id {}", queue_id);
            }
            println!("Queue {} is now a {} queue", queue_id, kind);
        }
        QueueCommand::Toggle { queue_id } => {
            let Some(open) = store.toggle_queue(queue_id)? else {
                anyhow::bail!("No queue with id {}", queue_id);
            };
            println!(
                "Queue {} is now {}",
                queue_id,
                if open { "open" } else { "closed" }
            );
        }
        QueueCommand::Clear { queue_id } => {
            if !store.clear_queue(queue_id)? {
                anyhow::bail!("No queue with id {}", queue_id);
            }
            println!("Cleared queue {}", queue_id);
        }
        QueueCommand::Delete { queue_id } => {
            if !store.delete_queue(queue_id)? {
                anyhow::bail!("No queue with id {}", queue_id);
            }
            println!("Deleted queue {}", queue_id);
        }
        QueueCommand::Roll { queue_id, count } => {
            let Some(picked) = store.roll_viewers(queue_id, *count)? else {
                println!("Queue {} is empty or does not exist.", queue_id);
                return Ok(());
            };
            if picked.is_empty() {
                println!("Picked nobody.");
                return Ok(());
            }
            println!("Picked {} viewer(s):", picked.len());
            for viewer in &picked {
                println!("  {} ({})", viewer.display_name, viewer.username);
            }
        }
        QueueCommand::Pick {
            queue_id,
            viewer_id,
        } => {
            let Some(viewer) = store.roll_viewer(queue_id, viewer_id)? else {
                anyhow::bail!("No viewer {} in queue {}", viewer_id, queue_id);
            };
            println!("Picked {} ({})", viewer.display_name, viewer.username);
        }
    }
    Ok(())
}

async fn cmd_viewer(cmd: &ViewerCommand) -> Result<()> {
    let settings = load_settings_or_default();
    let mut store = open_store(&settings)?;

    match cmd {
        ViewerCommand::Add {
            queue_id,
            username,
            id,
            display_name,
            avatar_url,
        } => {
            let viewer = QueueViewer {
                id: id.clone().unwrap_or_else(|| username.clone()),
                username: username.clone(),
                display_name: display_name.clone().unwrap_or_else(|| username.clone()),
                avatar_url: avatar_url.clone().unwrap_or_default(),
            };
            if !store.add_viewer(queue_id, viewer)? {
                anyhow::bail!(
                    "Could not add '{}': queue {} is missing or the viewer is already in it",
                    username,
                    queue_id
                );
            }
            let length = store.get_queue(queue_id).map_or(0, |q| q.viewers.len());
            println!("Added {} to queue {} (#{}).", username, queue_id, length);
        }
        ViewerCommand::Remove {
            queue_id,
            viewer_id,
        } => {
            if !store.remove_viewer(queue_id, viewer_id)? {
                anyhow::bail!("No viewer {} in queue {}", viewer_id, queue_id);
            }
            println!("Removed viewer {} from queue {}", viewer_id, queue_id);
        }
    }
    Ok(())
}

async fn cmd_layout(cmd: &LayoutCommand) -> Result<()> {
    let settings = load_settings_or_default();
    let mut store = open_store(&settings)?;

    match cmd {
        LayoutCommand::Show => {
            let layout = store.get_layout();
            println!("queues_table: {}", layout.queues_table);
            println!("viewer_list:  {}", layout.viewer_list);
        }
        LayoutCommand::Set {
            queues_table,
            viewer_list,
        } => {
            let current = store.get_layout();
            let layout = Layout {
                queues_table: queues_table.clone().unwrap_or(current.queues_table),
                viewer_list: viewer_list.clone().unwrap_or(current.viewer_list),
            };
            store.update_layout(layout)?;
            println!("Layout saved.");
        }
    }
    Ok(())
}

async fn cmd_chat(
    message: &str,
    username: &str,
    user_id: Option<&str>,
    display_name: Option<&str>,
    elevated: bool,
) -> Result<()> {
    let settings = load_settings_or_default();
    let store = open_store(&settings)?;
    let handle = spawn_store(store);

    let binder = Arc::new(RwLock::new(CommandBinder::new(
        &settings.chat.command_prefix,
    )));
    let dispatcher = ChatDispatcher::new(handle, settings.templates.clone(), binder);
    dispatcher.bind_existing().await?;

    let speaker = ChatSpeaker {
        id: user_id.unwrap_or(username).to_string(),
        username: username.to_string(),
        display_name: display_name.unwrap_or(username).to_string(),
        avatar_url: String::new(),
        elevated,
    };

    let handled = dispatcher
        .dispatch(message, &speaker, &ConsoleSender)
        .await?;
    if !handled {
        println!("No queue command matched '{}'.", message);
    }
    Ok(())
}
