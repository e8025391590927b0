use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "paneweave")]
#[command(about = "Tiling browser with persistent, resumable sessions")]
#[command(version = env!("PANEWEAVE_VERSION"))]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a browser session until interrupted
    Browse(BrowseArgs),

    /// Inspect and manage saved sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
}

#[derive(Args)]
pub struct BrowseArgs {
    /// Resume a saved session by ID (used when restoring)
    #[arg(long, conflicts_with = "restore_last")]
    pub restore_session: Option<String>,

    /// Resume the most recent exited session that has tabs
    #[arg(long)]
    pub restore_last: bool,

    /// URLs to open, one tab each
    pub urls: Vec<String>,
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List sessions, most recently updated first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Maximum number of sessions (0 uses the configured cap)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Show the tab and pane layout of a session
    Show {
        /// Full session ID or a unique suffix (e.g. the 4-character short ID)
        id: String,
    },

    /// Resume a session in a new browser process
    Restore {
        /// Full session ID or a unique suffix
        id: String,
    },

    /// Permanently delete an exited session
    Delete {
        /// Full session ID or a unique suffix
        id: String,
    },

    /// End stale sessions and prune old exited ones
    Cleanup,
}
