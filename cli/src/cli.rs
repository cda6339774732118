use clap::{Args, Parser, Subcommand};
use vault_core::{InsertPosition, Period};

#[derive(Parser)]
#[command(name = "vault")]
#[command(about = "Work with a note vault through its local REST API")]
#[command(version)]
pub struct Cli {
    /// API base URL (overrides OBSIDIAN_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Bearer token (overrides OBSIDIAN_API_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status (no token needed)
    Status,
    /// Work with the file currently open in the application
    Active {
        #[command(subcommand)]
        action: ActiveAction,
    },
    /// Work with a file in the vault
    File {
        #[command(subcommand)]
        action: FileAction,
    },
    /// List files at the vault root or in a directory
    #[command(alias = "list")]
    Ls {
        /// Directory relative to the vault root
        directory: Option<String>,
    },
    /// List or run application commands
    Commands {
        #[command(subcommand)]
        action: CommandAction,
    },
    /// Search the vault
    Search(SearchArgs),
    /// Open a file in the application
    Open {
        path: String,
        /// Open in a new pane
        #[arg(long)]
        new_leaf: bool,
    },
    /// Work with a periodic note
    Periodic {
        /// daily, weekly, monthly, quarterly or yearly
        period: Period,
        #[command(subcommand)]
        action: PeriodicAction,
    },
}

#[derive(Subcommand)]
pub enum ActiveAction {
    /// Print the active file
    Get,
    /// Append content to the active file
    Append {
        #[arg(allow_hyphen_values = true)]
        content: Option<String>,
    },
    /// Replace the active file's content
    Put {
        #[arg(allow_hyphen_values = true)]
        content: Option<String>,
    },
    /// Insert content relative to a heading
    Insert(InsertArgs),
    /// Delete the active file
    Delete,
}

#[derive(Subcommand)]
pub enum FileAction {
    /// Print a file's markdown
    Get { path: String },
    /// Print a file as JSON with frontmatter, tags and stats
    Note { path: String },
    /// Create or replace a file
    Put {
        path: String,
        #[arg(allow_hyphen_values = true)]
        content: Option<String>,
    },
    /// Append content to a file
    Append {
        path: String,
        #[arg(allow_hyphen_values = true)]
        content: Option<String>,
    },
    /// Insert content relative to a heading
    Insert {
        path: String,
        #[command(flatten)]
        insert: InsertArgs,
    },
    /// Delete a file
    Delete { path: String },
}

#[derive(Subcommand)]
pub enum CommandAction {
    /// List available commands
    List,
    /// Run a command by id
    Run { id: String },
}

#[derive(Subcommand)]
pub enum PeriodicAction {
    Get,
    Put {
        #[arg(allow_hyphen_values = true)]
        content: Option<String>,
    },
    Append {
        #[arg(allow_hyphen_values = true)]
        content: Option<String>,
    },
    Insert(InsertArgs),
    Delete,
}

#[derive(Args)]
pub struct InsertArgs {
    /// Target heading; nest with the boundary, e.g. "Day::Tasks"
    #[arg(long)]
    pub heading: String,
    /// end or beginning
    #[arg(long, default_value = "end")]
    pub position: InsertPosition,
    /// Delimiter between nested heading names
    #[arg(long)]
    pub boundary: Option<String>,
    /// Content to insert (stdin when omitted)
    #[arg(allow_hyphen_values = true)]
    pub content: Option<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Query text, or a JsonLogic rule with --jsonlogic
    pub query: String,
    /// Treat the query as a JsonLogic rule
    #[arg(long, conflicts_with_all = ["simple", "gui"])]
    pub jsonlogic: bool,
    /// Plain text search
    #[arg(long, conflicts_with = "gui")]
    pub simple: bool,
    /// Search through the application's search pane
    #[arg(long)]
    pub gui: bool,
    /// Characters of context around each match
    #[arg(long, default_value_t = vault_core::client::DEFAULT_CONTEXT_LENGTH)]
    pub context_length: usize,
}
