//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Import an Obsidian table, sync it to the site, and publish newsletters.
#[derive(Parser, Debug)]
#[command(name = "vaultpress", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "VAULTPRESS_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse the table and print its rows.
    Parse {
        /// Table file (defaults to vault.table_file under vault.path).
        #[arg(short, long)]
        table: Option<String>,

        /// Print rows as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse, filter, and sync rows into the site content root.
    Sync {
        /// Table file (defaults to vault.table_file under vault.path).
        #[arg(short, long)]
        table: Option<String>,

        /// List planned file operations without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Generate documents from rows instead of copying vault notes.
        #[arg(long)]
        generate: bool,
    },

    /// Newsletter operations.
    Newsletter(NewsletterCommand),

    /// Published content operations.
    Content(ContentCommand),

    /// Commit and push newsletter changes.
    Publish,

    /// Configuration operations.
    Config(ConfigCommand),

    /// Print version information.
    Version,
}

#[derive(Parser, Debug)]
pub struct NewsletterCommand {
    #[command(subcommand)]
    pub command: NewsletterAction,
}

#[derive(Subcommand, Debug)]
pub enum NewsletterAction {
    /// Write a newsletter issue from a JSON draft.
    Save {
        /// Draft JSON file (`-` for stdin).
        #[arg(short, long)]
        draft: String,

        /// Output directory (defaults to publish.newsletter_dir under publish.repo_root).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Print the items included in a saved issue.
    Items {
        /// Newsletter Markdown file.
        #[arg(short, long)]
        file: String,

        /// Print items as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
pub struct ContentCommand {
    #[command(subcommand)]
    pub command: ContentAction,
}

#[derive(Subcommand, Debug)]
pub enum ContentAction {
    /// List published news and notes, newest first.
    List {
        /// Only this kind: news or notes.
        #[arg(short, long)]
        kind: Option<String>,

        /// Case-insensitive match on title, summary, or tags.
        #[arg(long)]
        query: Option<String>,

        /// Print items as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "sync.mode").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "filters.min_score").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
