//! Clap derive structures for the `issuetrack` CLI.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// issuetrack -- browse and edit issues from the command line
#[derive(Debug, Parser)]
#[command(
    name = "issuetrack",
    version,
    about = "Manage issue tracker entries from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "ISSUETRACK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "ISSUETRACK_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "ISSUETRACK_API_TOKEN", global = true, hide_env = true)]
    pub api_token: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "ISSUETRACK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ISSUETRACK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ISSUETRACK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, search and edit issues
    #[command(alias = "i")]
    Issues(IssuesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Issues ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IssuesArgs {
    #[command(subcommand)]
    pub command: IssuesCommand,
}

#[derive(Debug, Subcommand)]
pub enum IssuesCommand {
    /// List one page of issues
    #[command(alias = "ls")]
    List {
        /// Page number, starting at 1
        #[arg(long)]
        page: Option<String>,

        /// Sort as "<field>,<asc|desc>"
        #[arg(long)]
        sort: Option<String>,

        /// Full-text search instead of the plain listing
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one issue
    Get {
        /// Issue id
        id: i64,
    },

    /// Full-text search over issues
    Search {
        /// Query text
        text: String,

        /// Page number, starting at 1
        #[arg(long)]
        page: Option<u32>,
    },

    /// Create an issue
    Create {
        #[command(flatten)]
        fields: IssueFields,
    },

    /// Update an existing issue
    Update {
        /// Issue id
        id: i64,

        #[command(flatten)]
        fields: IssueFields,
    },

    /// Delete an issue
    #[command(alias = "rm")]
    Delete {
        /// Issue id
        id: i64,
    },

    /// Write an issue's attachment to disk
    Attachment {
        /// Issue id
        id: i64,

        /// Directory to write into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

/// Editable issue fields. Omitted fields keep their current value.
#[derive(Debug, Default, Args)]
pub struct IssueFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Creation date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub created: Option<NaiveDate>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub comment: Option<String>,

    /// File to attach
    #[arg(long, conflicts_with = "clear_attachment")]
    pub attachment: Option<PathBuf>,

    /// Remove the current attachment
    #[arg(long)]
    pub clear_attachment: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store an API token for the active profile in the system keyring
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
