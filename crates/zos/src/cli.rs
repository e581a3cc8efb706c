//! Clap derive structures for the `zos` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zos -- command-line client for zOS
#[derive(Debug, Parser)]
#[command(
    name = "zos",
    version,
    about = "Read and write zOS channels and messages from the command line",
    long_about = "A command-line client for the zOS messaging API.\n\n\
        Lists and syncs channels, reads and sends messages, looks up users,\n\
        and manages sessions and configuration profiles.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "ZOS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API URL (overrides profile)
    #[arg(long, env = "ZOS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Network id (overrides profile)
    #[arg(long, short = 'n', env = "ZOS_NETWORK", global = true)]
    pub network: Option<String>,

    /// Access token
    #[arg(long, env = "ZOS_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub access_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ZOS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ZOS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ZOS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, sync, and join channels
    #[command(alias = "ch")]
    Channels(ChannelsArgs),

    /// Read and write channel messages
    #[command(alias = "msg", alias = "m")]
    Messages(MessagesArgs),

    /// Look up users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Fetch the link preview for a URL
    LinkPreview {
        /// URL to preview
        url: String,
    },

    /// Log in, inspect, and end sessions
    Auth(AuthArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Channels ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChannelsArgs {
    #[command(subcommand)]
    pub command: ChannelsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChannelsCommand {
    /// List the network's channels
    #[command(alias = "ls")]
    List,

    /// Show one channel
    Get {
        /// Channel id
        id: String,
    },

    /// Keep the unread counts in sync until interrupted
    Sync {
        /// Stop after this many refreshes
        #[arg(long)]
        cycles: Option<u32>,
    },

    /// Join a channel
    Join {
        /// Channel id
        id: String,
    },

    /// Mark every message in a channel as read
    MarkRead {
        /// Channel id
        id: String,
    },
}

// ── Messages ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MessagesArgs {
    #[command(subcommand)]
    pub command: MessagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    /// List a channel's latest messages
    #[command(alias = "ls")]
    List {
        /// Channel id
        channel: String,

        /// Only messages older than this timestamp (ms since epoch)
        #[arg(long)]
        before: Option<i64>,
    },

    /// Send a message
    Send {
        /// Channel id
        channel: String,

        /// Message text
        text: String,

        /// Mentioned user id (repeatable)
        #[arg(long = "mention", short = 'm')]
        mentions: Vec<String>,
    },

    /// Edit a message
    Edit {
        /// Channel id
        channel: String,

        /// Message id
        id: String,

        /// New message text
        text: String,

        /// Mentioned user id (repeatable)
        #[arg(long = "mention", short = 'm')]
        mentions: Vec<String>,
    },

    /// Delete a message
    #[command(alias = "rm")]
    Delete {
        /// Channel id
        channel: String,

        /// Message id
        id: String,
    },

    /// Upload a file as a message
    Upload {
        /// Channel id
        channel: String,

        /// File to upload
        path: PathBuf,
    },
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// Users that can be mentioned in a channel
    Mentionable {
        /// Channel id
        channel: String,

        /// Name filter
        #[arg(default_value = "")]
        search: String,
    },

    /// Find a user by Matrix id
    Lookup {
        /// Matrix id, e.g. @alice:zos.example
        matrix_id: String,
    },
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Exchange a signed Web3 token for a session or registration nonce
    Login {
        /// Signed token (prompted when omitted)
        #[arg(long, env = "ZOS_SIGNED_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Show the logged-in user
    Whoami,

    /// End the session and forget the stored access token
    Logout,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Set a profile value
    Set {
        /// Key (api_url, network_id, timeout, sync_interval, ...)
        key: String,

        /// Value
        value: String,
    },

    /// List profiles
    Profiles,

    /// Switch the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store an access token in the system keyring
    SetToken {
        /// Profile (defaults to the active one)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
