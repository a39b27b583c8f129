//! Clap derive structures for the `sakura` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sakura -- talk to a Sakura panel as a proxy node
#[derive(Debug, Parser)]
#[command(
    name = "sakura",
    version,
    about = "Query and report to a Sakura node-management panel",
    long_about = "Fetches node configuration, users and detection rules from a Sakura\n\
        panel and reports node status, online users, traffic and rule hits.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "SAKURA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Node profile to use
    #[arg(long, short = 'p', env = "SAKURA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Panel URL (overrides profile)
    #[arg(long, env = "SAKURA_API_HOST", global = true)]
    pub api_host: Option<String>,

    /// Panel key (overrides profile)
    #[arg(long, env = "SAKURA_KEY", global = true, hide_env_values = true)]
    pub key: Option<String>,

    /// Node ID (overrides profile)
    #[arg(long, env = "SAKURA_NODE_ID", global = true)]
    pub node_id: Option<i64>,

    /// Node type (overrides profile)
    #[arg(long, env = "SAKURA_NODE_TYPE", global = true)]
    pub node_type: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SAKURA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log request and response bodies
    #[arg(long, global = true)]
    pub debug: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SAKURA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

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
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show this node's configuration from the panel
    #[command(alias = "node")]
    NodeInfo,

    /// List users assigned to this node
    #[command(alias = "u")]
    Users,

    /// List detection rules (local file first, then panel)
    Rules,

    /// Show the configured panel identity without contacting it
    Describe,

    /// Send reports to the panel
    Report(ReportArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Report host load
    Status {
        /// CPU usage percent
        #[arg(long, default_value_t = 0.0)]
        cpu: f64,
        /// Memory usage percent
        #[arg(long, default_value_t = 0.0)]
        mem: f64,
        /// Disk usage percent
        #[arg(long, default_value_t = 0.0)]
        disk: f64,
        /// Uptime in seconds
        #[arg(long, default_value_t = 0)]
        uptime: u64,
    },

    /// Report online users from a JSON array of {"UID", "IP"}
    Online(FileArg),

    /// Report traffic from a JSON array of {"UID", "Email", "Upload", "Download"}
    Traffic(FileArg),

    /// Report rule hits from a JSON array of {"uid", "rule_id"}
    Illegal(FileArg),
}

#[derive(Debug, Args)]
pub struct FileArg {
    /// JSON file to read, or '-' for stdin
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the loaded config with keys masked
    Show,
}
