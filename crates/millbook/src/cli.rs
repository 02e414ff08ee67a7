//! Clap derive structures for the `millbook` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use millbook_core::{Ledger, SortOrder};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// millbook -- rice-mill back-office ledgers from the command line
#[derive(Debug, Parser)]
#[command(
    name = "millbook",
    version,
    about = "Manage rice-mill ledgers and registries from the command line",
    long_about = "Browse, create, update, delete and import the purchase, sale,\n\
        stock-movement, registry and milling records of one mill.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "MILLBOOK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Back-office API root (overrides profile)
    #[arg(long, env = "MILLBOOK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Mill to operate on (overrides profile)
    #[arg(long, short = 'm', env = "MILLBOOK_MILL", global = true)]
    pub mill: Option<String>,

    /// Output format [default: table, or `defaults.output` from config]
    #[arg(long, short = 'o', env = "MILLBOOK_OUTPUT", global = true)]
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
    #[arg(long, short = 'k', env = "MILLBOOK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "MILLBOOK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// The resolved output format.
    pub fn format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
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
    #[command(flatten)]
    Ledger(LedgerCommand),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// One subcommand per record family.
#[derive(Debug, Subcommand)]
pub enum LedgerCommand {
    /// Paddy purchase ledger
    #[command(alias = "pp")]
    PaddyPurchases(RecordArgs),
    /// Rice purchase ledger
    RicePurchases(RecordArgs),
    /// Fortified rice kernel purchase ledger
    FrkPurchases(RecordArgs),
    /// Gunny bag purchase ledger
    GunnyPurchases(RecordArgs),
    /// Paddy sale ledger
    PaddySales(RecordArgs),
    /// Rice sale ledger
    RiceSales(RecordArgs),
    /// Bran sale ledger
    BranSales(RecordArgs),
    /// Paddy inward register
    PaddyInward(RecordArgs),
    /// Rice inward register
    RiceInward(RecordArgs),
    /// Rice outward register
    RiceOutward(RecordArgs),
    /// Gunny outward register
    GunnyOutward(RecordArgs),
    /// Party registry
    Parties(RecordArgs),
    /// Broker registry
    Brokers(RecordArgs),
    /// Committee registry
    Committee(RecordArgs),
    /// Transporter registry
    Transporters(RecordArgs),
    /// Milling log
    Milling(RecordArgs),
}

impl LedgerCommand {
    pub fn split(self) -> (Ledger, RecordArgs) {
        match self {
            Self::PaddyPurchases(args) => (Ledger::PaddyPurchases, args),
            Self::RicePurchases(args) => (Ledger::RicePurchases, args),
            Self::FrkPurchases(args) => (Ledger::FrkPurchases, args),
            Self::GunnyPurchases(args) => (Ledger::GunnyPurchases, args),
            Self::PaddySales(args) => (Ledger::PaddySales, args),
            Self::RiceSales(args) => (Ledger::RiceSales, args),
            Self::BranSales(args) => (Ledger::BranSales, args),
            Self::PaddyInward(args) => (Ledger::PaddyInward, args),
            Self::RiceInward(args) => (Ledger::RiceInward, args),
            Self::RiceOutward(args) => (Ledger::RiceOutward, args),
            Self::GunnyOutward(args) => (Ledger::GunnyOutward, args),
            Self::Parties(args) => (Ledger::Parties, args),
            Self::Brokers(args) => (Ledger::Brokers, args),
            Self::Committee(args) => (Ledger::Committee, args),
            Self::Transporters(args) => (Ledger::Transporters, args),
            Self::Milling(args) => (Ledger::Milling, args),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RECORDS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub command: RecordCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// List one page of records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Create a record
    Create(WriteArgs),

    /// Update a record
    Update {
        /// Record ID
        id: String,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record ID
        id: String,
    },

    /// Delete several records at once
    BulkDelete {
        /// Record IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Import records from a CSV file (header row = field names)
    Import {
        /// CSV file to import
        file: PathBuf,
    },
}

/// Query arguments for `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Rows per page; snapped to 10, 20, 30, 40 or 50
    #[arg(long, short = 'l')]
    pub page_size: Option<u32>,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Field to sort by [default: createdAt]
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort direction [default: desc]
    #[arg(long)]
    pub sort_order: Option<SortOrderArg>,

    /// Filter as field=value (repeatable)
    #[arg(long, short = 'f', value_name = "FIELD=VALUE")]
    pub filter: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortOrderArg {
    Asc,
    Desc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(arg: SortOrderArg) -> Self {
        match arg {
            SortOrderArg::Asc => Self::Asc,
            SortOrderArg::Desc => Self::Desc,
        }
    }
}

/// Field values for `create` / `update`.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Field value as field=value; JSON values are accepted (repeatable)
    #[arg(long = "set", short = 'S', value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// JSON object with the record's fields; --set values win
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
