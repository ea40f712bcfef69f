use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mvc",
    about = "Materialized-view cache: replay patch streams and inspect cached state",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Journal file; overrides the journal named in the configuration
    #[arg(long, global = true)]
    pub journal: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a JSON-lines stream of patch / mjolnir messages in order
    Replay(ReplayArgs),
    /// Print the current value of one object in a branch
    Get(GetArgs),
    /// Run a diagnostic query given as JSON
    Query(QueryArgs),
    /// Point a new change set at another change set's snapshot
    Link(LinkArgs),
    /// Reclaim a closed change set
    Prune(PruneArgs),
    /// Drop local state for a change set (or its whole workspace)
    Resync(ResyncArgs),
    /// Show row counts per relation
    Stats,
    /// Rewrite the journal as a single transaction
    Compact,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Message file, or `-` for stdin
    pub file: PathBuf,
    /// Report failing messages and continue instead of stopping
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Args)]
pub struct GetArgs {
    pub workspace: String,
    pub change_set: String,
    pub kind: String,
    pub id: String,
    /// Resolve the object as a list of `kind:args:checksum` references
    #[arg(long)]
    pub list: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    /// e.g. `{"statement":"count_atoms"}`
    pub statement: String,
}

#[derive(Args)]
pub struct LinkArgs {
    pub workspace: String,
    pub from: String,
    pub to: String,
}

#[derive(Args)]
pub struct PruneArgs {
    pub workspace: String,
    pub change_set: String,
}

#[derive(Args)]
pub struct ResyncArgs {
    pub workspace: String,
    pub change_set: String,
    /// Drop every change set of the workspace
    #[arg(long)]
    pub force: bool,
}
