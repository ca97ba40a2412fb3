use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "putio-janitor")]
#[command(version)]
#[command(about = "Keeps a put.io account under its storage thresholds", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one reclamation pass (snapshot, plan, execute)
    Clean(CleanArgs),

    /// Show account usage relative to the configured thresholds
    Status(StatusArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Clean
// ============================================================================

#[derive(Parser)]
pub struct CleanArgs {
    /// put.io OAuth token
    #[arg(long, env = "PUTIO_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Minimum free space to restore, in GB (critical floor)
    #[arg(long, env = "PUTIO_CRITICAL_FREE_GB", default_value = "10")]
    pub critical_free_gb: f64,

    /// Ceiling on non-trash usage, in GB; 0 disables the comfort pass
    #[arg(long, env = "PUTIO_COMFORT_USED_GB", default_value = "0")]
    pub comfort_used_gb: f64,

    /// Minimum age before a trashed item may be permanently deleted, in days
    #[arg(long, env = "PUTIO_MIN_TRASH_AGE_DAYS", default_value = "2")]
    pub min_trash_age_days: i64,

    /// Comma-separated names of root folders the janitor may touch
    #[arg(
        long,
        env = "PUTIO_FOLDERS",
        value_delimiter = ',',
        default_value = "chill.institute,putfirst"
    )]
    pub folders: Vec<String>,

    /// Total attempts per remote call
    #[arg(long, env = "PUTIO_MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Seconds to wait between retry attempts
    #[arg(long, env = "PUTIO_RETRY_DELAY_SECS", default_value = "5")]
    pub retry_delay_secs: u64,

    /// Plan and report without touching the account
    #[arg(short = 'n', long, env = "PUTIO_DRY_RUN")]
    pub dry_run: bool,

    /// Allow deleting under-age trash when nothing else can satisfy the
    /// critical floor
    #[arg(long)]
    pub delete_young_trash: bool,
}

// ============================================================================
// Status
// ============================================================================

#[derive(Parser)]
pub struct StatusArgs {
    /// put.io OAuth token
    #[arg(long, env = "PUTIO_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Minimum free space floor, in GB, for the threshold readout
    #[arg(long, env = "PUTIO_CRITICAL_FREE_GB", default_value = "10")]
    pub critical_free_gb: f64,

    /// Ceiling on non-trash usage, in GB; 0 means no ceiling
    #[arg(long, env = "PUTIO_COMFORT_USED_GB", default_value = "0")]
    pub comfort_used_gb: f64,
}
