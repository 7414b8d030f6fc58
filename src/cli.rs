use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// sqlsnap: dump databases to SQL scripts and restore them
#[derive(Parser, Debug)]
#[command(name = "sqlsnap", version, about = "Dump a database to a replayable SQL script, or restore one.", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Database target (e.g., sqlite://app.db or app.db)
    #[arg(short = 'd', long = "database", global = true)]
    pub database: Option<String>,

    /// Folder backups are written to
    #[arg(short = 'f', long = "folder", global = true)]
    pub folder: Option<PathBuf>,

    /// Settings file (defaults to ./sqlsnap.json when present)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump structure and rows to a new script in the backup folder
    Backup {
        /// Only dump these tables (repeatable); all tables when omitted
        #[arg(short = 't', long = "table", value_name = "table")]
        tables: Vec<String>,

        /// Dump table structure only
        #[arg(long)]
        no_data: bool,

        /// Pack the script into a .zip archive
        #[arg(long)]
        archive: bool,

        /// Write NULL and numbers unquoted
        #[arg(long)]
        typed_values: bool,
    },

    /// Replay a script or archive produced by `backup`
    Restore {
        /// Path to a .sql script or .zip archive
        path: PathBuf,

        /// Do not drop the script's tables before replaying it
        #[arg(long)]
        keep_tables: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List backups in the backup folder
    List,

    /// Print CLI version
    Version,
}
