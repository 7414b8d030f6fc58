mod cli;
mod ops;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use ops::Resolved;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let resolved = Resolved::load(cli.config.as_deref(), cli.database, cli.folder)?;

    match cli.command {
        Commands::Backup { tables, no_data, archive, typed_values } => {
            ops::do_backup(&resolved, tables, no_data, archive, typed_values)?;
        }
        Commands::Restore { path, keep_tables, yes } => {
            ops::do_restore(&resolved, &path, keep_tables, yes)?;
        }
        Commands::List => {
            ops::do_list(&resolved)?;
        }
        Commands::Version => {
            ops::do_version();
        }
    }

    Ok(())
}
