//! `cluster-pki` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cluster_pki_cli::cli::{Cli, Commands};
use cluster_pki_cli::commands::{InitCaCommand, PruneCommand, ReconcileCommand};
use cluster_pki_cli::output::OutputFormat;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), cluster_pki_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::InitCa(args) => {
            InitCaCommand::new().execute(&mut stdout, &format, &args)?;
        }
        Commands::Reconcile(args) => {
            let cmd = ReconcileCommand::new(&cli.cluster_domain);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Prune(args) => {
            PruneCommand::new().execute(&mut stdout, &format, &args)?;
        }
    }

    Ok(())
}
