//! # sgate CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;

/// schemagate CLI — JSON Schema request validation.
///
/// Checks request documents against validation configs and inspects
/// schema directories.
#[derive(Parser, Debug)]
#[command(name = "sgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate a request document against a validation config.
    Check(sgate_cli::check::CheckArgs),
    /// List schemas in a schema directory.
    Schemas(sgate_cli::schemas::SchemasArgs),
}

/// Exit status for configuration, schema, or IO errors.
const EXIT_ERROR: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match dispatch(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn dispatch(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Check(args) => match sgate_cli::check::run(&args).await? {
            None => {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            }
            Some(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Schemas(args) => {
            for line in sgate_cli::schemas::run(&args)? {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
