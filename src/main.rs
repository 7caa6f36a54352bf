use pancli::client::PanApiConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{execute_command, CliError};

#[derive(Error, Debug)]
enum PancliError {
    #[error(transparent)]
    CliError(#[from] CliError),
}

/// Main entry point for the program
#[tokio::main]
async fn main() -> Result<(), PancliError> {
    // Intialize the logging subsystem
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Vendor endpoints, User-Agent and signature scheme for this run
    let config = PanApiConfig::default();

    // Parse and execute the CLI command
    match execute_command(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ::std::process::exit(exitcode::USAGE);
        }
    }
}
