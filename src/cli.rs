use pancli::client::{ApiError, PanApiClient, PanApiConfig};
use pancli::commands::{
    create_cli_commands, COMMAND_LOCATE, COMMAND_LOGIN, COMMAND_LS, COMMAND_WHO, PARAMETER_BDUSS,
    PARAMETER_DOWNLOAD, PARAMETER_FROM_PAN, PARAMETER_OUTPUT_DIR, PARAMETER_PATH,
};
use pancli::credentials::{CredentialError, CredentialStore};
use pancli::downloader::{DownloadDelegate, DownloadError, DEFAULT_DOWNLOAD_MANAGER};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Undefined or unsupported subcommand")]
    UnsupportedSubcommand(String),
}

/// Failure of a single command run. Rendered by the dispatcher as one
/// `Error: <message>` line; the process still terminates successfully.
#[derive(Debug, Error)]
enum CommandError {
    #[error("{0}")]
    CredentialError(#[from] CredentialError),
    #[error("{0}")]
    ApiError(#[from] ApiError),
    #[error("{0}")]
    DownloadError(#[from] DownloadError),
}

pub async fn execute_command(config: PanApiConfig) -> Result<(), CliError> {
    let commands = create_cli_commands();

    match commands.subcommand() {
        Some((COMMAND_LOGIN, sub_matches)) => {
            let Some(bduss) = sub_matches.get_one::<String>(PARAMETER_BDUSS) else {
                println!("Usage: pancli login --bduss <BDUSS>");
                return Ok(());
            };
            report(run_login(bduss));
            Ok(())
        }
        Some((COMMAND_WHO, _)) => {
            report(run_who(config).await);
            Ok(())
        }
        Some((COMMAND_LS, sub_matches)) => {
            let Some(path) = sub_matches.get_one::<String>(PARAMETER_PATH) else {
                println!("Usage: pancli ls --path <directory>");
                return Ok(());
            };
            report(run_ls(config, path).await);
            Ok(())
        }
        Some((COMMAND_LOCATE, sub_matches)) => {
            let Some(path) = sub_matches.get_one::<String>(PARAMETER_PATH) else {
                println!("Usage: pancli locate --path <file>");
                return Ok(());
            };
            let from_pan = sub_matches.get_flag(PARAMETER_FROM_PAN);
            let download = sub_matches.get_flag(PARAMETER_DOWNLOAD);
            let output_dir = sub_matches
                .get_one::<PathBuf>(PARAMETER_OUTPUT_DIR)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(pancli::commands::DEFAULT_OUTPUT_DIR));
            report(run_locate(config, path, from_pan, download, &output_dir).await);
            Ok(())
        }
        None => Err(CliError::UnsupportedSubcommand(String::from("unknown"))),
        _ => unreachable!(),
    }
}

/// Renders a command failure as a single human-readable line.
fn report(result: Result<(), CommandError>) {
    if let Err(e) = result {
        println!("Error: {}", e);
    }
}

fn run_login(bduss: &str) -> Result<(), CommandError> {
    let store = CredentialStore::open_default()?;
    store.save(bduss)?;
    println!("Successfully logged in.");
    Ok(())
}

async fn run_who(config: PanApiConfig) -> Result<(), CommandError> {
    let token = CredentialStore::open_default()?.load()?;
    let client = PanApiClient::new(config)?;
    let user = client.get_user_info(&token).await?;
    println!("Current user: {} (UID: {})", user.name, user.id);
    Ok(())
}

async fn run_ls(config: PanApiConfig, path: &str) -> Result<(), CommandError> {
    let token = CredentialStore::open_default()?.load()?;
    let client = PanApiClient::new(config)?;
    let entries = client.list_directory(&token, path).await?;
    // Server order is printed verbatim.
    for entry in entries {
        println!("{}\t{}", entry.is_dir, entry.path);
    }
    Ok(())
}

async fn run_locate(
    config: PanApiConfig,
    path: &str,
    from_pan: bool,
    download: bool,
    output_dir: &PathBuf,
) -> Result<(), CommandError> {
    let token = CredentialStore::open_default()?.load()?;
    let user_agent = config.user_agent.clone();
    let client = PanApiClient::new(config)?;

    let location = if from_pan {
        let fs_ids = client.find_fs_ids(&token, path).await?;
        client
            .resolve_download_location_by_fs_ids(&token, &fs_ids)
            .await?
    } else {
        let user = client.get_user_info(&token).await?;
        client
            .resolve_download_location(&token, path, user.id)
            .await?
    };

    if download {
        let delegate = DownloadDelegate::new(DEFAULT_DOWNLOAD_MANAGER, &user_agent);
        delegate.dispatch(&location, output_dir)?;
        println!(
            "Download handed off to {} (output directory: {})",
            DEFAULT_DOWNLOAD_MANAGER,
            output_dir.display()
        );
    } else {
        for url in location.urls() {
            println!("{}", url);
        }
    }

    Ok(())
}
