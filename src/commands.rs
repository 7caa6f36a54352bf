use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub const COMMAND_LOGIN: &str = "login";
pub const COMMAND_WHO: &str = "who";
pub const COMMAND_LS: &str = "ls";
pub const COMMAND_LOCATE: &str = "locate";

pub const PARAMETER_BDUSS: &str = "bduss";
pub const PARAMETER_PATH: &str = "path";
pub const PARAMETER_FROM_PAN: &str = "from-pan";
pub const PARAMETER_DOWNLOAD: &str = "download";
pub const PARAMETER_OUTPUT_DIR: &str = "output-dir";

pub const DEFAULT_OUTPUT_DIR: &str = "./downloads";

pub fn create_cli_commands() -> ArgMatches {
    // Required values are declared optional here on purpose: a missing
    // value prints a usage line from the dispatcher instead of a clap
    // error, and the process still terminates successfully.
    let bduss_parameter = Arg::new(PARAMETER_BDUSS)
        .long(PARAMETER_BDUSS)
        .num_args(1)
        .required(false)
        .help("BDUSS session token for login");

    let path_parameter = Arg::new(PARAMETER_PATH)
        .long(PARAMETER_PATH)
        .num_args(1)
        .required(false)
        .help("Remote path");

    let from_pan_parameter = Arg::new(PARAMETER_FROM_PAN)
        .long(PARAMETER_FROM_PAN)
        .action(ArgAction::SetTrue)
        .help("Resolve through the pan API by file-system id instead of the signed path scheme");

    let download_parameter = Arg::new(PARAMETER_DOWNLOAD)
        .long(PARAMETER_DOWNLOAD)
        .action(ArgAction::SetTrue)
        .help("Hand the resolved URL to the external download manager instead of printing it");

    let output_dir_parameter = Arg::new(PARAMETER_OUTPUT_DIR)
        .long(PARAMETER_OUTPUT_DIR)
        .num_args(1)
        .required(false)
        .default_value(DEFAULT_OUTPUT_DIR)
        .help("Destination directory for a delegated download")
        .value_parser(clap::value_parser!(PathBuf));

    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(COMMAND_LOGIN)
                .about("stores a BDUSS session token")
                .arg(bduss_parameter),
        )
        .subcommand(Command::new(COMMAND_WHO).about("shows the currently authenticated user"))
        .subcommand(
            Command::new(COMMAND_LS)
                .about("lists a remote directory")
                .arg(path_parameter.clone()),
        )
        .subcommand(
            Command::new(COMMAND_LOCATE)
                .about("resolves direct download URLs for a remote file")
                .arg(path_parameter)
                .arg(from_pan_parameter)
                .arg(download_parameter)
                .arg(output_dir_parameter),
        )
        .get_matches()
}
