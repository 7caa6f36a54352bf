use crate::model::DownloadLocation;
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::debug;

/// External download manager invoked for resolved URLs.
pub const DEFAULT_DOWNLOAD_MANAGER: &str = "aria2c";

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("no download URL available")]
    NoCandidateUrl,
    #[error("failed to create the output directory {path:?}, because of: {cause:?}")]
    FailedToCreateOutputDirectory {
        path: PathBuf,
        cause: std::io::Error,
    },
    #[error("failed to start the download manager {program:?}, because of: {cause:?}")]
    FailedToStartDownloadManager {
        program: String,
        cause: std::io::Error,
    },
}

/// Hands a resolved download location to an external download-manager
/// process.
///
/// The external tool owns retry and resume; this delegate only starts it
/// and never inspects its exit status.
pub struct DownloadDelegate {
    program: String,
    user_agent: String,
}

impl DownloadDelegate {
    pub fn new(program: &str, user_agent: &str) -> Self {
        Self {
            program: program.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Spawns the download manager for the preferred URL of `location`,
    /// creating `output_dir` if absent. Fire-and-forget.
    pub fn dispatch(
        &self,
        location: &DownloadLocation,
        output_dir: &Path,
    ) -> Result<(), DownloadError> {
        let url = location.preferred().ok_or(DownloadError::NoCandidateUrl)?;

        fs::create_dir_all(output_dir).map_err(|cause| {
            DownloadError::FailedToCreateOutputDirectory {
                path: output_dir.to_path_buf(),
                cause,
            }
        })?;

        debug!(program = %self.program, url, "handing off download");
        Command::new(&self.program)
            .arg("--dir")
            .arg(output_dir)
            .arg(format!("--user-agent={}", self.user_agent))
            .arg(url)
            .spawn()
            .map_err(|cause| DownloadError::FailedToStartDownloadManager {
                program: self.program.clone(),
                cause,
            })?;

        Ok(())
    }
}
