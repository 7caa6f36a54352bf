use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "pancli";
pub const DEFAULT_CREDENTIAL_FILE_NAME: &str = "credentials.json";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no BDUSS found; please login first")]
    NotAuthenticated,
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to load credential data, because of: {cause:?}")]
    FailedToLoadData { cause: Box<dyn std::error::Error> },
    #[error("failed to write credential data to file, because of: {cause:?}")]
    FailedToWriteData { cause: Box<dyn std::error::Error> },
}

/// On-disk shape of the credential file: a single JSON object holding the
/// session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialFile {
    bduss: String,
}

/// Stores the session token in a local file.
///
/// The token is opaque to this client; no format validation and no expiry
/// tracking happen here.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store bound to the default credential file location.
    pub fn open_default() -> Result<Self, CredentialError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_path() -> Result<PathBuf, CredentialError> {
        // Check for PANCLI_CONFIG_DIR environment variable first
        if let Ok(config_dir_str) = std::env::var("PANCLI_CONFIG_DIR") {
            let mut credential_path = PathBuf::from(config_dir_str);
            credential_path.push(DEFAULT_CREDENTIAL_FILE_NAME);
            return Ok(credential_path);
        }

        match config_dir() {
            Some(configuration_directory) => {
                let mut default_credential_path = configuration_directory;
                default_credential_path.push(DEFAULT_APPLICATION_ID);
                default_credential_path.push(DEFAULT_CREDENTIAL_FILE_NAME);

                Ok(default_credential_path)
            }
            None => Err(CredentialError::FailedToFindConfigurationDirectory),
        }
    }

    /// Writes the token, overwriting any prior content.
    pub fn save(&self, token: &str) -> Result<(), CredentialError> {
        debug!("Saving credential to {}...", self.path.display());

        if let Some(parent) = self.path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return Err(CredentialError::FailedToFindConfigurationDirectory);
            }
        }

        let contents = serde_json::to_string(&CredentialFile {
            bduss: token.to_string(),
        })
        .map_err(|cause| CredentialError::FailedToWriteData {
            cause: Box::new(cause),
        })?;

        fs::write(&self.path, contents).map_err(|cause| CredentialError::FailedToWriteData {
            cause: Box::new(cause),
        })
    }

    /// Returns the stored token, or `NotAuthenticated` if none was ever
    /// saved.
    pub fn load(&self) -> Result<String, CredentialError> {
        if !self.path.exists() {
            return Err(CredentialError::NotAuthenticated);
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|cause| CredentialError::FailedToLoadData {
                cause: Box::new(cause),
            })?;
        let credential: CredentialFile = serde_json::from_str(&contents).map_err(|cause| {
            CredentialError::FailedToLoadData {
                cause: Box::new(cause),
            }
        })?;

        Ok(credential.bduss)
    }
}
