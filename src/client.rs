use crate::model::{
    DirectoryEntry, DownloadLocation, FileListResponse, LocateResponse, PanLocateResponse,
    UserIdentity, UserInfoResponse,
};
use crate::sign::Signer;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// User-Agent the vendor's mobile clients present; the API rejects
/// unrecognized agents.
pub const DEFAULT_USER_AGENT: &str = "netdisk;2.2.51.6;netdisk;10.0.63;PC;android-android";
pub const DEFAULT_XPAN_BASE_URL: &str = "https://pan.baidu.com/rest/2.0/xpan";
pub const DEFAULT_PCS_BASE_URL: &str = "https://d.pcs.baidu.com/rest/2.0/pcs";

const APP_ID: &str = "250528";
const LOCATE_RETRY_ATTEMPTS: u32 = 3;
const ERRNO_VERIFICATION_REQUIRED: i64 = 9019;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("error during HTTP request: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("unexpected response from server: status code {0}")]
    RemoteError(StatusCode),
    #[error("server reported error {code}: {message}")]
    RemoteApiError { code: i64, message: String },
    #[error("'{field}' key not found in the response")]
    ResponseShapeError { field: &'static str },
    #[error("file '{0}' not found")]
    NotFound(String),
    #[error("verification required; please complete the verification steps on the Baidu website")]
    VerificationRequired,
    #[error("failed to locate a download URL after {0} attempts")]
    RetriesExhausted(u32),
}

/// Connection settings for the Netdisk API.
///
/// Endpoints, User-Agent and the retry delay are injected here rather
/// than read from globals so that tests can point the client at a mock
/// server and run the retry loop without wall-clock sleeps.
#[derive(Debug, Clone)]
pub struct PanApiConfig {
    pub xpan_base_url: Url,
    pub pcs_base_url: Url,
    pub user_agent: String,
    pub retry_delay: Duration,
    pub signer: Signer,
}

impl Default for PanApiConfig {
    fn default() -> Self {
        Self {
            xpan_base_url: Url::parse(DEFAULT_XPAN_BASE_URL).expect("valid default base URL"),
            pcs_base_url: Url::parse(DEFAULT_PCS_BASE_URL).expect("valid default base URL"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry_delay: Duration::from_secs(1),
            signer: Signer::PathSigned,
        }
    }
}

/// Client for the Netdisk REST API.
///
/// Every operation is a single synchronous round trip; only download
/// link resolution carries a small bounded retry on HTTP 500.
pub struct PanApiClient {
    client: Client,
    config: PanApiConfig,
}

impl PanApiClient {
    pub fn new(config: PanApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PanApiConfig {
        &self.config
    }

    /// GET request carrying the fixed User-Agent and the token as the
    /// BDUSS cookie, the way the mobile clients authenticate.
    fn get(&self, url: String, token: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("User-Agent", &self.config.user_agent)
            .header("Cookie", format!("BDUSS={}", token))
    }

    /// Resolves the identity behind a session token.
    pub async fn get_user_info(&self, token: &str) -> Result<UserIdentity, ApiError> {
        let url = endpoint(&self.config.xpan_base_url, "nas");
        let response = self
            .get(url, token)
            .query(&[("method", "uinfo")])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::RemoteError(status));
        }

        let body: UserInfoResponse = response.json().await?;
        trace!(errno = body.errno, "user info response received");
        if body.errno != 0 {
            return Err(ApiError::RemoteApiError {
                code: body.errno,
                message: body.errmsg.unwrap_or_default(),
            });
        }

        let id = body.uk.ok_or(ApiError::ResponseShapeError { field: "uk" })?;
        let name = body.baidu_name.ok_or(ApiError::ResponseShapeError {
            field: "baidu_name",
        })?;

        Ok(UserIdentity { id, name })
    }

    /// Lists a remote directory. Entry order is the server's `order=name`
    /// contract; no local re-sorting happens.
    pub async fn list_directory(
        &self,
        token: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, ApiError> {
        debug!(path, "listing directory");
        let url = endpoint(&self.config.xpan_base_url, "file");
        let response = self
            .get(url, token)
            .query(&[
                ("method", "list"),
                ("dir", path),
                ("order", "name"),
                ("start", "0"),
                ("limit", "100"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::RemoteError(status));
        }

        let body: FileListResponse = response.json().await?;
        if body.errno != 0 {
            return Err(ApiError::RemoteApiError {
                code: body.errno,
                message: body.errmsg.unwrap_or_default(),
            });
        }

        body.list.ok_or(ApiError::ResponseShapeError { field: "list" })
    }

    /// Finds the directory entry for `path` by listing its parent and
    /// matching on exact path or filename. The first match wins.
    pub async fn find_entry(&self, token: &str, path: &str) -> Result<DirectoryEntry, ApiError> {
        let (parent, file_name) = split_path(path);
        let entries = self.list_directory(token, parent).await?;
        entries
            .into_iter()
            .find(|entry| entry.path == path || entry.server_filename == file_name)
            .ok_or_else(|| ApiError::NotFound(path.to_string()))
    }

    /// Collects the fs-ids of every entry matching `path` by exact path
    /// or filename, for the fs-id based resolution flow.
    pub async fn find_fs_ids(&self, token: &str, path: &str) -> Result<Vec<u64>, ApiError> {
        let (parent, file_name) = split_path(path);
        let entries = self.list_directory(token, parent).await?;
        let fs_ids: Vec<u64> = entries
            .iter()
            .filter(|entry| entry.path == path || entry.server_filename == file_name)
            .map(|entry| entry.fs_id)
            .collect();

        if fs_ids.is_empty() {
            return Err(ApiError::NotFound(path.to_string()));
        }
        Ok(fs_ids)
    }

    /// Resolves the download location of `path` through the signed PCS
    /// endpoint.
    ///
    /// Retries up to 3 times on HTTP 500 with a fixed delay between
    /// attempts. An `errno` of 9019 means the vendor demands out-of-band
    /// human verification and aborts resolution without further retries.
    pub async fn resolve_download_location(
        &self,
        token: &str,
        path: &str,
        user_id: u64,
    ) -> Result<DownloadLocation, ApiError> {
        let entry = self.find_entry(token, path).await?;
        trace!(fs_id = entry.fs_id, "matched directory entry");

        let mut fields: BTreeMap<String, String> = [
            ("method", "locatedownload"),
            ("app_id", APP_ID),
            ("path", path),
            ("ver", "4.0"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        self.config.signer.apply(&mut fields, token, user_id);

        let url = endpoint(&self.config.pcs_base_url, "file");
        for attempt in 1..=LOCATE_RETRY_ATTEMPTS {
            let response = self.get(url.clone(), token).query(&fields).send().await?;
            let status = response.status();

            if status == StatusCode::OK {
                let body: LocateResponse = response.json().await?;
                if body.errno == ERRNO_VERIFICATION_REQUIRED {
                    return Err(ApiError::VerificationRequired);
                }
                if body.errno != 0 {
                    return Err(ApiError::RemoteApiError {
                        code: body.errno,
                        message: body.errmsg.unwrap_or_default(),
                    });
                }
                let urls = body.urls.ok_or(ApiError::ResponseShapeError { field: "urls" })?;
                return Ok(DownloadLocation::new(
                    urls.into_iter().map(|u| u.url).collect(),
                ));
            }

            if status == StatusCode::INTERNAL_SERVER_ERROR {
                debug!(attempt, "internal server error from download locator, retrying");
                if attempt < LOCATE_RETRY_ATTEMPTS {
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                continue;
            }

            return Err(ApiError::RemoteError(status));
        }

        Err(ApiError::RetriesExhausted(LOCATE_RETRY_ATTEMPTS))
    }

    /// Resolves download locations directly from known fs-ids through the
    /// xpan endpoint. A single request, no retry.
    pub async fn resolve_download_location_by_fs_ids(
        &self,
        token: &str,
        fs_ids: &[u64],
    ) -> Result<DownloadLocation, ApiError> {
        let fs_ids_json = serde_json::to_string(fs_ids)?;
        let url = endpoint(&self.config.xpan_base_url, "file");
        let response = self
            .get(url, token)
            .query(&[
                ("method", "locatedownload"),
                ("app_id", APP_ID),
                ("fs_ids", fs_ids_json.as_str()),
                ("ver", "2.1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::RemoteError(status));
        }

        let body: PanLocateResponse = response.json().await?;
        if body.errno != 0 {
            return Err(ApiError::RemoteApiError {
                code: body.errno,
                message: body.errmsg.unwrap_or_default(),
            });
        }

        let urls = body.dlink.ok_or(ApiError::ResponseShapeError { field: "dlink" })?;
        Ok(DownloadLocation::new(urls))
    }
}

/// Joins a base URL and a method path, tolerating a trailing slash on
/// the base (a bare origin URL always carries one).
fn endpoint(base: &Url, method_path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), method_path)
}

/// Splits a remote path into its parent directory and file name, the way
/// the vendor paths work (always '/'-separated, absolute).
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(index) => (&path[..index], &path[index + 1..]),
        None => ("", path),
    }
}
