use serde::{Deserialize, Serialize};

/// The user identity behind a session token, as reported by the
/// user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: u64,
    pub name: String,
}

/// A single entry of a remote directory listing.
///
/// The `is_dir` flag is kept in its wire form (0 or 1) because the `ls`
/// output prints it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub server_filename: String,
    #[serde(rename = "isdir")]
    pub is_dir: u8,
    pub fs_id: u64,
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.is_dir != 0
    }
}

/// An ordered sequence of candidate download URLs for a resolved file.
///
/// The server returns several mirrors; the last one is the authoritative
/// choice for an actual download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLocation {
    urls: Vec<String>,
}

impl DownloadLocation {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }

    /// All candidate URLs in server-provided order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// The URL to hand to a downloader: the last candidate.
    pub fn preferred(&self) -> Option<&str> {
        self.urls.last().map(String::as_str)
    }
}

/// Response envelope of the user-info endpoint.
///
/// Fields are optional so that a missing field surfaces as an explicit
/// response-shape failure instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct UserInfoResponse {
    #[serde(default)]
    pub errno: i64,
    pub errmsg: Option<String>,
    pub uk: Option<u64>,
    pub baidu_name: Option<String>,
}

/// Response envelope of the directory-listing endpoint.
#[derive(Debug, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub errno: i64,
    pub errmsg: Option<String>,
    pub list: Option<Vec<DirectoryEntry>>,
}

/// One candidate URL in a signed locate-download response.
#[derive(Debug, Deserialize)]
pub struct LocateUrl {
    pub url: String,
}

/// Response envelope of the signed (PCS) locate-download endpoint.
#[derive(Debug, Deserialize)]
pub struct LocateResponse {
    #[serde(default)]
    pub errno: i64,
    pub errmsg: Option<String>,
    pub urls: Option<Vec<LocateUrl>>,
}

/// Response envelope of the fs-id based (xpan) locate-download endpoint.
#[derive(Debug, Deserialize)]
pub struct PanLocateResponse {
    #[serde(default)]
    pub errno: i64,
    pub errmsg: Option<String>,
    pub dlink: Option<Vec<String>>,
}
