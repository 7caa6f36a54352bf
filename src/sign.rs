use md5::{Digest, Md5};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Salt appended when deriving the `rand` field of the path-signed scheme.
pub const PATH_SIGN_SALT: &str = "ebrcUYiuXZa2XGu7KIYKxUrqfnOfpDF";

/// Literal appended to the sorted field concatenation before hashing in
/// the client-signed scheme.
pub const CLIENT_SIGN_SUFFIX: &str = "x6nMtDJb3NyFEPS8JkbGwUqzLouJuQCB";

pub const CLIENT_TYPE: &str = "android";
pub const CLIENT_VERSION: &str = "2.2.51.6";
pub const ORIGIN_TAG: &str = "netdisk";

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

fn unix_time() -> u64 {
    // The epoch is always in the past; a failure here would mean a clock
    // set before 1970.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn random_device_model() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("android-{}", suffix)
}

/// Device id derived from the token alone, used by the path-signed scheme
/// for both the `devuid` and `cuid` fields.
pub fn device_uid(token: &str) -> String {
    md5_hex(token).to_uppercase()
}

/// The `rand` field of the path-signed scheme.
pub fn path_sign(token: &str, user_id: u64) -> String {
    sha1_hex(&format!(
        "{}{}{}",
        sha1_hex(token),
        user_id,
        PATH_SIGN_SALT
    ))
}

/// Request signature scheme.
///
/// The two variants correspond to two versions of the vendor protocol.
/// Every derived value must match the vendor recipe byte for byte; any
/// deviation is rejected by the remote server, not locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signer {
    /// Older scheme: per-request timestamp plus a SHA1 chain over the
    /// token and user id.
    PathSigned,
    /// Newer scheme: client-identity fields plus an MD5 over the sorted
    /// field concatenation. `device_model` pins the otherwise random
    /// per-call model string.
    ClientSigned { device_model: Option<String> },
}

impl Signer {
    /// Augments `fields` with the authentication fields of this scheme.
    pub fn apply(&self, fields: &mut BTreeMap<String, String>, token: &str, user_id: u64) {
        match self {
            Signer::PathSigned => {
                let devuid = device_uid(token);
                fields.insert("time".to_string(), unix_time().to_string());
                fields.insert("rand".to_string(), path_sign(token, user_id));
                fields.insert("devuid".to_string(), devuid.clone());
                fields.insert("cuid".to_string(), devuid);
            }
            Signer::ClientSigned { device_model } => {
                let model = device_model
                    .clone()
                    .unwrap_or_else(random_device_model);
                client_sign(fields, token, &model);
            }
        }
        trace!(scheme = ?self, "signed request fields");
    }
}

/// Applies the client-signed recipe to a field map.
///
/// Any pre-existing `sign` field is discarded before the client-identity
/// fields are injected and the signature is computed over the remaining
/// fields sorted by key.
fn client_sign(fields: &mut BTreeMap<String, String>, token: &str, model: &str) {
    fields.remove("sign");

    let devuid = md5_hex(&format!("{}_{}", model, token));
    let cuid = format!(
        "{}|{}",
        md5_hex(&format!(
            "{}_{}_{}_{}",
            token, CLIENT_VERSION, devuid, ORIGIN_TAG
        ))
        .to_uppercase(),
        devuid.chars().rev().collect::<String>()
    );

    fields.insert("client_type".to_string(), CLIENT_TYPE.to_string());
    fields.insert("version".to_string(), CLIENT_VERSION.to_string());
    fields.insert("model".to_string(), model.to_string());
    fields.insert("devuid".to_string(), devuid);
    fields.insert("cuid".to_string(), cuid);

    // BTreeMap iterates in key order, which is exactly the sorted
    // concatenation the recipe requires.
    let mut base = String::new();
    for (key, value) in fields.iter() {
        base.push_str(key);
        base.push('=');
        base.push_str(value);
    }
    base.push_str(CLIENT_SIGN_SUFFIX);

    let sign = md5_hex(&base).to_uppercase();
    fields.insert("sign".to_string(), sign);
}
