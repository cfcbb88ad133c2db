use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Today's check-in state as reported by the market service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInStatus {
    pub signed_in_today: bool,
}

/// One entry of a directory listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_id: String,
    pub name: String,
}

impl FileEntry {
    pub fn new(file_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            name: name.into(),
        }
    }
}

/// One page of a directory listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePage {
    pub items: Vec<FileEntry>,

    /// Cursor for the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

/// Public link produced for a shared file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
}

/// Cloud units reported by the quota endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudBalance {
    /// Units waiting to be claimed
    pub claimable: u64,

    /// Units accumulated so far
    pub total: u64,
}

/// Metadata sent ahead of an upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEnvelope {
    pub owner_account: String,
    pub content_name: String,
    pub content_size: u64,

    /// Uppercase hex MD5 of the payload
    pub digest: String,

    /// Local time formatted `%Y%m%d%H%M%S`
    pub modify_time: String,

    pub parent_catalog_id: String,
}

impl UploadEnvelope {
    /// Describe `payload`, computing its size and digest
    pub fn for_payload(
        owner_account: impl Into<String>,
        content_name: impl Into<String>,
        parent_catalog_id: impl Into<String>,
        modify_time: impl Into<String>,
        payload: &[u8],
    ) -> Self {
        Self {
            owner_account: owner_account.into(),
            content_name: content_name.into(),
            content_size: payload.len() as u64,
            digest: content_digest(payload),
            modify_time: modify_time.into(),
            parent_catalog_id: parent_catalog_id.into(),
        }
    }
}

/// Envelope plus the bytes it describes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    pub envelope: UploadEnvelope,
    pub payload: Vec<u8>,
}

/// Uppercase hex MD5, the digest format the upload service expects
pub fn content_digest(payload: &[u8]) -> String {
    hex::encode_upper(Md5::digest(payload))
}
