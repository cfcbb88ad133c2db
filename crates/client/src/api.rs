use async_trait::async_trait;
use caiyun_types::{
    CloudBalance, Declared, FileEntry, FilePage, ShareLink, SignInStatus, TokenChain,
    UploadRequest,
};

use crate::ApiError;

/// Base URLs of the services the runner talks to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    /// Identity federation, issues session sign-on tokens
    pub identity: String,
    /// Application portal, exchanges sign-on tokens for execution tokens
    pub portal: String,
    /// Market service: check-in and cloud units
    pub market: String,
    pub upload: String,
    pub files: String,
    pub share: String,
}

impl Endpoints {
    /// Point every service at one base URL
    pub fn all(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            identity: base_url.clone(),
            portal: base_url.clone(),
            market: base_url.clone(),
            upload: base_url.clone(),
            files: base_url.clone(),
            share: base_url,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            identity: "https://user-njs.yun.139.com".to_string(),
            portal: "https://caiyun.feixin.10086.cn:7071".to_string(),
            market: "https://caiyun.feixin.10086.cn".to_string(),
            upload: "https://ose.caiyun.feixin.10086.cn".to_string(),
            files: "https://personal-kd-njs.yun.139.com".to_string(),
            share: "https://yun.139.com".to_string(),
        }
    }
}

/// Reply to an upload; the service signals failure only through the HTTP status
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
    pub body: String,
}

impl UploadReceipt {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// One method per remote call the runner makes.
///
/// Calls that the service answers with a declared status return
/// `Declared`; transport and decoding problems are `ApiError`s.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Exchange the durable credential for a session sign-on token
    async fn fetch_session_token(&self, tokens: &TokenChain) -> Result<Declared<String>, ApiError>;

    /// Exchange a session sign-on token for an execution token
    async fn fetch_execution_token(
        &self,
        tokens: &TokenChain,
        session_token: &str,
    ) -> Result<Declared<String>, ApiError>;

    async fn sign_in_status(&self, tokens: &TokenChain)
        -> Result<Declared<SignInStatus>, ApiError>;

    async fn sign_in(&self, tokens: &TokenChain) -> Result<Declared<()>, ApiError>;

    async fn upload(
        &self,
        tokens: &TokenChain,
        request: &UploadRequest,
    ) -> Result<UploadReceipt, ApiError>;

    /// Read one page of a directory listing, starting at `cursor`
    async fn list_files(
        &self,
        tokens: &TokenChain,
        directory_id: &str,
        cursor: Option<&str>,
    ) -> Result<Declared<FilePage>, ApiError>;

    async fn create_share_link(
        &self,
        tokens: &TokenChain,
        file: &FileEntry,
    ) -> Result<Declared<ShareLink>, ApiError>;

    async fn cloud_balance(&self, tokens: &TokenChain) -> Result<CloudBalance, ApiError>;
}
