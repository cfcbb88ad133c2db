use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use caiyun_types::{
    CloudBalance, Declared, FileEntry, FilePage, ShareLink, SignInStatus, TokenChain,
    UploadRequest,
};

use crate::{ApiError, CloudApi, UploadReceipt};

/// Remote calls recorded by [`MockCloudApi`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockCall {
    SessionToken,
    ExecutionToken,
    SignInStatus,
    SignIn,
    Upload,
    ListFiles,
    ShareLink,
    CloudBalance,
}

struct MockState {
    session_reply: Declared<String>,
    execution_reply: Declared<String>,
    status_rejection: Option<String>,
    signed_in_today: bool,
    sign_in_reply: Declared<()>,
    upload_status: u16,
    pages: Vec<Vec<FileEntry>>,
    list_rejection: Option<String>,
    share_rejection: Option<String>,
    balance: CloudBalance,
    faults: HashSet<MockCall>,

    calls: Vec<MockCall>,
    uploads: Vec<UploadRequest>,
    shared: Vec<FileEntry>,
    cursors: Vec<Option<String>>,
    execution_tokens_seen: Vec<String>,
}

/// Scripted in-memory [`CloudApi`] that records every call.
///
/// Defaults describe a healthy account: both credential steps succeed, the
/// account is not yet checked in, uploads return HTTP 200 and listings are
/// empty. A successful check-in marks the account as checked in for later
/// status queries.
pub struct MockCloudApi {
    state: Mutex<MockState>,
}

impl MockCloudApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                session_reply: Declared::Accepted("sso-token".to_string()),
                execution_reply: Declared::Accepted("jwt-token".to_string()),
                status_rejection: None,
                signed_in_today: false,
                sign_in_reply: Declared::Accepted(()),
                upload_status: 200,
                pages: Vec::new(),
                list_rejection: None,
                share_rejection: None,
                balance: CloudBalance::default(),
                faults: HashSet::new(),
                calls: Vec::new(),
                uploads: Vec::new(),
                shared: Vec::new(),
                cursors: Vec::new(),
                execution_tokens_seen: Vec::new(),
            }),
        }
    }

    pub fn with_session_reply(self, reply: Declared<String>) -> Self {
        self.lock().session_reply = reply;
        self
    }

    pub fn with_execution_reply(self, reply: Declared<String>) -> Self {
        self.lock().execution_reply = reply;
        self
    }

    pub fn with_signed_in_today(self, signed_in: bool) -> Self {
        self.lock().signed_in_today = signed_in;
        self
    }

    /// Make the check-in status query report a declared failure
    pub fn with_status_rejection(self, message: impl Into<String>) -> Self {
        self.lock().status_rejection = Some(message.into());
        self
    }

    pub fn with_sign_in_reply(self, reply: Declared<()>) -> Self {
        self.lock().sign_in_reply = reply;
        self
    }

    pub fn with_upload_status(self, status: u16) -> Self {
        self.lock().upload_status = status;
        self
    }

    /// Serve a single listing page holding `names`, with ids `F1`, `F2`, ...
    pub fn with_files(self, names: &[&str]) -> Self {
        self.with_pages(&[names])
    }

    /// Serve several listing pages; ids are numbered across pages
    pub fn with_pages(self, pages: &[&[&str]]) -> Self {
        let mut next_id = 0;
        let pages = pages
            .iter()
            .map(|names| {
                names
                    .iter()
                    .map(|name| {
                        next_id += 1;
                        FileEntry::new(format!("F{}", next_id), *name)
                    })
                    .collect()
            })
            .collect();
        self.lock().pages = pages;
        self
    }

    pub fn with_list_rejection(self, message: impl Into<String>) -> Self {
        self.lock().list_rejection = Some(message.into());
        self
    }

    pub fn with_share_rejection(self, message: impl Into<String>) -> Self {
        self.lock().share_rejection = Some(message.into());
        self
    }

    pub fn with_balance(self, claimable: u64, total: u64) -> Self {
        self.lock().balance = CloudBalance { claimable, total };
        self
    }

    /// Make `call` fail with a network error
    pub fn with_fault(self, call: MockCall) -> Self {
        self.lock().faults.insert(call);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, call: MockCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.lock().uploads.clone()
    }

    /// Files passed to the share-link call, in call order
    pub fn shared_files(&self) -> Vec<FileEntry> {
        self.lock().shared.clone()
    }

    /// Cursors passed to the listing call, in call order
    pub fn list_cursors(&self) -> Vec<Option<String>> {
        self.lock().cursors.clone()
    }

    /// Execution tokens presented by task calls, in call order
    pub fn execution_tokens_seen(&self) -> Vec<String> {
        self.lock().execution_tokens_seen.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and fail it if a fault was scripted
    fn record(&self, call: MockCall, tokens: &TokenChain) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(call);
        if !matches!(call, MockCall::SessionToken | MockCall::ExecutionToken) {
            state.execution_tokens_seen.push(tokens.execution_token());
        }
        if state.faults.contains(&call) {
            return Err(ApiError::Network(format!("scripted fault for {:?}", call)));
        }
        Ok(())
    }
}

impl Default for MockCloudApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudApi for MockCloudApi {
    async fn fetch_session_token(&self, tokens: &TokenChain) -> Result<Declared<String>, ApiError> {
        self.record(MockCall::SessionToken, tokens)?;
        Ok(self.lock().session_reply.clone())
    }

    async fn fetch_execution_token(
        &self,
        tokens: &TokenChain,
        _session_token: &str,
    ) -> Result<Declared<String>, ApiError> {
        self.record(MockCall::ExecutionToken, tokens)?;
        Ok(self.lock().execution_reply.clone())
    }

    async fn sign_in_status(
        &self,
        tokens: &TokenChain,
    ) -> Result<Declared<SignInStatus>, ApiError> {
        self.record(MockCall::SignInStatus, tokens)?;
        let state = self.lock();
        Ok(match &state.status_rejection {
            Some(message) => Declared::rejected(message.clone()),
            None => Declared::Accepted(SignInStatus {
                signed_in_today: state.signed_in_today,
            }),
        })
    }

    async fn sign_in(&self, tokens: &TokenChain) -> Result<Declared<()>, ApiError> {
        self.record(MockCall::SignIn, tokens)?;
        let mut state = self.lock();
        if state.sign_in_reply.is_accepted() {
            state.signed_in_today = true;
        }
        Ok(state.sign_in_reply.clone())
    }

    async fn upload(
        &self,
        tokens: &TokenChain,
        request: &UploadRequest,
    ) -> Result<UploadReceipt, ApiError> {
        self.record(MockCall::Upload, tokens)?;
        let mut state = self.lock();
        state.uploads.push(request.clone());
        Ok(UploadReceipt {
            status: state.upload_status,
            body: String::new(),
        })
    }

    async fn list_files(
        &self,
        tokens: &TokenChain,
        _directory_id: &str,
        cursor: Option<&str>,
    ) -> Result<Declared<FilePage>, ApiError> {
        self.record(MockCall::ListFiles, tokens)?;
        let mut state = self.lock();
        state.cursors.push(cursor.map(str::to_string));
        if let Some(message) = &state.list_rejection {
            return Ok(Declared::rejected(message.clone()));
        }

        let index = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| ApiError::Parse(format!("unknown cursor: {}", c)))?,
            None => 0,
        };
        let items = state.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < state.pages.len()).then(|| (index + 1).to_string());
        Ok(Declared::Accepted(FilePage { items, next_cursor }))
    }

    async fn create_share_link(
        &self,
        tokens: &TokenChain,
        file: &FileEntry,
    ) -> Result<Declared<ShareLink>, ApiError> {
        self.record(MockCall::ShareLink, tokens)?;
        let mut state = self.lock();
        state.shared.push(file.clone());
        Ok(match &state.share_rejection {
            Some(message) => Declared::rejected(message.clone()),
            None => Declared::Accepted(ShareLink {
                url: format!("https://caiyun.example/s/{}", file.file_id),
            }),
        })
    }

    async fn cloud_balance(&self, tokens: &TokenChain) -> Result<CloudBalance, ApiError> {
        self.record(MockCall::CloudBalance, tokens)?;
        Ok(self.lock().balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_chain_through_cursors() {
        let api = MockCloudApi::new().with_pages(&[&["a", "b"], &["c"]]);
        let tokens = TokenChain::new("cred", "acct");

        let first = api
            .list_files(&tokens, "dir", None)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(first.items[1], FileEntry::new("F2", "b"));
        assert_eq!(first.next_cursor.as_deref(), Some("1"));

        let second = api
            .list_files(&tokens, "dir", first.next_cursor.as_deref())
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(second.items, vec![FileEntry::new("F3", "c")]);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn test_sign_in_marks_account() {
        let api = MockCloudApi::new();
        let tokens = TokenChain::new("cred", "acct");

        api.sign_in(&tokens).await.unwrap();
        let status = api.sign_in_status(&tokens).await.unwrap().into_result().unwrap();
        assert!(status.signed_in_today);
        assert_eq!(api.calls(), vec![MockCall::SignIn, MockCall::SignInStatus]);
    }

    #[tokio::test]
    async fn test_scripted_fault() {
        let api = MockCloudApi::new().with_fault(MockCall::CloudBalance);
        let tokens = TokenChain::new("cred", "acct");

        let result = api.cloud_balance(&tokens).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(api.call_count(MockCall::CloudBalance), 1);
    }
}
