use std::fmt;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

/// Name of the header and cookie that carry the execution token
pub const EXECUTION_TOKEN_KEY: &str = "jwtToken";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenChainError {
    #[error("execution token requires a session sign-on token")]
    MissingSessionToken,
}

#[derive(Clone, Default)]
struct DerivedTokens {
    session_sign_on: String,
    execution: String,
}

/// Durable credential plus the ephemeral tokens derived from it during a run.
///
/// The durable credential and account id never change. The derived tokens start
/// empty and are filled in order: the session sign-on token first, then the
/// execution token. An execution token is never held without a session token.
///
/// Callers share one chain behind an `Arc` and derive headers on every request,
/// so a refreshed token is observed by every task that runs afterwards.
pub struct TokenChain {
    durable_credential: String,
    account_id: String,
    derived: RwLock<DerivedTokens>,
}

impl TokenChain {
    pub fn new(durable_credential: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            durable_credential: durable_credential.into(),
            account_id: account_id.into(),
            derived: RwLock::new(DerivedTokens::default()),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// `Authorization` value for every endpoint that accepts the durable credential
    pub fn basic_authorization(&self) -> String {
        format!("Basic {}", self.durable_credential)
    }

    pub fn session_sign_on_token(&self) -> String {
        self.read().session_sign_on.clone()
    }

    pub fn execution_token(&self) -> String {
        self.read().execution.clone()
    }

    pub fn has_session_token(&self) -> bool {
        !self.read().session_sign_on.is_empty()
    }

    /// True once both derived tokens are present
    pub fn is_established(&self) -> bool {
        let derived = self.read();
        !derived.session_sign_on.is_empty() && !derived.execution.is_empty()
    }

    /// Store the session sign-on token.
    ///
    /// Replacing it invalidates any execution token derived from the old one.
    pub fn set_session_sign_on_token(&self, token: impl Into<String>) {
        let mut derived = self.write();
        derived.session_sign_on = token.into();
        derived.execution.clear();
    }

    pub fn set_execution_token(&self, token: impl Into<String>) -> Result<(), TokenChainError> {
        let mut derived = self.write();
        if derived.session_sign_on.is_empty() {
            return Err(TokenChainError::MissingSessionToken);
        }
        derived.execution = token.into();
        Ok(())
    }

    /// Headers shared by every task call, derived from the current token state
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", self.basic_authorization()),
            (EXECUTION_TOKEN_KEY, self.execution_token()),
        ]
    }

    /// `Cookie` header value carrying the execution token
    pub fn cookie_header(&self) -> String {
        format!("{}={}", EXECUTION_TOKEN_KEY, self.execution_token())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DerivedTokens> {
        self.derived.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DerivedTokens> {
        self.derived.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TokenChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let derived = self.read();
        f.debug_struct("TokenChain")
            .field("account_id", &self.account_id)
            .field("durable_credential", &"[REDACTED]")
            .field("has_session_token", &!derived.session_sign_on.is_empty())
            .field("has_execution_token", &!derived.execution.is_empty())
            .finish()
    }
}
