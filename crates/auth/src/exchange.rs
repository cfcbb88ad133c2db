use std::fmt;
use std::sync::Arc;

use caiyun_client::{ApiError, CloudApi};
use caiyun_types::{Declared, TokenChain, TokenChainError};
use thiserror::Error;
use tracing::{info, warn};

/// The two remote steps of the exchange, in the order they run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeStep {
    /// Identity federation issues a session sign-on token
    SessionToken,
    /// The application portal turns that into an execution token
    ExecutionToken,
}

impl fmt::Display for ExchangeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeStep::SessionToken => write!(f, "session token"),
            ExchangeStep::ExecutionToken => write!(f, "execution token"),
        }
    }
}

/// Result of a complete exchange that reached the service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Established,
    /// The service declared `step` failed; later steps were not attempted
    Failed { step: ExchangeStep, reason: String },
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Execution token requested before a session token was stored
    #[error("cannot derive an execution token without a session sign-on token")]
    MissingSessionToken,

    #[error("{step} request failed: {source}")]
    Api {
        step: ExchangeStep,
        #[source]
        source: ApiError,
    },
}

impl From<TokenChainError> for ExchangeError {
    fn from(e: TokenChainError) -> Self {
        match e {
            TokenChainError::MissingSessionToken => ExchangeError::MissingSessionToken,
        }
    }
}

/// Turns the durable credential into the execution token every task needs.
///
/// Step one stores a session sign-on token in the shared [`TokenChain`]; step two
/// uses it to obtain the execution token. A declared failure is returned as a
/// value so it can be attributed to its step.
pub struct CredentialExchange {
    api: Arc<dyn CloudApi>,
    tokens: Arc<TokenChain>,
}

impl CredentialExchange {
    pub fn new(api: Arc<dyn CloudApi>, tokens: Arc<TokenChain>) -> Self {
        Self { api, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenChain> {
        &self.tokens
    }

    /// Step one: obtain and store the session sign-on token
    pub async fn derive_session_token(&self) -> Result<Declared<()>, ExchangeError> {
        let step = ExchangeStep::SessionToken;
        info!(account = %self.tokens.account_id(), step = %step, "requesting token");

        let reply = self
            .api
            .fetch_session_token(&self.tokens)
            .await
            .map_err(|source| ExchangeError::Api { step, source })?;

        Ok(match reply {
            Declared::Accepted(token) => {
                self.tokens.set_session_sign_on_token(token);
                Declared::Accepted(())
            }
            Declared::Rejected { message } => {
                warn!(step = %step, reason = %message, "token request rejected");
                Declared::Rejected { message }
            }
        })
    }

    /// Step two: obtain and store the execution token.
    ///
    /// Fails with [`ExchangeError::MissingSessionToken`] before any remote call
    /// when step one has not stored a session token.
    pub async fn derive_execution_token(&self) -> Result<Declared<()>, ExchangeError> {
        let step = ExchangeStep::ExecutionToken;
        let session_token = self.tokens.session_sign_on_token();
        if session_token.is_empty() {
            return Err(ExchangeError::MissingSessionToken);
        }
        info!(step = %step, "requesting token");

        let reply = self
            .api
            .fetch_execution_token(&self.tokens, &session_token)
            .await
            .map_err(|source| ExchangeError::Api { step, source })?;

        match reply {
            Declared::Accepted(token) => {
                self.tokens.set_execution_token(token)?;
                Ok(Declared::Accepted(()))
            }
            Declared::Rejected { message } => {
                warn!(step = %step, reason = %message, "token request rejected");
                Ok(Declared::Rejected { message })
            }
        }
    }

    /// Run both steps, stopping after a rejected first step
    pub async fn establish(&self) -> Result<ExchangeOutcome, ExchangeError> {
        if let Declared::Rejected { message } = self.derive_session_token().await? {
            return Ok(ExchangeOutcome::Failed {
                step: ExchangeStep::SessionToken,
                reason: message,
            });
        }

        if let Declared::Rejected { message } = self.derive_execution_token().await? {
            return Ok(ExchangeOutcome::Failed {
                step: ExchangeStep::ExecutionToken,
                reason: message,
            });
        }

        info!("execution token established");
        Ok(ExchangeOutcome::Established)
    }
}
