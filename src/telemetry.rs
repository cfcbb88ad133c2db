use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("tracing initialization error: {0}")]
    InitError(String),
}

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(level: &str) -> String {
    format!("info,caiyun={}", level.to_lowercase())
}

/// Install the global subscriber, plain or JSON.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str, json: bool) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive(level))
            .map_err(|e| TracingError::Filter(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(fmt::layer().with_target(true).with_level(true).json())
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| TracingError::InitError(e.to_string()))
}
