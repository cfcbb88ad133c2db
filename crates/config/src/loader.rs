//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result};
use config::{Config, Environment, File, FileFormat, Map};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layers configuration sources, lowest precedence first:
/// built-in defaults, an optional file, `.env`, then the process environment.
///
/// `.env` is loaded with `dotenvy`, which never overrides variables that are
/// already set, so real environment variables win over it.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    dotenv: bool,
    env: Option<Map<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            dotenv: true,
            env: None,
        }
    }

    /// Read a TOML, YAML or JSON file below the environment
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip the `.env` file
    pub fn without_dotenv(mut self) -> Self {
        self.dotenv = false;
        self
    }

    /// Use `vars` in place of the process environment; implies no `.env`
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self.dotenv = false;
        self
    }

    /// Merge every source into one [`AppConfig`]
    pub fn load(&self) -> Result<AppConfig> {
        if self.dotenv {
            match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "loaded .env"),
                Err(e) if e.not_found() => {}
                Err(e) => return Err(ConfigError::LoadError(format!(".env: {e}"))),
            }
        }

        let mut builder = Config::builder();
        if let Some(path) = &self.file {
            debug!(path = %path.display(), "reading config file");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(file_format(path)?)
                    .required(true),
            );
        }
        builder = builder.add_source(Environment::default().source(self.env.clone()));

        let config = builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Load configuration from a file alone
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path)?;

        match file_format(path)? {
            FileFormat::Yaml => Self::from_yaml(&content),
            FileFormat::Json => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }
}

fn file_format(path: &Path) -> Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

    match extension {
        "toml" => Ok(FileFormat::Toml),
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "json" => Ok(FileFormat::Json),
        _ => Err(ConfigError::LoadError(format!(
            "Unsupported file extension: {}",
            extension
        ))),
    }
}
