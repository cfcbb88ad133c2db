//! Configuration values for one account's maintenance runs

use caiyun_types::{
    ShareConfig, UploadConfig, DEFAULT_SHARE_MAX_PAGES, DEFAULT_UPLOAD_FILENAME,
    DEFAULT_UPLOAD_SIZE_MB,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Check in at 08:00 and 20:00 local time (six-field cron, seconds first)
pub const DEFAULT_SCHEDULE: &str = "0 0 8 * * *,0 0 20 * * *";

/// Main application configuration.
///
/// Keys are flat and match the environment variable names lowercased, so
/// `ACCOUNT_AUTH` in the environment and `account_auth` in a file set the same
/// value. Every key has a default; missing credentials are caught by
/// [`crate::validate_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Durable credential sent as HTTP Basic authorization
    pub account_auth: String,

    /// Account identifier (the phone number)
    pub account_phone: String,

    /// Directory used by both upload and share
    pub dir_id: String,

    #[serde(deserialize_with = "flexible_bool")]
    pub upload: bool,

    pub upload_filename: String,

    /// Size of the synthetic upload in MiB
    pub upload_size_mb: usize,

    #[serde(deserialize_with = "flexible_bool")]
    pub share: bool,

    /// Substring matched against file names in `dir_id`
    pub share_filename: String,

    pub share_max_pages: usize,

    /// Bound on every remote call
    pub http_timeout_secs: u64,

    /// Comma-separated cron expressions used in daemon mode
    pub schedule: String,

    /// Level for the caiyun crates; dependencies log at info. `RUST_LOG` overrides it
    pub log_level: String,

    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            account_auth: String::new(),
            account_phone: String::new(),
            dir_id: String::new(),
            upload: false,
            upload_filename: DEFAULT_UPLOAD_FILENAME.to_string(),
            upload_size_mb: DEFAULT_UPLOAD_SIZE_MB,
            share: false,
            share_filename: String::new(),
            share_max_pages: DEFAULT_SHARE_MAX_PAGES,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            schedule: DEFAULT_SCHEDULE.to_string(),
            log_level: "debug".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig::new(self.upload, self.dir_id.as_str())
            .with_filename(self.upload_filename.as_str())
            .with_size_mb(self.upload_size_mb)
    }

    pub fn share_config(&self) -> ShareConfig {
        ShareConfig::new(self.share, self.dir_id.as_str(), self.share_filename.as_str())
            .with_max_pages(self.share_max_pages)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Individual cron expressions, blanks dropped
    pub fn schedules(&self) -> Vec<&str> {
        self.schedule
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Parse a switch written as `true/false`, `1/0`, `yes/no` or `on/off`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrText {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Environment values always arrive as text; files may carry real booleans.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match BoolOrText::deserialize(deserializer)? {
        BoolOrText::Bool(b) => Ok(b),
        BoolOrText::Int(0) => Ok(false),
        BoolOrText::Int(1) => Ok(true),
        BoolOrText::Int(n) => Err(serde::de::Error::custom(format!("invalid boolean {n}"))),
        BoolOrText::Text(s) => parse_bool(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid boolean {s:?}, expected true/false/yes/no/on/off/1/0"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(!config.upload);
        assert!(!config.share);
        assert_eq!(config.upload_filename, "7");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.schedules(), vec!["0 0 8 * * *", "0 0 20 * * *"]);
    }

    #[test]
    fn test_parse_bool() {
        for yes in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(parse_bool(yes), Some(true), "{yes}");
        }
        for no in ["false", "0", "no", "OFF", ""] {
            assert_eq!(parse_bool(no), Some(false), "{no}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_task_configs_share_directory() {
        let config = AppConfig {
            dir_id: "dir-9".to_string(),
            upload: true,
            share: true,
            share_filename: "report".to_string(),
            share_max_pages: 3,
            upload_size_mb: 2,
            ..Default::default()
        };

        let upload = config.upload_config();
        assert!(upload.enabled);
        assert_eq!(upload.directory_id, "dir-9");
        assert_eq!(upload.size_mb, 2);

        let share = config.share_config();
        assert!(share.enabled);
        assert_eq!(share.directory_id, "dir-9");
        assert_eq!(share.filename, "report");
        assert_eq!(share.max_pages, 3);
    }

    #[test]
    fn test_schedule_drops_blanks() {
        let config = AppConfig {
            schedule: " 0 0 9 * * * , ,".to_string(),
            ..Default::default()
        };
        assert_eq!(config.schedules(), vec!["0 0 9 * * *"]);
    }
}
