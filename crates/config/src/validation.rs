//! Configuration validation

use crate::{AppConfig, ConfigError, Result};

/// Largest synthetic upload; the payload is held in memory
pub const MAX_UPLOAD_SIZE_MB: usize = 1024;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration, reporting every problem at once
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let errors = collect_errors(config);

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Every problem found in `config`, in key order
pub fn collect_errors(config: &AppConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Account
    if config.account_auth.trim().is_empty() {
        errors.push(ValidationError::new(
            "ACCOUNT_AUTH",
            "durable credential is required",
        ));
    }

    if config.account_phone.trim().is_empty() {
        errors.push(ValidationError::new(
            "ACCOUNT_PHONE",
            "account id is required",
        ));
    }

    // Upload and share both work inside DIR_ID
    if (config.upload || config.share) && config.dir_id.trim().is_empty() {
        errors.push(ValidationError::new(
            "DIR_ID",
            "directory id is required when upload or share is enabled",
        ));
    }

    if config.upload {
        if config.upload_filename.is_empty() {
            errors.push(ValidationError::new(
                "UPLOAD_FILENAME",
                "must not be empty when upload is enabled",
            ));
        }
        if config.upload_size_mb == 0 {
            errors.push(ValidationError::new(
                "UPLOAD_SIZE_MB",
                "must be greater than 0",
            ));
        } else if config.upload_size_mb > MAX_UPLOAD_SIZE_MB {
            errors.push(ValidationError::new(
                "UPLOAD_SIZE_MB",
                format!("must be at most {MAX_UPLOAD_SIZE_MB}"),
            ));
        }
    }

    // An empty needle would match every file
    if config.share && config.share_filename.is_empty() {
        errors.push(ValidationError::new(
            "SHARE_FILENAME",
            "must not be empty when share is enabled",
        ));
    }

    if config.share_max_pages == 0 {
        errors.push(ValidationError::new(
            "SHARE_MAX_PAGES",
            "must be greater than 0",
        ));
    }

    if config.http_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "HTTP_TIMEOUT_SECS",
            "must be greater than 0",
        ));
    }

    // Schedule
    let schedules = config.schedules();
    if schedules.is_empty() {
        errors.push(ValidationError::new(
            "SCHEDULE",
            "at least one cron expression is required",
        ));
    }
    for (idx, expr) in schedules.iter().enumerate() {
        if let Err(e) = validate_cron(expr) {
            errors.push(ValidationError::new(format!("SCHEDULE[{idx}]"), e));
        }
    }

    if let Err(e) = validate_log_level(&config.log_level) {
        errors.push(e);
    }

    if !matches!(config.log_format.to_lowercase().as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "LOG_FORMAT",
            format!("invalid log format '{}', must be pretty or json", config.log_format),
        ));
    }

    errors
}

/// Shape check for a cron expression with a leading seconds field.
///
/// Six or seven whitespace-separated fields built from digits, names, and
/// `* , - / ? L W #`. Whether the values are in range is left to the scheduler.
pub fn validate_cron(expr: &str) -> std::result::Result<(), String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if !(6..=7).contains(&fields.len()) {
        return Err(format!(
            "'{expr}' has {} fields, expected 6 or 7 (seconds first)",
            fields.len()
        ));
    }

    for field in fields {
        if let Some(bad) = field
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || "*,-/?#".contains(*c)))
        {
            return Err(format!("'{expr}' contains invalid character '{bad}'"));
        }
    }

    Ok(())
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "LOG_LEVEL",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            account_auth: "Y3JlZA==".to_string(),
            account_phone: "13800000000".to_string(),
            dir_id: "dir-1".to_string(),
            upload: true,
            share: true,
            share_filename: "7".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_tasks_disabled_need_no_directory() {
        let config = AppConfig {
            account_auth: "Y3JlZA==".to_string(),
            account_phone: "13800000000".to_string(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let config = AppConfig {
            share: true,
            http_timeout_secs: 0,
            ..Default::default()
        };

        let fields: Vec<_> = collect_errors(&config)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "ACCOUNT_AUTH",
                "ACCOUNT_PHONE",
                "DIR_ID",
                "SHARE_FILENAME",
                "HTTP_TIMEOUT_SECS"
            ]
        );

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("ACCOUNT_AUTH") && err.contains("HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_upload_size_is_capped() {
        let at_cap = AppConfig {
            upload_size_mb: MAX_UPLOAD_SIZE_MB,
            ..valid_config()
        };
        assert!(validate_config(&at_cap).is_ok());

        let oversized = AppConfig {
            upload_size_mb: usize::MAX,
            ..valid_config()
        };
        let errors = collect_errors(&oversized);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "UPLOAD_SIZE_MB");
        assert_eq!(errors[0].message, "must be at most 1024");
    }

    #[test]
    fn test_oversized_upload_ignored_when_disabled() {
        let config = AppConfig {
            upload: false,
            upload_size_mb: usize::MAX,
            ..valid_config()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = AppConfig {
            log_level: "verbose".to_string(),
            ..valid_config()
        };
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "LOG_LEVEL");
    }

    #[test]
    fn test_validate_cron() {
        assert!(validate_cron("0 0 8 * * *").is_ok());
        assert!(validate_cron("0 30 9,21 * * Mon-Fri").is_ok());
        assert!(validate_cron("0 0 8 * * * 2030").is_ok());
        assert!(validate_cron("0 8 * * *").is_err());
        assert!(validate_cron("0 0 8 * * ! ").is_err());
    }

    #[test]
    fn test_bad_schedule_entry_is_named() {
        let config = AppConfig {
            schedule: "0 0 8 * * *,every morning".to_string(),
            ..valid_config()
        };
        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "SCHEDULE[1]");
    }
}
