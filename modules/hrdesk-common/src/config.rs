use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // HR API
    pub api_url: String,
    pub http_timeout: Duration,

    // Acting user
    pub employee_id: Option<String>,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let http_timeout = match env::var("HRDESK_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "HRDESK_HTTP_TIMEOUT_SECS",
                    expected: "a whole number of seconds",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url: env::var("HRDESK_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            http_timeout,
            employee_id: env::var("HRDESK_EMPLOYEE_ID")
                .ok()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        })
    }

    /// The employee id, for commands that act on behalf of a user.
    pub fn require_employee_id(&self) -> Result<&str, ConfigError> {
        self.employee_id
            .as_deref()
            .ok_or(ConfigError::Missing("HRDESK_EMPLOYEE_ID"))
    }

    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  HRDESK_API_URL: {}", self.api_url);
        tracing::info!("  HRDESK_HTTP_TIMEOUT_SECS: {}", self.http_timeout.as_secs());
        tracing::info!(
            "  HRDESK_EMPLOYEE_ID: {}",
            self.employee_id.as_deref().map(redact).unwrap_or_else(|| "<not set>".to_string())
        );
    }
}

fn redact(val: &str) -> String {
    let n = val.chars().count().min(3);
    let shown: String = val.chars().take(n).collect();
    format!("{}...({} chars)", shown, val.chars().count())
}
