//! Configuration for governance sweeps.
//!
//! Settings are resolved from an optional JSON config file with
//! environment variables taking precedence for sensitive values, so
//! credentials never need to live on disk. Required fields are validated
//! against placeholder sentinels and fail fast before any network call.

use crate::core::error::{GovernanceError, SweepResult};
use crate::core::types::Credentials;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the server URL.
pub const ENV_SERVER_URL: &str = "SITESWEEP_SERVER_URL";
/// Environment variable overriding the access-token name.
pub const ENV_TOKEN_NAME: &str = "SITESWEEP_TOKEN_NAME";
/// Environment variable overriding the access-token secret.
pub const ENV_TOKEN_SECRET: &str = "SITESWEEP_TOKEN_SECRET";
/// Environment variable overriding the sign-in site.
pub const ENV_SITE_ID: &str = "SITESWEEP_SITE_ID";

// Sentinels shipped in the sample config; treated the same as unset.
const PLACEHOLDER_SERVER_URL: &str = "https://your-bi-server";
const PLACEHOLDER_TOKEN_NAME: &str = "your-pat-name";
const PLACEHOLDER_TOKEN_SECRET: &str = "your-pat-secret";

const DEFAULT_STALE_DAYS: u32 = 730;

/// Resolved configuration for a governance run.
///
/// # Example
///
/// ```rust,no_run
/// use sitesweep::core::GovernanceConfig;
///
/// let config = GovernanceConfig::from_file("sweep_config.json")?;
/// config.validate()?;
/// # Ok::<(), sitesweep::core::GovernanceError>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Base URL of the BI server. Required.
    pub server_url: String,

    /// Name of the personal access token. Required.
    pub token_name: String,

    /// Secret of the personal access token. Required; redacted from debug
    /// output.
    pub token_secret: SecretString,

    /// Site to sign in to (empty for server-level, multi-site operations).
    pub site_id: String,

    /// Days without a sign-in before a user counts as inactive.
    pub stale_user_days: u32,

    /// Days without an update before content counts as stale.
    pub stale_content_days: u32,

    /// Days without activity before a site counts as stale.
    pub stale_site_days: u32,

    /// Whether the run only reports, never mutates. Reporting is the only
    /// implemented mode; this flag is surfaced in every report document.
    pub log_only: bool,

    /// Directory where report documents are written.
    pub log_dir: PathBuf,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            token_name: String::new(),
            token_secret: SecretString::new(String::new().into()),
            site_id: String::new(),
            stale_user_days: DEFAULT_STALE_DAYS,
            stale_content_days: DEFAULT_STALE_DAYS,
            stale_site_days: DEFAULT_STALE_DAYS,
            log_only: true,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl GovernanceConfig {
    /// Loads configuration from a JSON file, then applies environment
    /// overrides.
    ///
    /// A missing file is not an error; defaults are used so that a fully
    /// environment-driven deployment needs no file at all.
    pub fn from_file(path: impl AsRef<Path>) -> SweepResult<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(|e| {
                GovernanceError::configuration(format!(
                    "failed to parse {}: {e}",
                    path.display()
                ))
            })?
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Builds configuration from defaults plus environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies environment variable overrides for the sensitive fields.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Ok(name) = std::env::var(ENV_TOKEN_NAME) {
            self.token_name = name;
        }
        if let Ok(secret) = std::env::var(ENV_TOKEN_SECRET) {
            self.token_secret = SecretString::new(secret.into());
        }
        if let Ok(site) = std::env::var(ENV_SITE_ID) {
            self.site_id = site;
        }
    }

    /// Validates that all required fields are present and not placeholders.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending setting, so the
    /// operator sees what to fix before any network call is attempted.
    pub fn validate(&self) -> SweepResult<()> {
        if self.server_url.is_empty() || self.server_url == PLACEHOLDER_SERVER_URL {
            return Err(GovernanceError::configuration(format!(
                "server_url must be set ({ENV_SERVER_URL})"
            )));
        }
        if self.token_name.is_empty() || self.token_name == PLACEHOLDER_TOKEN_NAME {
            return Err(GovernanceError::configuration(format!(
                "token_name must be set ({ENV_TOKEN_NAME})"
            )));
        }
        let secret = self.token_secret.expose_secret();
        if secret.is_empty() || secret == PLACEHOLDER_TOKEN_SECRET {
            return Err(GovernanceError::configuration(format!(
                "token_secret must be set ({ENV_TOKEN_SECRET})"
            )));
        }
        Ok(())
    }

    /// Builds sign-in credentials from the configured token.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            token_name: self.token_name.clone(),
            token_secret: self.token_secret.clone(),
            site_content_url: self.site_id.clone(),
        }
    }

    /// Sets the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Sets the access token name and secret.
    pub fn with_token(
        mut self,
        name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.token_name = name.into();
        self.token_secret = SecretString::new(secret.into().into());
        self
    }

    /// Sets the report output directory.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Sets all three staleness thresholds to the same value.
    pub fn with_stale_days(mut self, days: u32) -> Self {
        self.stale_user_days = days;
        self.stale_content_days = days;
        self.stale_site_days = days;
        self
    }
}
