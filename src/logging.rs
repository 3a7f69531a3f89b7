//! Logging settings carried by [`SdkConfig`](crate::config::SdkConfig).
//!
//! The SDK is a guest in the embedding application's process, so the default
//! filter scopes the configured level to this crate's targets and leaves
//! everything else at `warn`, and installation backs off when a global
//! subscriber already exists.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Subscriber output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Level applied to this crate's targets (`trace` through `error`).
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Filter directives derived from the configured level.
    fn directives(&self) -> String {
        format!("warn,{}={}", env!("CARGO_CRATE_NAME"), self.level)
    }

    /// Install a global tracing subscriber for this configuration.
    ///
    /// `RUST_LOG` from the environment takes precedence over the configured
    /// level. Returns `false` when a subscriber is already installed — the
    /// embedding application's setup wins and this call changes nothing.
    pub fn init(&self) -> bool {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()));

        match self.format {
            LogFormat::Json => fmt().json().with_env_filter(filter).try_init().is_ok(),
            LogFormat::Pretty => fmt().with_env_filter(filter).try_init().is_ok(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::default(),
        }
    }
}
