use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::resolver::StrategyAttempt;

/// Failures raised by the driver session (Appium or any other backend).
#[derive(Debug, Error)]
pub enum DriverError {
    /// HTTP transport to the Appium server failed
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a W3C error payload
    #[error("{command} failed: {error}")]
    Protocol { command: String, error: String },

    /// Handle no longer attached to the current screen
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// Response body did not have the expected shape
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Screenshot payload was not valid base64
    #[error("could not decode {context}: {message}")]
    Decode { context: String, message: String },

    /// Server accepted the session request but returned no session id
    #[error("session not started: {0}")]
    SessionNotStarted(String),
}

/// Classified outcome of locator projection, resolution and interaction.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("platform not configured; call set_platform before projecting locators")]
    NotConfigured,

    #[error("invalid locator: {reason}")]
    LocatorInvalid { reason: String },

    #[error("{} not found after {} strategies within {timeout_ms}ms each ({locator}): {last_failure}", .label.as_deref().unwrap_or("element"), .attempts.len())]
    ElementNotFound {
        label: Option<String>,
        locator: String,
        attempts: Vec<StrategyAttempt>,
        timeout_ms: u64,
        last_failure: String,
    },

    /// The session itself failed while looking for the element (not absence)
    #[error("session error locating {locator} by {strategy}: {source}")]
    SessionFailed {
        locator: String,
        strategy: String,
        #[source]
        source: DriverError,
    },

    #[error("{action} on '{label}' failed: {source}")]
    InteractionFailed {
        label: String,
        action: &'static str,
        #[source]
        source: DriverError,
    },
}

impl LocateError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        LocateError::LocatorInvalid {
            reason: reason.into(),
        }
    }

    /// Attach the human-readable element label to a not-found failure.
    pub fn with_label(self, name: &str) -> Self {
        match self {
            LocateError::ElementNotFound {
                locator,
                attempts,
                timeout_ms,
                last_failure,
                ..
            } => LocateError::ElementNotFound {
                label: Some(name.to_string()),
                locator,
                attempts,
                timeout_ms,
                last_failure,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LocateError::ElementNotFound { .. })
    }

    /// Strategies tried before giving up, empty for other variants.
    pub fn attempts(&self) -> &[StrategyAttempt] {
        match self {
            LocateError::ElementNotFound { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

/// Configuration, test data and CLI input problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported platform '{0}' (expected android or ios)")]
    UnknownPlatform(String),

    #[error("missing test data at '{0}'")]
    MissingData(String),
}
