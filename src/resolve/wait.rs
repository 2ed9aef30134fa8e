use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::{Driver, ElementHandle};
use crate::error::DriverError;
use crate::resolve::resolver::AttemptOutcome;

/// Default per-strategy timeout (10 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// What a found element must satisfy before resolution succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// Exists in the view hierarchy
    Present,
    /// Exists and is displayed
    Visible,
    /// Displayed and enabled
    Clickable,
}

impl WaitCondition {
    pub fn name(&self) -> &'static str {
        match self {
            WaitCondition::Present => "present",
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
        }
    }

    /// `Matched` when satisfied, otherwise the reason it is not (yet).
    pub fn evaluate(&self, driver: &dyn Driver, element: &ElementHandle) -> Result<AttemptOutcome, DriverError> {
        if *self == WaitCondition::Present {
            return Ok(AttemptOutcome::Matched);
        }
        if !driver.is_displayed(element)? {
            return Ok(AttemptOutcome::NotVisible);
        }
        if *self == WaitCondition::Clickable && !driver.is_enabled(element)? {
            return Ok(AttemptOutcome::NotEnabled);
        }
        Ok(AttemptOutcome::Matched)
    }
}

/// Timeout and polling interval for one resolution.
///
/// The timeout applies to each strategy separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
