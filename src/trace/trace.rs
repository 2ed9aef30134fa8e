use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::resolve::resolver::StrategyAttempt;
use crate::resolve::wait::WaitCondition;

/// One interaction as recorded in the JSONL trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub scenario: Option<String>,

    pub action: String,
    pub label: String,
    pub locator: String,
    pub condition: Option<WaitCondition>,

    pub attempts: Vec<StrategyAttempt>,

    pub outcome: String,
    pub error: Option<String>,
    pub screenshot: Option<String>,
}

impl TraceEvent {
    pub fn now(action: &str, label: &str, locator: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
            scenario: None,
            action: action.to_string(),
            label: label.to_string(),
            locator: locator.to_string(),
            condition: None,
            attempts: vec![],
            outcome: "pending".into(),
            error: None,
            screenshot: None,
        }
    }

    pub fn with_scenario(mut self, scenario: Option<&str>) -> Self {
        self.scenario = scenario.map(str::to_string);
        self
    }

    pub fn with_condition(mut self, condition: WaitCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_attempts(mut self, attempts: &[StrategyAttempt]) -> Self {
        self.attempts = attempts.to_vec();
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = outcome.to_string();
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_screenshot(mut self, path: Option<&std::path::Path>) -> Self {
        self.screenshot = path.map(|p| p.display().to_string());
        self
    }
}
