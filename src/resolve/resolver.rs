use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::driver::{Driver, ElementHandle};
use crate::error::{DriverError, LocateError};
use crate::locator::locator_model::{LocatorInput, Strategy};
use crate::resolve::wait::{WaitCondition, WaitOptions};

/// How a single strategy ended on its last poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Matched,
    NotFound,
    NotVisible,
    NotEnabled,
    DriverError(String),
}

impl AttemptOutcome {
    pub fn describe(&self) -> String {
        match self {
            AttemptOutcome::Matched => "matched".into(),
            AttemptOutcome::NotFound => "no matching element".into(),
            AttemptOutcome::NotVisible => "element present but not displayed".into(),
            AttemptOutcome::NotEnabled => "element present but not enabled".into(),
            AttemptOutcome::DriverError(msg) => format!("driver error: {}", msg),
        }
    }
}

/// One strategy tried during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    pub outcome: AttemptOutcome,
    pub polls: u32,
}

/// A successful resolution with the path that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub handle: ElementHandle,
    pub strategy: Strategy,
    /// Every strategy tried, the winning one last
    pub attempts: Vec<StrategyAttempt>,
}

/// Every element under the winning strategy that satisfied the condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    /// Never empty
    pub handles: Vec<ElementHandle>,
    pub strategy: Strategy,
    pub attempts: Vec<StrategyAttempt>,
}

/// Three-way result for call sites that model an element as optional.
#[derive(Debug)]
pub enum Resolution {
    Found(ElementHandle),
    /// No locator for this platform, or no strategy matched in time
    NotPresentOptional {
        locator: String,
        attempts: Vec<StrategyAttempt>,
    },
    Failed(LocateError),
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

// ============================================================================
// Strategy-fallback resolver
// ============================================================================

/// Resolves locators against a live session, one strategy at a time.
///
/// Strategies run in list order (id, xpath, accessibility id). Each gets its
/// own full timeout and is polled until it satisfies the wait condition; the
/// first one that does wins and nothing after it is tried.
pub struct StrategyResolver<'d> {
    driver: &'d dyn Driver,
    poll_interval: Duration,
}

impl<'d> StrategyResolver<'d> {
    pub fn new(driver: &'d dyn Driver) -> Self {
        Self::with_options(driver, &WaitOptions::default())
    }

    pub fn with_options(driver: &'d dyn Driver, options: &WaitOptions) -> Self {
        StrategyResolver {
            driver,
            poll_interval: options.poll_interval(),
        }
    }

    pub fn driver(&self) -> &'d dyn Driver {
        self.driver
    }

    /// Resolve to an element that is merely present.
    pub fn resolve<L: LocatorInput + ?Sized>(&self, locator: &L, timeout: Duration) -> Result<ElementHandle, LocateError> {
        self.locate(locator, WaitCondition::Present, timeout)
            .map(|resolved| resolved.handle)
    }

    /// Resolve with an explicit wait condition, keeping the attempt history.
    ///
    /// Only absence and stale references count as "not yet"; any other session
    /// failure ends the resolution with `SessionFailed`.
    pub fn locate<L: LocatorInput + ?Sized>(
        &self,
        locator: &L,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Resolved, LocateError> {
        let strategies = locator.strategies()?;
        let description = locator.describe();
        let mut attempts = Vec::with_capacity(strategies.len());

        for strategy in strategies.iter() {
            let (found, attempt) = self.poll_strategy(&description, strategy, condition, timeout)?;
            attempts.push(attempt);

            if let Some(handle) = found {
                info!(strategy = %strategy, condition = condition.name(), "element found");
                return Ok(Resolved {
                    handle,
                    strategy: strategy.clone(),
                    attempts,
                });
            }
            warn!(strategy = %strategy, condition = condition.name(), "strategy did not match, trying next");
        }

        Err(not_found(description, attempts, timeout))
    }

    /// Find every element matched by the first strategy that matches anything.
    pub fn resolve_all<L: LocatorInput + ?Sized>(&self, locator: &L, timeout: Duration) -> Result<Vec<ElementHandle>, LocateError> {
        self.locate_all(locator, WaitCondition::Present, timeout)
            .map(|group| group.handles)
    }

    /// Elements satisfying `condition` under the first strategy that yields any.
    ///
    /// Each strategy is re-queried every poll until at least one of its
    /// elements satisfies the condition or its timeout expires. Elements that
    /// do not (yet) satisfy it are left out of the result.
    pub fn locate_all<L: LocatorInput + ?Sized>(
        &self,
        locator: &L,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<ResolvedGroup, LocateError> {
        let strategies = locator.strategies()?;
        let description = locator.describe();
        let mut attempts = Vec::with_capacity(strategies.len());

        for strategy in strategies.iter() {
            let deadline = Instant::now() + timeout;
            let mut polls = 0;
            let outcome = loop {
                polls += 1;
                let outcome = match self.driver.find_all(strategy) {
                    Ok(handles) if handles.is_empty() => AttemptOutcome::NotFound,
                    Ok(handles) => {
                        let (matched, outcome) = self.filter_matching(&description, strategy, condition, handles)?;
                        if !matched.is_empty() {
                            debug!(strategy = %strategy, count = matched.len(), condition = condition.name(), "elements found");
                            attempts.push(StrategyAttempt {
                                strategy: strategy.clone(),
                                outcome: AttemptOutcome::Matched,
                                polls,
                            });
                            return Ok(ResolvedGroup {
                                handles: matched,
                                strategy: strategy.clone(),
                                attempts,
                            });
                        }
                        outcome
                    }
                    Err(e) => transient_or_fail(&description, strategy, e)?,
                };
                if !self.pause_until(deadline) {
                    break outcome;
                }
            };
            warn!(strategy = %strategy, condition = condition.name(), "strategy matched nothing usable, trying next");
            attempts.push(StrategyAttempt {
                strategy: strategy.clone(),
                outcome,
                polls,
            });
        }

        Err(not_found(description, attempts, timeout))
    }

    /// Like `locate`, but absence is an expected outcome rather than an error.
    pub fn resolve_optional<L: LocatorInput + ?Sized>(
        &self,
        locator: &L,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Resolution {
        if locator.is_absent() {
            return Resolution::NotPresentOptional {
                locator: locator.describe(),
                attempts: Vec::new(),
            };
        }
        match self.locate(locator, condition, timeout) {
            Ok(resolved) => Resolution::Found(resolved.handle),
            Err(LocateError::ElementNotFound { locator, attempts, .. }) => {
                Resolution::NotPresentOptional { locator, attempts }
            }
            Err(e) => Resolution::Failed(e),
        }
    }

    /// Plain existence check.
    pub fn is_present<L: LocatorInput + ?Sized>(&self, locator: &L, timeout: Duration) -> bool {
        match self.resolve_optional(locator, WaitCondition::Present, timeout) {
            Resolution::Found(_) => true,
            Resolution::NotPresentOptional { .. } => false,
            Resolution::Failed(e) => {
                warn!(error = %e, "presence check failed");
                false
            }
        }
    }

    /// Poll one strategy until it satisfies `condition` or `timeout` expires.
    fn poll_strategy(
        &self,
        locator: &str,
        strategy: &Strategy,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<(Option<ElementHandle>, StrategyAttempt), LocateError> {
        let deadline = Instant::now() + timeout;
        let mut polls = 0;

        loop {
            polls += 1;
            let outcome = match self.driver.find(strategy) {
                Ok(Some(handle)) => match condition.evaluate(self.driver, &handle) {
                    Ok(AttemptOutcome::Matched) => {
                        let attempt = StrategyAttempt {
                            strategy: strategy.clone(),
                            outcome: AttemptOutcome::Matched,
                            polls,
                        };
                        return Ok((Some(handle), attempt));
                    }
                    Ok(outcome) => outcome,
                    Err(e) => transient_or_fail(locator, strategy, e)?,
                },
                Ok(None) => AttemptOutcome::NotFound,
                Err(e) => transient_or_fail(locator, strategy, e)?,
            };

            if !self.pause_until(deadline) {
                let attempt = StrategyAttempt {
                    strategy: strategy.clone(),
                    outcome,
                    polls,
                };
                return Ok((None, attempt));
            }
        }
    }

    /// Split found elements into those satisfying `condition` and the reason
    /// the first of the others does not.
    fn filter_matching(
        &self,
        locator: &str,
        strategy: &Strategy,
        condition: WaitCondition,
        handles: Vec<ElementHandle>,
    ) -> Result<(Vec<ElementHandle>, AttemptOutcome), LocateError> {
        let mut matched = Vec::with_capacity(handles.len());
        let mut rejected: Option<AttemptOutcome> = None;

        for handle in handles {
            let outcome = match condition.evaluate(self.driver, &handle) {
                Ok(outcome) => outcome,
                Err(e) => transient_or_fail(locator, strategy, e)?,
            };
            if outcome == AttemptOutcome::Matched {
                matched.push(handle);
            } else if rejected.is_none() {
                rejected = Some(outcome);
            }
        }

        Ok((matched, rejected.unwrap_or(AttemptOutcome::NotFound)))
    }

    /// Sleep one poll interval (capped at the deadline). False once expired.
    fn pause_until(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(self.poll_interval.min(deadline - now));
        true
    }
}

/// Stale references are retried; anything else means the session is unusable.
fn transient_or_fail(locator: &str, strategy: &Strategy, err: DriverError) -> Result<AttemptOutcome, LocateError> {
    match err {
        stale @ DriverError::StaleElement(_) => Ok(AttemptOutcome::DriverError(stale.to_string())),
        source => Err(LocateError::SessionFailed {
            locator: locator.to_string(),
            strategy: strategy.to_string(),
            source,
        }),
    }
}

fn not_found(locator: String, attempts: Vec<StrategyAttempt>, timeout: Duration) -> LocateError {
    let last_failure = attempts
        .last()
        .map(|a| format!("{} ({})", a.outcome.describe(), a.strategy))
        .unwrap_or_else(|| "no strategy attempted".into());

    LocateError::ElementNotFound {
        label: None,
        locator,
        attempts,
        timeout_ms: timeout.as_millis() as u64,
        last_failure,
    }
}
