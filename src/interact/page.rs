use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, error, info};

use crate::driver::{Driver, ElementHandle};
use crate::error::{DriverError, LocateError};
use crate::locator::locator_model::LocatorInput;
use crate::report::screenshot::ScreenshotSink;
use crate::resolve::resolver::{AttemptOutcome, StrategyAttempt, StrategyResolver};
use crate::resolve::wait::{WaitCondition, WaitOptions};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Result of an interaction on an element the caller treats as optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The element was not exposed; nothing was done
    Skipped,
}

/// Result of picking one option at random out of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// `index` among the `candidates` actionable options was clicked
    Selected { index: usize, candidates: usize },
    /// The option group was never rendered
    Skipped,
}

/// Settle waits between flow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Short,
    Medium,
    Long,
}

impl Pace {
    pub fn duration(&self) -> Duration {
        match self {
            Pace::Short => Duration::from_secs(1),
            Pace::Medium => Duration::from_secs(3),
            Pace::Long => Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Click,
    TypeText,
    Select,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::TypeText => "type_text",
            Action::Select => "select",
        }
    }

    fn condition(&self) -> WaitCondition {
        match self {
            Action::Click | Action::Select => WaitCondition::Clickable,
            Action::TypeText => WaitCondition::Visible,
        }
    }
}

// ============================================================================
// Interactor
// ============================================================================

/// "Wait until actionable, then act" on top of the strategy resolver.
///
/// Every unresolved interaction logs one error, saves one screenshot and
/// returns the failure. Nothing here converts a failure into success; the
/// `_optional` variants only turn absence into `Outcome::Skipped`.
pub struct Interactor<'d> {
    resolver: StrategyResolver<'d>,
    screenshots: ScreenshotSink,
    trace: TraceLogger,
    scenario: Option<String>,
    default_timeout: Duration,
}

impl<'d> Interactor<'d> {
    pub fn new(driver: &'d dyn Driver, options: &WaitOptions, screenshots: ScreenshotSink) -> Self {
        Interactor {
            resolver: StrategyResolver::with_options(driver, options),
            screenshots,
            trace: TraceLogger::disabled(),
            scenario: None,
            default_timeout: options.timeout(),
        }
    }

    pub fn with_trace(mut self, trace: TraceLogger) -> Self {
        self.trace = trace;
        self
    }

    /// Prefix for failure screenshot names.
    pub fn with_scenario(mut self, scenario: &str) -> Self {
        self.scenario = Some(scenario.to_string());
        self
    }

    pub fn resolver(&self) -> &StrategyResolver<'d> {
        &self.resolver
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Wait until the element is clickable, then click it.
    pub fn click<L: LocatorInput + ?Sized>(&self, locator: &L, label: &str, timeout: Duration) -> Result<(), LocateError> {
        self.interact(Action::Click, locator, label, timeout, |driver, element| {
            driver.click(element)
        })
    }

    /// Wait until visible, clear whatever is there, then type `text`.
    pub fn type_text<L: LocatorInput + ?Sized>(
        &self,
        locator: &L,
        text: &str,
        label: &str,
        timeout: Duration,
    ) -> Result<(), LocateError> {
        self.interact(Action::TypeText, locator, label, timeout, |driver, element| {
            driver.clear(element)?;
            driver.send_text(element, text)
        })
    }

    pub fn click_optional<L: LocatorInput + ?Sized>(
        &self,
        locator: &L,
        label: &str,
        timeout: Duration,
    ) -> Result<Outcome, LocateError> {
        self.interact_optional(Action::Click, locator, label, timeout, |driver, element| {
            driver.click(element)
        })
    }

    pub fn type_text_optional<L: LocatorInput + ?Sized>(
        &self,
        locator: &L,
        text: &str,
        label: &str,
        timeout: Duration,
    ) -> Result<Outcome, LocateError> {
        self.interact_optional(Action::TypeText, locator, label, timeout, |driver, element| {
            driver.clear(element)?;
            driver.send_text(element, text)
        })
    }

    /// Click one of the exposed, enabled options at random.
    ///
    /// Options are re-read every poll until at least one is actionable or the
    /// timeout expires. A group that is never rendered is `Selection::Skipped`;
    /// a rendered group with no actionable option by the deadline is an error.
    pub fn select_random<L: LocatorInput + ?Sized, R: Rng + ?Sized>(
        &self,
        locator: &L,
        label: &str,
        timeout: Duration,
        rng: &mut R,
    ) -> Result<Selection, LocateError> {
        let action = Action::Select;
        let description = locator.describe();

        if locator.is_absent() {
            info!(label, "option group has no locator on this platform, skipping");
            self.record(TraceEvent::now(action.name(), label, &description).with_outcome("skipped"));
            return Ok(Selection::Skipped);
        }

        let group = match self.resolver.locate_all(locator, action.condition(), timeout) {
            Ok(group) => group,
            Err(LocateError::ElementNotFound { attempts, .. }) if never_rendered(&attempts) => {
                info!(label, "option group not exposed, skipping");
                self.record(
                    TraceEvent::now(action.name(), label, &description)
                        .with_attempts(&attempts)
                        .with_outcome("skipped"),
                );
                return Ok(Selection::Skipped);
            }
            Err(e) => {
                let attempts = e.attempts().to_vec();
                return Err(self.fail(action, label, &description, e.with_label(label), &attempts));
            }
        };

        let candidates = group.handles.len();
        let Some(chosen) = group.handles.choose(rng) else {
            return Ok(Selection::Skipped);
        };
        let index = group
            .handles
            .iter()
            .position(|element| element == chosen)
            .unwrap_or_default();

        if let Err(source) = self.resolver.driver().click(chosen) {
            let err = LocateError::InteractionFailed {
                label: label.to_string(),
                action: action.name(),
                source,
            };
            return Err(self.fail(action, label, &description, err, &group.attempts));
        }

        info!(label, index, candidates, strategy = %group.strategy, "random option selected");
        self.record(
            TraceEvent::now(action.name(), label, &description)
                .with_condition(action.condition())
                .with_attempts(&group.attempts)
                .with_outcome(format!("selected {} of {}", index + 1, candidates)),
        );
        Ok(Selection::Selected { index, candidates })
    }

    /// Hide the soft keyboard if one is showing. Never fails.
    pub fn hide_keyboard(&self) {
        match self.resolver.driver().hide_keyboard() {
            Ok(()) => info!("keyboard hidden"),
            Err(e) => debug!(error = %e, "no keyboard to hide"),
        }
    }

    pub fn pause(&self, pace: Pace) {
        std::thread::sleep(pace.duration());
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn interact<L, F>(
        &self,
        action: Action,
        locator: &L,
        label: &str,
        timeout: Duration,
        act: F,
    ) -> Result<(), LocateError>
    where
        L: LocatorInput + ?Sized,
        F: FnOnce(&dyn Driver, &ElementHandle) -> Result<(), DriverError>,
    {
        let description = locator.describe();
        let resolved = match self.resolver.locate(locator, action.condition(), timeout) {
            Ok(resolved) => resolved,
            Err(e) => {
                let attempts = e.attempts().to_vec();
                return Err(self.fail(action, label, &description, e.with_label(label), &attempts));
            }
        };

        self.act_on(action, label, &description, &resolved.handle, &resolved.attempts, act)
    }

    fn interact_optional<L, F>(
        &self,
        action: Action,
        locator: &L,
        label: &str,
        timeout: Duration,
        act: F,
    ) -> Result<Outcome, LocateError>
    where
        L: LocatorInput + ?Sized,
        F: FnOnce(&dyn Driver, &ElementHandle) -> Result<(), DriverError>,
    {
        let description = locator.describe();
        if locator.is_absent() {
            info!(label, "element has no locator on this platform, skipping");
            self.record(TraceEvent::now(action.name(), label, &description).with_outcome("skipped"));
            return Ok(Outcome::Skipped);
        }

        match self.resolver.locate(locator, action.condition(), timeout) {
            Ok(resolved) => {
                self.act_on(action, label, &description, &resolved.handle, &resolved.attempts, act)?;
                Ok(Outcome::Done)
            }
            Err(LocateError::ElementNotFound { attempts, .. }) => {
                info!(label, "element not exposed, skipping");
                self.record(
                    TraceEvent::now(action.name(), label, &description)
                        .with_condition(action.condition())
                        .with_attempts(&attempts)
                        .with_outcome("skipped"),
                );
                Ok(Outcome::Skipped)
            }
            Err(e) => Err(self.fail(action, label, &description, e, &[])),
        }
    }

    fn act_on<F>(
        &self,
        action: Action,
        label: &str,
        description: &str,
        element: &ElementHandle,
        attempts: &[StrategyAttempt],
        act: F,
    ) -> Result<(), LocateError>
    where
        F: FnOnce(&dyn Driver, &ElementHandle) -> Result<(), DriverError>,
    {
        match act(self.resolver.driver(), element) {
            Ok(()) => {
                let strategy = attempts.last().map(|a| a.strategy.name()).unwrap_or("unknown");
                info!(label, action = action.name(), strategy, "interaction done");
                self.record(
                    TraceEvent::now(action.name(), label, description)
                        .with_condition(action.condition())
                        .with_attempts(attempts)
                        .with_outcome("done"),
                );
                Ok(())
            }
            Err(source) => {
                let err = LocateError::InteractionFailed {
                    label: label.to_string(),
                    action: action.name(),
                    source,
                };
                Err(self.fail(action, label, description, err, attempts))
            }
        }
    }

    /// Log, screenshot (unless the locator itself is bad) and hand the error back.
    fn fail(
        &self,
        action: Action,
        label: &str,
        description: &str,
        err: LocateError,
        attempts: &[StrategyAttempt],
    ) -> LocateError {
        let screenshot = match &err {
            LocateError::LocatorInvalid { .. } | LocateError::NotConfigured => {
                error!(label, locator = description, error = %err, "locator is unusable");
                None
            }
            _ => {
                error!(label, action = action.name(), locator = description, error = %err, "interaction failed");
                self.screenshots.capture(self.resolver.driver(), &self.failure_tag(action, label))
            }
        };

        self.record(
            TraceEvent::now(action.name(), label, description)
                .with_condition(action.condition())
                .with_attempts(attempts)
                .with_outcome("failed")
                .with_error(&err)
                .with_screenshot(screenshot.as_deref()),
        );
        err
    }

    fn failure_tag(&self, action: Action, label: &str) -> String {
        match &self.scenario {
            Some(scenario) => format!("{}_{}_{}_failure", scenario, label, action.name()),
            None => format!("{}_{}_failure", label, action.name()),
        }
    }

    fn record(&self, event: TraceEvent) {
        self.trace.log(&event.with_scenario(self.scenario.as_deref()));
    }
}

/// No strategy ever found an option, as opposed to finding only unusable ones.
fn never_rendered(attempts: &[StrategyAttempt]) -> bool {
    attempts
        .iter()
        .all(|a| matches!(a.outcome, AttemptOutcome::NotFound | AttemptOutcome::DriverError(_)))
}
