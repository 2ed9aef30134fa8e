use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use mobile_locator::driver::{Driver, ElementHandle};
use mobile_locator::error::DriverError;
use mobile_locator::locator::locator_model::Strategy;

/// Every call the code under test made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Find(Strategy),
    FindAll(Strategy),
    IsDisplayed(String),
    IsEnabled(String),
    Click(String),
    Clear(String),
    SendText(String, String),
    Screenshot,
    HideKeyboard,
}

/// In-memory session: strategies map to elements, element state is scripted,
/// and every call is recorded.
#[derive(Default)]
pub struct ScriptedDriver {
    matches: HashMap<Strategy, Vec<ElementHandle>>,
    /// Strategy only matches from this find poll onwards (1-based)
    appears_on_poll: HashMap<Strategy, u32>,
    polls: RefCell<HashMap<Strategy, u32>>,
    /// Finds under this strategy report a stale reference for the first n polls
    stale_finds: HashMap<Strategy, u32>,
    /// Every find fails with this protocol error
    find_error: Option<String>,
    hidden: HashSet<String>,
    disabled: HashSet<String>,
    /// Element reports enabled from this `is_enabled` check onwards (1-based)
    enabled_from_check: HashMap<String, u32>,
    enabled_checks: RefCell<HashMap<String, u32>>,
    stale_on_click: HashSet<String>,
    keyboard_error: bool,
    screenshot_error: bool,
    calls: RefCell<Vec<Call>>,
    screenshots: Cell<u32>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match(mut self, strategy: Strategy, element: &str) -> Self {
        self.matches
            .entry(strategy)
            .or_default()
            .push(ElementHandle::new(element));
        self
    }

    pub fn with_matches(mut self, strategy: Strategy, elements: &[&str]) -> Self {
        let handles = elements.iter().map(|e| ElementHandle::new(*e)).collect();
        self.matches.insert(strategy, handles);
        self
    }

    /// The strategy starts matching on find poll number `poll`.
    pub fn appearing_on_poll(mut self, strategy: Strategy, element: &str, poll: u32) -> Self {
        self.appears_on_poll.insert(strategy.clone(), poll);
        self.with_match(strategy, element)
    }

    pub fn hidden(mut self, element: &str) -> Self {
        self.hidden.insert(element.to_string());
        self
    }

    pub fn disabled(mut self, element: &str) -> Self {
        self.disabled.insert(element.to_string());
        self
    }

    /// Element is disabled until its `check`-th enabled check.
    pub fn enabled_from_check(mut self, element: &str, check: u32) -> Self {
        self.enabled_from_check.insert(element.to_string(), check);
        self
    }

    /// The first `polls` finds under `strategy` fail with a stale reference.
    pub fn stale_finds(mut self, strategy: Strategy, polls: u32) -> Self {
        self.stale_finds.insert(strategy, polls);
        self
    }

    /// Every find and find_all fails as the server would on a broken session.
    pub fn failing_finds(mut self, message: &str) -> Self {
        self.find_error = Some(message.to_string());
        self
    }

    pub fn stale_on_click(mut self, element: &str) -> Self {
        self.stale_on_click.insert(element.to_string());
        self
    }

    pub fn without_keyboard(mut self) -> Self {
        self.keyboard_error = true;
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.screenshot_error = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Strategies passed to `find`, in order.
    pub fn find_queries(&self) -> Vec<Strategy> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Find(s) | Call::FindAll(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn session_queries(&self) -> usize {
        self.find_queries().len()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Click(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn screenshot_count(&self) -> u32 {
        self.screenshots.get()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn current(&self, strategy: &Strategy) -> Result<Vec<ElementHandle>, DriverError> {
        if let Some(message) = &self.find_error {
            return Err(DriverError::Protocol {
                command: "find element".into(),
                error: message.clone(),
            });
        }

        let mut polls = self.polls.borrow_mut();
        let poll = polls.entry(strategy.clone()).or_insert(0);
        *poll += 1;

        if let Some(&stale) = self.stale_finds.get(strategy) {
            if *poll <= stale {
                return Err(DriverError::StaleElement(strategy.to_string()));
            }
        }
        if let Some(&from) = self.appears_on_poll.get(strategy) {
            if *poll < from {
                return Ok(Vec::new());
            }
        }
        Ok(self.matches.get(strategy).cloned().unwrap_or_default())
    }
}

impl Driver for ScriptedDriver {
    fn find(&self, strategy: &Strategy) -> Result<Option<ElementHandle>, DriverError> {
        self.record(Call::Find(strategy.clone()));
        Ok(self.current(strategy)?.into_iter().next())
    }

    fn find_all(&self, strategy: &Strategy) -> Result<Vec<ElementHandle>, DriverError> {
        self.record(Call::FindAll(strategy.clone()));
        self.current(strategy)
    }

    fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.record(Call::IsDisplayed(element.id().to_string()));
        Ok(!self.hidden.contains(element.id()))
    }

    fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.record(Call::IsEnabled(element.id().to_string()));
        if let Some(&from) = self.enabled_from_check.get(element.id()) {
            let mut checks = self.enabled_checks.borrow_mut();
            let check = checks.entry(element.id().to_string()).or_insert(0);
            *check += 1;
            return Ok(*check >= from);
        }
        Ok(!self.disabled.contains(element.id()))
    }

    fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.record(Call::Click(element.id().to_string()));
        if self.stale_on_click.contains(element.id()) {
            return Err(DriverError::StaleElement(element.id().to_string()));
        }
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.record(Call::Clear(element.id().to_string()));
        Ok(())
    }

    fn send_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.record(Call::SendText(element.id().to_string(), text.to_string()));
        Ok(())
    }

    fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.record(Call::Screenshot);
        if self.screenshot_error {
            return Err(DriverError::Protocol {
                command: "screenshot".into(),
                error: "unknown error".into(),
            });
        }
        self.screenshots.set(self.screenshots.get() + 1);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    fn hide_keyboard(&self) -> Result<(), DriverError> {
        self.record(Call::HideKeyboard);
        if self.keyboard_error {
            return Err(DriverError::Protocol {
                command: "hide keyboard".into(),
                error: "no keyboard shown".into(),
            });
        }
        Ok(())
    }
}
