pub mod appium;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::locator::locator_model::Strategy;

/// Live reference to an element, valid until the screen changes.
///
/// Never cache one across calls: every resolution asks the session again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ElementHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// The slice of a UI driver session the resolver and interaction layers use.
///
/// `find` returns `Ok(None)` when nothing matches; `Err` is reserved for
/// transport and protocol failures.
pub trait Driver {
    fn find(&self, strategy: &Strategy) -> Result<Option<ElementHandle>, DriverError>;

    fn find_all(&self, strategy: &Strategy) -> Result<Vec<ElementHandle>, DriverError>;

    fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    fn clear(&self, element: &ElementHandle) -> Result<(), DriverError>;

    fn send_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    /// PNG bytes of the current screen.
    fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    fn hide_keyboard(&self) -> Result<(), DriverError> {
        Ok(())
    }
}
