pub mod cli;
pub mod driver;
pub mod error;
pub mod interact;
pub mod locator;
pub mod logging;
pub mod report;
pub mod resolve;
pub mod trace;

pub use driver::{Driver, ElementHandle};
pub use error::{ConfigError, DriverError, LocateError};
pub use interact::page::{Interactor, Outcome, Pace, Selection};
pub use locator::locator_model::{LocatorInput, RawLocator, Strategy, StrategyList};
pub use locator::platform::{Platform, PlatformResolver, Projection};
pub use locator::store::{LocatorIndex, LocatorStore};
pub use resolve::resolver::{Resolution, StrategyResolver};
pub use resolve::wait::{WaitCondition, WaitOptions};
