use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{ConfigError, LocateError};
use crate::locator::locator_model::RawLocator;
use crate::locator::store::LocatorIndex;

/// Mobile OS families a driver session can be started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Value for the `platformName` capability.
    pub fn capability_name(&self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            _ => Err(ConfigError::UnknownPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Projection results
// ============================================================================

/// Result of projecting one element onto the active platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// The element has a locator for this platform
    Available(RawLocator),
    /// The element exists in the group but not on this platform
    Unavailable,
    /// The group has no element with this key
    NoSuchElement,
}

impl Projection {
    pub fn locator(&self) -> Option<&RawLocator> {
        match self {
            Projection::Available(locator) => Some(locator),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Projection::Available(_))
    }
}

/// One screen's locators projected onto a platform, as page objects hold them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLocators {
    group: String,
    platform: String,
    elements: BTreeMap<String, Option<RawLocator>>,
}

impl PageLocators {
    /// Concrete locator, or `None` when unavailable or unknown.
    pub fn get(&self, element: &str) -> Option<&RawLocator> {
        self.elements.get(element).and_then(Option::as_ref)
    }

    pub fn lookup(&self, element: &str) -> Projection {
        match self.elements.get(element) {
            Some(Some(locator)) => Projection::Available(locator.clone()),
            Some(None) => Projection::Unavailable,
            None => Projection::NoSuchElement,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn element_keys(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Session-scoped view of the locator index for one platform.
///
/// Prefer `with_platform`; a resolver built with `new` refuses to project
/// until `set_platform` has been called.
#[derive(Debug, Clone)]
pub struct PlatformResolver {
    index: Arc<LocatorIndex>,
    platform: Option<String>,
}

impl PlatformResolver {
    pub fn new(index: Arc<LocatorIndex>) -> Self {
        PlatformResolver {
            index,
            platform: None,
        }
    }

    pub fn with_platform(index: Arc<LocatorIndex>, platform: &str) -> Self {
        let mut resolver = Self::new(index);
        resolver.set_platform(platform);
        resolver
    }

    /// Store the platform lowercased. Blank input leaves the current value.
    pub fn set_platform(&mut self, platform: &str) {
        let normalized = platform.trim().to_lowercase();
        if !normalized.is_empty() {
            self.platform = Some(normalized);
        }
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn index(&self) -> &LocatorIndex {
        &self.index
    }

    /// Project a whole group. An unknown group is logged and yields an empty page.
    pub fn project_group(&self, group_key: &str) -> Result<PageLocators, LocateError> {
        let platform = self.platform.as_deref().ok_or(LocateError::NotConfigured)?;

        let mut page = PageLocators {
            group: group_key.to_string(),
            platform: platform.to_string(),
            elements: BTreeMap::new(),
        };

        let Some(group) = self.index.group(group_key) else {
            error!(group = group_key, "no locator group with this key");
            return Ok(page);
        };

        for (element, spec) in &group.elements {
            let locator = spec.get(platform).cloned();
            if locator.is_none() {
                warn!(group = group_key, element = %element, platform, "element has no locator for this platform");
            }
            page.elements.insert(element.clone(), locator);
        }

        Ok(page)
    }

    pub fn project(&self, group_key: &str, element: &str) -> Result<Projection, LocateError> {
        let platform = self.platform.as_deref().ok_or(LocateError::NotConfigured)?;

        let Some(group) = self.index.group(group_key) else {
            error!(group = group_key, "no locator group with this key");
            return Ok(Projection::NoSuchElement);
        };

        Ok(match group.elements.get(element) {
            Some(spec) => match spec.get(platform) {
                Some(locator) => Projection::Available(locator.clone()),
                None => Projection::Unavailable,
            },
            None => Projection::NoSuchElement,
        })
    }
}
