use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LocateError;

/// Prefix that marks a bare locator string as a structural path.
pub const PATH_ROOT: &str = "//";

// ============================================================================
// Raw locators (as written in locator documents)
// ============================================================================

/// One platform's locator for an element, as found in a locator document.
///
/// Either a record with any of `id`, `xpath`, `accessibility_id`, or a bare
/// string. A bare string starting with `//` is a path; anything else is an
/// accessibility identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLocator {
    Bare(String),
    Fields(LocatorFields),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_id: Option<String>,
}

impl RawLocator {
    pub fn id(value: &str) -> Self {
        RawLocator::Fields(LocatorFields {
            id: Some(value.to_string()),
            ..LocatorFields::default()
        })
    }

    pub fn xpath(value: &str) -> Self {
        RawLocator::Fields(LocatorFields {
            xpath: Some(value.to_string()),
            ..LocatorFields::default()
        })
    }

    pub fn accessibility_id(value: &str) -> Self {
        RawLocator::Fields(LocatorFields {
            accessibility_id: Some(value.to_string()),
            ..LocatorFields::default()
        })
    }

    /// Derive the ordered strategy list: id, then xpath, then accessibility id.
    ///
    /// Empty values count as absent. A locator with nothing usable is
    /// rejected with `LocatorInvalid`.
    pub fn strategies(&self) -> Result<StrategyList, LocateError> {
        let mut strategies = Vec::with_capacity(3);
        match self {
            RawLocator::Fields(fields) => {
                if let Some(id) = non_empty(&fields.id) {
                    strategies.push(Strategy::ById(id.to_string()));
                }
                if let Some(xpath) = non_empty(&fields.xpath) {
                    strategies.push(Strategy::ByPath(xpath.to_string()));
                }
                if let Some(tag) = non_empty(&fields.accessibility_id) {
                    strategies.push(Strategy::ByAccessibilityTag(tag.to_string()));
                }
            }
            RawLocator::Bare(value) if value.trim().is_empty() => {}
            RawLocator::Bare(value) if value.starts_with(PATH_ROOT) => {
                strategies.push(Strategy::ByPath(value.clone()));
            }
            RawLocator::Bare(value) => {
                strategies.push(Strategy::ByAccessibilityTag(value.clone()));
            }
        }

        StrategyList::new(strategies)
            .map_err(|_| LocateError::invalid(format!("no usable strategy in locator {}", self)))
    }

    pub fn is_usable(&self) -> bool {
        self.strategies().is_ok()
    }

    /// Build a one-shot locator by substituting `{placeholder}` in the path.
    ///
    /// Only the structural path is carried over; the result is a path-only
    /// record. Fails with `LocatorInvalid` when there is no path to fill in.
    pub fn with_placeholder(&self, placeholder: &str, value: &str) -> Result<RawLocator, LocateError> {
        let template = match self {
            RawLocator::Fields(fields) => non_empty(&fields.xpath),
            RawLocator::Bare(bare) if bare.starts_with(PATH_ROOT) => Some(bare.as_str()),
            RawLocator::Bare(_) => None,
        }
        .ok_or_else(|| {
            LocateError::invalid(format!("locator {} has no path template for '{{{}}}'", self, placeholder))
        })?;

        let token = format!("{{{}}}", placeholder);
        Ok(RawLocator::xpath(&template.replace(&token, value)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl fmt::Display for RawLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawLocator::Bare(value) => write!(f, "'{}'", value),
            RawLocator::Fields(fields) => {
                let parts: Vec<String> = [
                    ("id", &fields.id),
                    ("xpath", &fields.xpath),
                    ("accessibility_id", &fields.accessibility_id),
                ]
                .iter()
                .filter_map(|&(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
                .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// One way of addressing an element, carrying the value used with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value")]
pub enum Strategy {
    #[serde(rename = "id")]
    ById(String),
    #[serde(rename = "xpath")]
    ByPath(String),
    #[serde(rename = "accessibility_id")]
    ByAccessibilityTag(String),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::ById(_) => "id",
            Strategy::ByPath(_) => "xpath",
            Strategy::ByAccessibilityTag(_) => "accessibility_id",
        }
    }

    /// The W3C/Appium `using` value for this strategy.
    pub fn using(&self) -> &'static str {
        match self {
            Strategy::ById(_) => "id",
            Strategy::ByPath(_) => "xpath",
            Strategy::ByAccessibilityTag(_) => "accessibility id",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Strategy::ById(v) | Strategy::ByPath(v) | Strategy::ByAccessibilityTag(v) => v,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name(), self.value())
    }
}

/// Non-empty, ordered list of strategies to try for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyList(Vec<Strategy>);

impl StrategyList {
    pub fn new(strategies: Vec<Strategy>) -> Result<Self, LocateError> {
        if strategies.is_empty() {
            return Err(LocateError::invalid("empty strategy list"));
        }
        Ok(StrategyList(strategies))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Strategy> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Strategy] {
        &self.0
    }
}

impl fmt::Display for StrategyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", parts.join(" -> "))
    }
}

// ============================================================================
// Resolver input
// ============================================================================

/// Anything the resolver can turn into a strategy list.
///
/// `Option::None` stands for "no locator for this element on this platform"
/// and is rejected as `LocatorInvalid` before any session query.
pub trait LocatorInput {
    fn strategies(&self) -> Result<StrategyList, LocateError>;
    fn describe(&self) -> String;

    /// True when there is no locator at all (as opposed to an empty one).
    fn is_absent(&self) -> bool {
        false
    }
}

impl LocatorInput for RawLocator {
    fn strategies(&self) -> Result<StrategyList, LocateError> {
        RawLocator::strategies(self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl LocatorInput for StrategyList {
    fn strategies(&self) -> Result<StrategyList, LocateError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl<T: LocatorInput + ?Sized> LocatorInput for Option<&T> {
    fn strategies(&self) -> Result<StrategyList, LocateError> {
        match self {
            Some(locator) => locator.strategies(),
            None => Err(LocateError::invalid("locator is absent")),
        }
    }

    fn describe(&self) -> String {
        match self {
            Some(locator) => locator.describe(),
            None => "<none>".to_string(),
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}
