use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::locator::locator_model::{LocatorFields, RawLocator};

/// Platform id (lowercase) -> locator for that platform.
pub type PlatformLocatorSpec = BTreeMap<String, RawLocator>;

/// File stem -> group key table used by the mobile-order suite.
pub const DEFAULT_FILE_ALIASES: &[(&str, &str)] = &[
    ("Digitalsales_locators", "digitalsales_locators"),
    ("Order_Docbar_locators", "test_order"),
    ("Auth_page_locators", "auth_page_locators"),
    ("Order_Status_locators", "Order_Status"),
    ("product_select_locators", "product_select"),
];

pub fn default_aliases() -> BTreeMap<String, String> {
    DEFAULT_FILE_ALIASES
        .iter()
        .map(|(file, group)| (file.to_string(), group.to_string()))
        .collect()
}

// ============================================================================
// Index model
// ============================================================================

/// Locators for one logical screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocatorGroup {
    pub key: String,
    pub elements: BTreeMap<String, PlatformLocatorSpec>,
}

/// A locator entry flagged while loading. Unusable records stay in the index
/// (they fail with `LocatorInvalid` when resolved); unparseable ones are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
    pub group: String,
    pub element: String,
    pub platform: Option<String>,
    pub reason: String,
}

/// Immutable, platform-independent index of every loaded group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocatorIndex {
    groups: BTreeMap<String, LocatorGroup>,
    invalid: Vec<InvalidEntry>,
}

impl LocatorIndex {
    /// Build an index directly from groups (no files involved).
    pub fn from_groups(groups: impl IntoIterator<Item = LocatorGroup>) -> Self {
        LocatorIndex {
            groups: groups.into_iter().map(|g| (g.key.clone(), g)).collect(),
            invalid: Vec::new(),
        }
    }

    /// Load every locator document in `dir` whose file stem matches an alias.
    ///
    /// Best-effort: a missing directory yields an empty index and a bad
    /// document is logged and skipped without affecting the others.
    pub fn load(dir: &Path, aliases: &BTreeMap<String, String>) -> Self {
        let mut index = LocatorIndex::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "locator directory is not readable");
                return index;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && DocumentFormat::from_path(p).is_some())
            .collect();
        // Load order decides which file wins when two stems alias the same group
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(group_key) = match_alias(stem, aliases) else {
                debug!(file = %path.display(), "no group alias for locator file, skipping");
                continue;
            };

            let Some(document) = read_document(&path) else {
                continue;
            };
            if document.is_empty() {
                warn!(file = %path.display(), "locator file is empty, skipping");
                continue;
            }

            let group_value = match document.get(group_key) {
                Some(nested) => nested.clone(),
                None => {
                    info!(
                        file = %path.display(),
                        group = group_key,
                        "no top-level group key, loading the whole file as the group"
                    );
                    Value::Object(document)
                }
            };

            let Value::Object(elements) = group_value else {
                error!(file = %path.display(), group = group_key, "group value is not a mapping, skipping");
                continue;
            };

            let (group, invalid) = parse_group(group_key, &elements);
            index.invalid.extend(invalid);
            index.groups.insert(group.key.clone(), group);
        }

        info!(groups = ?index.group_keys(), "locator loading complete");
        index
    }

    pub fn group(&self, key: &str) -> Option<&LocatorGroup> {
        self.groups.get(key)
    }

    pub fn group_keys(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn groups(&self) -> impl Iterator<Item = &LocatorGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Entries flagged during load, in load order.
    pub fn invalid_entries(&self) -> &[InvalidEntry] {
        &self.invalid
    }
}

// ============================================================================
// Exactly-once store
// ============================================================================

/// Lazily loads a `LocatorIndex` exactly once and shares it by `Arc`.
///
/// Concurrent first calls to `index()` block on a single load.
#[derive(Debug)]
pub struct LocatorStore {
    dir: PathBuf,
    aliases: BTreeMap<String, String>,
    index: OnceCell<Arc<LocatorIndex>>,
}

impl LocatorStore {
    pub fn new(dir: impl Into<PathBuf>, aliases: BTreeMap<String, String>) -> Self {
        LocatorStore {
            dir: dir.into(),
            aliases,
            index: OnceCell::new(),
        }
    }

    pub fn with_default_aliases(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, default_aliases())
    }

    pub fn index(&self) -> Arc<LocatorIndex> {
        self.index
            .get_or_init(|| Arc::new(LocatorIndex::load(&self.dir, &self.aliases)))
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ============================================================================
// Document parsing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// Case-insensitive file stem -> group key lookup.
fn match_alias<'a>(stem: &str, aliases: &'a BTreeMap<String, String>) -> Option<&'a str> {
    aliases
        .iter()
        .find(|(file, _)| file.eq_ignore_ascii_case(stem))
        .map(|(_, group)| group.as_str())
}

fn read_document(path: &Path) -> Option<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            error!(file = %path.display(), error = %e, "could not read locator file");
            return None;
        }
    };

    let parsed: Result<Value, String> = match DocumentFormat::from_path(path) {
        Some(DocumentFormat::Json) => serde_json::from_str(&content).map_err(|e| e.to_string()),
        Some(DocumentFormat::Yaml) => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        None => return None,
    };

    match parsed {
        Ok(Value::Object(map)) => Some(map),
        Ok(Value::Null) => Some(Map::new()),
        Ok(_) => {
            error!(file = %path.display(), "locator file is not a mapping");
            None
        }
        Err(e) => {
            error!(file = %path.display(), error = %e, "locator file is not valid structured data");
            None
        }
    }
}

fn parse_group(group_key: &str, elements: &Map<String, Value>) -> (LocatorGroup, Vec<InvalidEntry>) {
    let mut group = LocatorGroup {
        key: group_key.to_string(),
        elements: BTreeMap::new(),
    };
    let mut invalid = Vec::new();

    for (element, value) in elements {
        let mut spec = PlatformLocatorSpec::new();

        match value {
            Value::Object(platforms) => {
                for (platform, raw) in platforms {
                    let platform = platform.trim().to_lowercase();
                    // An explicit null is a declared but empty locator, not a missing one.
                    let parsed = match raw {
                        Value::Null => Ok(RawLocator::Fields(LocatorFields::default())),
                        raw => serde_json::from_value::<RawLocator>(raw.clone()),
                    };
                    match parsed {
                        Ok(locator) => {
                            if !locator.is_usable() {
                                warn!(group = group_key, element = %element, platform = %platform, "locator has no usable strategy");
                                invalid.push(InvalidEntry {
                                    group: group_key.to_string(),
                                    element: element.clone(),
                                    platform: Some(platform.clone()),
                                    reason: format!("no usable strategy in {}", locator),
                                });
                            }
                            spec.insert(platform, locator);
                        }
                        Err(e) => {
                            warn!(group = group_key, element = %element, platform = %platform, error = %e, "dropping malformed locator");
                            invalid.push(InvalidEntry {
                                group: group_key.to_string(),
                                element: element.clone(),
                                platform: Some(platform),
                                reason: format!("malformed locator: {}", raw),
                            });
                        }
                    }
                }
            }
            other => {
                warn!(group = group_key, element = %element, "element is not a per-platform mapping");
                invalid.push(InvalidEntry {
                    group: group_key.to_string(),
                    element: element.clone(),
                    platform: None,
                    reason: format!("expected per-platform mapping, found {}", other),
                });
            }
        }

        group.elements.insert(element.clone(), spec);
    }

    (group, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_match_ignores_case() {
        let aliases = default_aliases();
        assert_eq!(match_alias("order_docbar_LOCATORS", &aliases), Some("test_order"));
        assert_eq!(match_alias("Unknown_locators", &aliases), None);
    }

    #[test]
    fn document_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), None);
    }
}
