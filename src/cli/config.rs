use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::driver::appium::DEFAULT_SERVER_URL;
use crate::error::ConfigError;
use crate::locator::platform::Platform;
use crate::locator::store::default_aliases;
use crate::resolve::wait::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS, WaitOptions};

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "mobile-locator.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "mobile-locator",
    version,
    about = "Per-platform locator registry and resilient element resolution for Appium suites"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: mobile-locator.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List loaded locator groups and any invalid entries
    Groups {
        /// Locator directory (overrides the config file)
        #[arg(long)]
        locators: Option<String>,
    },

    /// Show a group projected onto one platform
    Show {
        /// Group key, e.g. auth_page_locators
        #[arg(long)]
        group: String,

        /// android or ios
        #[arg(long)]
        platform: String,

        /// Locator directory (overrides the config file)
        #[arg(long)]
        locators: Option<String>,
    },

    /// Resolve one element against a live Appium session
    Probe {
        #[arg(long)]
        group: String,

        #[arg(long)]
        element: String,

        /// android or ios
        #[arg(long)]
        platform: String,

        /// Per-strategy timeout (default: wait.timeout_ms from config)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Click the element once resolved
        #[arg(long, default_value_t = false)]
        click: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `mobile-locator.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub appium: AppiumConfig,
    #[serde(default)]
    pub locators: LocatorsConfig,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppiumConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Platform id -> capability set
    #[serde(default)]
    pub capabilities: BTreeMap<String, Map<String, Value>>,
}

impl Default for AppiumConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            capabilities: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorsConfig {
    #[serde(default = "default_locators_dir")]
    pub dir: String,

    /// File stem -> group key
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for LocatorsConfig {
    fn default() -> Self {
        Self {
            dir: default_locators_dir(),
            aliases: default_aliases(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
        }
    }
}

// Serde default helpers
fn default_server_url() -> String { DEFAULT_SERVER_URL.to_string() }
fn default_locators_dir() -> String { "locators".to_string() }
fn default_reports_dir() -> String { "reports".to_string() }
fn default_timeout_ms() -> u64 { DEFAULT_TIMEOUT_MS }
fn default_poll_interval_ms() -> u64 { DEFAULT_POLL_INTERVAL_MS }

impl AppConfig {
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.wait.timeout_ms)
            .with_poll_interval(self.wait.poll_interval_ms)
    }

    pub fn reports_dir(&self) -> PathBuf {
        PathBuf::from(&self.reports.dir)
    }

    /// Capabilities for a session on `platform`, with `platformName` filled in.
    pub fn capabilities_for(&self, platform: Platform) -> Map<String, Value> {
        let mut caps = self
            .appium
            .capabilities
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(platform.as_str()))
            .map(|(_, caps)| caps.clone())
            .unwrap_or_default();

        caps.entry("platformName")
            .or_insert_with(|| Value::String(platform.capability_name().to_string()));
        caps
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = config_path, error = %e, "malformed config file, using defaults");
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Test data (identities, names, products)
// ============================================================================

/// Read-only nested test data, looked up by dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    root: Value,
}

impl TestData {
    /// Load a JSON or YAML document. Unlike the config file, a missing or
    /// malformed test-data file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let root = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        Ok(Self { root })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// `get("UserData.VALID_INDIVIDUAL_ID")`
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        dotted
            .split('.')
            .try_fold(&self.root, |node, key| node.get(key))
    }

    /// String at `dotted`; numbers and booleans are rendered as text.
    pub fn get_str(&self, dotted: &str) -> Result<String, ConfigError> {
        match self.get(dotted) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
            _ => Err(ConfigError::MissingData(dotted.to_string())),
        }
    }
}
