use clap::Parser;
use serde_json::json;

use mobile_locator::cli::config::{AppConfig, Cli, Commands, TestData, load_config};
use mobile_locator::error::ConfigError;
use mobile_locator::locator::platform::Platform;
use mobile_locator::report::console::{format_group_summary, format_page_projection};
use mobile_locator::locator::platform::PlatformResolver;
use mobile_locator::locator::store::LocatorIndex;
use mobile_locator::locator::store::default_aliases;

use crate::common::fixtures::{AUTH_PAGE_JSON, write_file};

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_groups_minimal() {
    let cli = Cli::parse_from(["mobile-locator", "groups"]);
    match cli.command {
        Commands::Groups { locators } => assert!(locators.is_none()),
        _ => panic!("Expected Groups command"),
    }
}

#[test]
fn cli_parse_show() {
    let cli = Cli::parse_from([
        "mobile-locator",
        "show",
        "--group",
        "auth_page_locators",
        "--platform",
        "ios",
        "--locators",
        "fixtures/locators",
    ]);
    match cli.command {
        Commands::Show {
            group,
            platform,
            locators,
        } => {
            assert_eq!(group, "auth_page_locators");
            assert_eq!(platform, "ios");
            assert_eq!(locators.as_deref(), Some("fixtures/locators"));
        }
        _ => panic!("Expected Show command"),
    }
}

#[test]
fn cli_parse_probe_all_args() {
    let cli = Cli::parse_from([
        "mobile-locator",
        "probe",
        "--group",
        "test_order",
        "--element",
        "submit",
        "--platform",
        "android",
        "--timeout-ms",
        "2500",
        "--click",
    ]);
    match cli.command {
        Commands::Probe {
            group,
            element,
            platform,
            timeout_ms,
            click,
        } => {
            assert_eq!(group, "test_order");
            assert_eq!(element, "submit");
            assert_eq!(platform, "android");
            assert_eq!(timeout_ms, Some(2500));
            assert!(click);
        }
        _ => panic!("Expected Probe command"),
    }
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from(["mobile-locator", "-vv", "--config", "ci.yaml", "groups"]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("ci.yaml"));
}

#[test]
fn cli_probe_requires_element() {
    let result = Cli::try_parse_from(["mobile-locator", "probe", "--group", "g", "--platform", "ios"]);
    assert!(result.is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.appium.server_url, "http://127.0.0.1:4723/wd/hub");
    assert_eq!(config.locators.dir, "locators");
    assert_eq!(config.locators.aliases, default_aliases());
    assert_eq!(config.wait.timeout_ms, 10_000);
    assert_eq!(config.wait.poll_interval_ms, 500);
    assert_eq!(config.reports.dir, "reports");
}

#[test]
fn config_missing_file_returns_defaults() {
    let config = load_config(Some("/nonexistent/mobile-locator.yaml"));
    assert_eq!(config.wait.timeout_ms, 10_000);
}

#[test]
fn config_malformed_file_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "bad.yaml", "wait: [unclosed");
    let config = load_config(Some(dir.path().join("bad.yaml").to_str().unwrap()));
    assert_eq!(config.reports.dir, "reports");
}

#[test]
fn config_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "mobile-locator.yaml",
        r#"
appium:
  server_url: http://device-farm:4723
  capabilities:
    android:
      appium:automationName: UiAutomator2
      appium:appPackage: com.example.order
wait:
  timeout_ms: 3000
"#,
    );

    let config = load_config(Some(dir.path().join("mobile-locator.yaml").to_str().unwrap()));

    assert_eq!(config.appium.server_url, "http://device-farm:4723");
    assert_eq!(config.wait.timeout_ms, 3000);
    assert_eq!(config.wait.poll_interval_ms, 500);
    assert_eq!(config.wait_options().timeout_ms, 3000);
    assert_eq!(config.locators.dir, "locators");
}

#[test]
fn capabilities_get_platform_name() {
    let mut config = AppConfig::default();
    let mut android = serde_json::Map::new();
    android.insert("appium:automationName".into(), json!("UiAutomator2"));
    config.appium.capabilities.insert("Android".into(), android);

    let caps = config.capabilities_for(Platform::Android);
    assert_eq!(caps["platformName"], "Android");
    assert_eq!(caps["appium:automationName"], "UiAutomator2");

    let ios = config.capabilities_for(Platform::Ios);
    assert_eq!(ios.len(), 1);
    assert_eq!(ios["platformName"], "iOS");
}

#[test]
fn explicit_platform_name_is_kept() {
    let mut config = AppConfig::default();
    let mut ios = serde_json::Map::new();
    ios.insert("platformName".into(), json!("ios"));
    config.appium.capabilities.insert("ios".into(), ios);

    assert_eq!(config.capabilities_for(Platform::Ios)["platformName"], "ios");
}

// ============================================================================
// Test data
// ============================================================================

#[test]
fn test_data_dotted_lookup() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "test_data.json",
        r#"{ "UserData": { "VALID_INDIVIDUAL_ID": "agent01", "PIN": 1234 },
             "CustomerData": { "VALID_CUSTORMER_NAME": "Kim" } }"#,
    );

    let data = TestData::load(&dir.path().join("test_data.json")).unwrap();

    assert_eq!(data.get_str("UserData.VALID_INDIVIDUAL_ID").unwrap(), "agent01");
    assert_eq!(data.get_str("UserData.PIN").unwrap(), "1234");
    assert_eq!(data.get_str("CustomerData.VALID_CUSTORMER_NAME").unwrap(), "Kim");
    assert!(data.get("CustomerData").unwrap().is_object());
    assert!(matches!(data.get_str("ProductData.NAME"), Err(ConfigError::MissingData(_))));
}

#[test]
fn test_data_loads_yaml() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "test_data.yml", "ProductData:\n  NAME: Router X\n");

    let data = TestData::load(&dir.path().join("test_data.yml")).unwrap();
    assert_eq!(data.get_str("ProductData.NAME").unwrap(), "Router X");
}

#[test]
fn test_data_missing_or_malformed_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        TestData::load(&dir.path().join("absent.json")),
        Err(ConfigError::Io { .. })
    ));

    write_file(dir.path(), "broken.json", "{");
    assert!(matches!(
        TestData::load(&dir.path().join("broken.json")),
        Err(ConfigError::Parse { .. })
    ));
}

// ============================================================================
// Console output
// ============================================================================

#[test]
fn group_summary_lists_groups_and_invalid_entries() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "Auth_page_locators.json", AUTH_PAGE_JSON);
    let index = LocatorIndex::load(dir.path(), &default_aliases());

    let out = format_group_summary(&index);

    assert!(out.contains("=== Locator groups (1 loaded) ==="));
    assert!(out.contains("auth_page_locators  (4 elements)"));
    assert!(out.contains("[INVALID] auth_page_locators.blank (android)"));
}

#[test]
fn page_projection_marks_unavailable_elements() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "Auth_page_locators.json", AUTH_PAGE_JSON);
    let index = std::sync::Arc::new(LocatorIndex::load(dir.path(), &default_aliases()));
    let page = PlatformResolver::with_platform(index, "ios")
        .project_group("auth_page_locators")
        .unwrap();

    let out = format_page_projection(&page);

    assert!(out.contains("=== auth_page_locators on ios (4 elements) ==="));
    assert!(out.contains("popup_confirm  unavailable"));
    assert!(out.contains("login_button  [accessibility_id:login]"));
}
