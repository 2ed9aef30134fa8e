use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::cli::config::AppConfig;
use crate::driver::appium::AppiumSession;
use crate::error::LocateError;
use crate::interact::page::Interactor;
use crate::locator::platform::{Platform, PlatformResolver, Projection};
use crate::locator::store::LocatorStore;
use crate::report::console::{format_attempts, format_group_summary, format_page_projection};
use crate::report::screenshot::ScreenshotSink;
use crate::resolve::wait::WaitCondition;
use crate::trace::logger::TraceLogger;

/// Interaction trace file, relative to the reports directory.
pub const TRACE_FILE: &str = "interaction_trace.jsonl";

// ============================================================================
// groups subcommand
// ============================================================================

pub fn cmd_groups(locators: Option<&str>, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = build_store(locators, config);
    let index = store.index();

    if index.is_empty() {
        eprintln!("No locator groups found in: {}", store.dir().display());
        return Ok(());
    }

    print!("{}", format_group_summary(&index));
    Ok(())
}

// ============================================================================
// show subcommand
// ============================================================================

pub fn cmd_show(
    group: &str,
    platform: &str,
    locators: Option<&str>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let platform: Platform = platform.parse()?;
    let store = build_store(locators, config);
    let resolver = PlatformResolver::with_platform(store.index(), platform.as_str());

    let page = resolver.project_group(group)?;
    print!("{}", format_page_projection(&page));
    Ok(())
}

// ============================================================================
// probe subcommand
// ============================================================================

/// Resolve (and optionally click) one element on a live session.
/// Returns whether the element was found.
pub fn cmd_probe(
    group: &str,
    element: &str,
    platform: &str,
    timeout_ms: Option<u64>,
    click: bool,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let platform: Platform = platform.parse()?;
    let store = build_store(None, config);
    let resolver = PlatformResolver::with_platform(store.index(), platform.as_str());

    let locator = match resolver.project(group, element)? {
        Projection::Available(locator) => locator,
        Projection::Unavailable => {
            println!("{}.{} has no locator on {}", group, element, platform);
            return Ok(false);
        }
        Projection::NoSuchElement => {
            println!("{}.{} is not defined", group, element);
            return Ok(false);
        }
    };

    let options = match timeout_ms {
        Some(ms) => config.wait_options().with_timeout(ms),
        None => config.wait_options(),
    };
    let timeout = Duration::from_millis(options.timeout_ms);

    info!(server = %config.appium.server_url, %platform, "starting Appium session");
    let session = AppiumSession::start(&config.appium.server_url, config.capabilities_for(platform))?;

    let reports = config.reports_dir();
    let interactor = Interactor::new(&session, &options, ScreenshotSink::new(&reports))
        .with_trace(TraceLogger::new(reports.join(TRACE_FILE)))
        .with_scenario(&format!("probe_{}", group));

    if click {
        return match interactor.click(&locator, element, timeout) {
            Ok(()) => {
                println!("\u{2713} clicked {}.{} ({})", group, element, locator);
                Ok(true)
            }
            Err(e) => report_failure(&e),
        };
    }

    match interactor.resolver().locate(&locator, WaitCondition::Present, timeout) {
        Ok(resolved) => {
            println!("\u{2713} {}.{} found by {}", group, element, resolved.strategy);
            print!("{}", format_attempts(&resolved.attempts));
            Ok(true)
        }
        Err(e) => report_failure(&e),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn build_store(locators: Option<&str>, config: &AppConfig) -> LocatorStore {
    let dir = PathBuf::from(locators.unwrap_or(config.locators.dir.as_str()));
    LocatorStore::new(dir, config.locators.aliases.clone())
}

/// Not-found is a normal probe result; anything else is an error.
fn report_failure(err: &LocateError) -> Result<bool, Box<dyn std::error::Error>> {
    match err {
        LocateError::ElementNotFound { attempts, .. } => {
            println!("\u{2717} {}", err);
            print!("{}", format_attempts(attempts));
            Ok(false)
        }
        other => Err(other.to_string().into()),
    }
}
