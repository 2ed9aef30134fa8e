use crate::locator::platform::PageLocators;
use crate::locator::store::LocatorIndex;
use crate::resolve::resolver::StrategyAttempt;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format the loaded index for terminal output.
///
/// Produces output like:
/// ```text
/// === Locator groups (2 loaded) ===
///
///   auth_page_locators  (12 elements)
///   test_order          (8 elements)
///
/// Invalid entries:
///     [INVALID] test_order.popup_confirm (ios): no usable field
/// ```
pub fn format_group_summary(index: &LocatorIndex) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Locator groups ({} loaded) ===\n\n", index.len()));

    let width = index.group_keys().iter().map(|k| k.len()).max().unwrap_or(0);
    for group in index.groups() {
        out.push_str(&format!(
            "  {:<width$}  ({} elements)\n",
            group.key,
            group.elements.len(),
            width = width
        ));
    }

    let invalid = index.invalid_entries();
    if !invalid.is_empty() {
        out.push_str("\nInvalid entries:\n");
        for entry in invalid {
            let platform = entry
                .platform
                .as_deref()
                .map(|p| format!(" ({})", p))
                .unwrap_or_default();
            out.push_str(&format!(
                "    [INVALID] {}.{}{}: {}\n",
                entry.group, entry.element, platform, entry.reason
            ));
        }
    }

    out
}

/// Format one group as seen from a platform: strategies per element, or
/// `unavailable` when the element has no locator there.
pub fn format_page_projection(page: &PageLocators) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== {} on {} ({} elements) ===\n",
        page.group(),
        page.platform(),
        page.len()
    ));

    if page.is_empty() {
        out.push_str("  (no elements)\n");
        return out;
    }

    for element in page.element_keys() {
        let line = match page.get(element) {
            Some(locator) => match locator.strategies() {
                Ok(strategies) => format!("\u{2713} {}  {}", element, strategies),
                Err(e) => format!("\u{2717} {}  {}", element, e),
            },
            None => format!("- {}  unavailable", element),
        };
        out.push_str(&format!("  {}\n", line));
    }

    out
}

/// One line per strategy tried, in order.
pub fn format_attempts(attempts: &[StrategyAttempt]) -> String {
    let mut out = String::new();
    for (i, attempt) in attempts.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {}  {} after {} poll(s)\n",
            i + 1,
            attempt.strategy,
            attempt.outcome.describe(),
            attempt.polls
        ));
    }
    out
}
