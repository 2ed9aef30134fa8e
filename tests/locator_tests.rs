use mobile_locator::error::LocateError;
use mobile_locator::locator::locator_model::{LocatorFields, LocatorInput, RawLocator, Strategy, StrategyList};

fn fields(id: Option<&str>, xpath: Option<&str>, accessibility_id: Option<&str>) -> RawLocator {
    RawLocator::Fields(LocatorFields {
        id: id.map(str::to_string),
        xpath: xpath.map(str::to_string),
        accessibility_id: accessibility_id.map(str::to_string),
    })
}

// ============================================================================
// Strategy derivation
// ============================================================================

#[test]
fn strategies_follow_id_xpath_accessibility_order() {
    let locator = fields(Some("com.app:id/ok"), Some("//Button"), Some("ok"));
    let list = locator.strategies().unwrap();

    assert_eq!(
        list.as_slice(),
        &[
            Strategy::ById("com.app:id/ok".into()),
            Strategy::ByPath("//Button".into()),
            Strategy::ByAccessibilityTag("ok".into()),
        ]
    );
}

#[test]
fn absent_and_blank_fields_are_skipped() {
    let locator = fields(Some("  "), None, Some("ok"));
    let list = locator.strategies().unwrap();
    assert_eq!(list.as_slice(), &[Strategy::ByAccessibilityTag("ok".into())]);
}

#[test]
fn record_without_usable_field_is_invalid() {
    let err = fields(None, Some(""), None).strategies().unwrap_err();
    assert!(matches!(err, LocateError::LocatorInvalid { .. }));
    assert!(!fields(None, None, None).is_usable());
}

#[test]
fn bare_string_with_path_root_is_xpath() {
    let list = RawLocator::Bare("//Button[@text='OK']".into()).strategies().unwrap();
    assert_eq!(list.as_slice(), &[Strategy::ByPath("//Button[@text='OK']".into())]);
}

#[test]
fn other_bare_string_is_accessibility_id() {
    let list = RawLocator::Bare("confirm_button".into()).strategies().unwrap();
    assert_eq!(list.as_slice(), &[Strategy::ByAccessibilityTag("confirm_button".into())]);
}

#[test]
fn blank_bare_string_is_invalid() {
    let err = RawLocator::Bare("   ".into()).strategies().unwrap_err();
    assert!(matches!(err, LocateError::LocatorInvalid { .. }));
}

#[test]
fn strategy_list_rejects_empty() {
    assert!(StrategyList::new(vec![]).is_err());
    let list = StrategyList::new(vec![Strategy::ById("a".into())]).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.to_string(), "[id:a]");
}

#[test]
fn strategy_reports_w3c_using_value() {
    assert_eq!(Strategy::ById("x".into()).using(), "id");
    assert_eq!(Strategy::ByPath("//x".into()).using(), "xpath");
    assert_eq!(Strategy::ByAccessibilityTag("x".into()).using(), "accessibility id");
    assert_eq!(Strategy::ByAccessibilityTag("x".into()).name(), "accessibility_id");
}

// ============================================================================
// Dynamic locators
// ============================================================================

#[test]
fn placeholder_substitution_builds_path_locator() {
    let template = RawLocator::xpath("//Node[@text='{name}']");
    let dynamic = template.with_placeholder("name", "Kim").unwrap();

    assert_eq!(dynamic, RawLocator::xpath("//Node[@text='Kim']"));
    // template untouched
    assert_eq!(template, RawLocator::xpath("//Node[@text='{name}']"));
}

#[test]
fn placeholder_substitution_accepts_bare_path() {
    let dynamic = RawLocator::Bare("//Item[contains(@text,'{product}')]".into())
        .with_placeholder("product", "Router X")
        .unwrap();
    assert_eq!(dynamic, RawLocator::xpath("//Item[contains(@text,'Router X')]"));
}

#[test]
fn placeholder_substitution_needs_a_path() {
    let err = RawLocator::id("com.app:id/name").with_placeholder("name", "Kim").unwrap_err();
    assert!(matches!(err, LocateError::LocatorInvalid { .. }));
}

// ============================================================================
// Deserialization and resolver input
// ============================================================================

#[test]
fn raw_locator_deserializes_both_forms() {
    let bare: RawLocator = serde_json::from_str(r#""//Button""#).unwrap();
    assert_eq!(bare, RawLocator::Bare("//Button".into()));

    let record: RawLocator = serde_json::from_str(r#"{"id": "a", "accessibility_id": "b"}"#).unwrap();
    assert_eq!(record, fields(Some("a"), None, Some("b")));
}

#[test]
fn absent_option_is_invalid_input() {
    let none: Option<&RawLocator> = None;
    assert!(none.is_absent());
    assert_eq!(none.describe(), "<none>");
    assert!(matches!(none.strategies(), Err(LocateError::LocatorInvalid { .. })));

    let locator = RawLocator::id("a");
    let some = Some(&locator);
    assert!(!some.is_absent());
    assert_eq!(some.strategies().unwrap().len(), 1);
}

#[test]
fn display_names_every_present_field() {
    assert_eq!(fields(Some("a"), Some("//b"), None).to_string(), "{id=a, xpath=//b}");
    assert_eq!(RawLocator::Bare("ok".into()).to_string(), "'ok'");
}
