use std::path::Path;
use std::time::Duration;

use mobile_locator::resolve::wait::WaitOptions;

/// Fast polling so timeouts stay in the tens of milliseconds.
pub fn quick_wait(timeout_ms: u64) -> WaitOptions {
    WaitOptions::new().with_timeout(timeout_ms).with_poll_interval(5)
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

pub const AUTH_PAGE_JSON: &str = r#"{
  "auth_page_locators": {
    "login_button": {
      "android": { "id": "com.app:id/login", "xpath": "//Button[@text='Login']", "accessibility_id": "login" },
      "ios": { "accessibility_id": "login" }
    },
    "popup_confirm": {
      "android": { "id": "com.app:id/confirm" }
    },
    "customer_row": {
      "android": "//TextView[@text='{name}']",
      "ios": "customer_row"
    },
    "blank": {
      "android": { "id": "", "xpath": "  " }
    }
  }
}"#;

pub const ORDER_YAML: &str = r#"
test_order:
  submit:
    android:
      id: com.app:id/submit
    IOS:
      accessibility_id: submit
"#;
