use std::time::Duration;

use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::driver::{Driver, ElementHandle};
use crate::error::DriverError;
use crate::locator::locator_model::Strategy;

/// W3C key under which element references are returned.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4723/wd/hub";

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Request body sent to the Appium server (W3C WebDriver JSON).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AppiumRequest {
    NewSession {
        capabilities: SessionCapabilities,
    },
    FindElement {
        using: &'static str,
        value: String,
    },
    SendText {
        text: String,
    },
    Empty {},
}

#[derive(Debug, Serialize)]
pub struct SessionCapabilities {
    #[serde(rename = "alwaysMatch")]
    pub always_match: Map<String, Value>,
    #[serde(rename = "firstMatch")]
    pub first_match: Vec<Map<String, Value>>,
}

impl AppiumRequest {
    pub fn new_session(capabilities: Map<String, Value>) -> Self {
        AppiumRequest::NewSession {
            capabilities: SessionCapabilities {
                always_match: capabilities,
                first_match: vec![Map::new()],
            },
        }
    }

    pub fn find(strategy: &Strategy) -> Self {
        AppiumRequest::FindElement {
            using: strategy.using(),
            value: strategy.value().to_string(),
        }
    }

    pub fn send_text(text: &str) -> Self {
        AppiumRequest::SendText {
            text: text.to_string(),
        }
    }

    pub fn empty() -> Self {
        AppiumRequest::Empty {}
    }
}

/// Response envelope: every W3C reply carries a `value`.
#[derive(Debug, Deserialize)]
pub struct AppiumResponse {
    #[serde(default)]
    pub value: Value,
}

/// Error payload inside `value` when a command fails.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct W3cError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl AppiumResponse {
    pub fn w3c_error(&self) -> Option<W3cError> {
        self.value.get("error")?.as_str()?;
        serde_json::from_value(self.value.clone()).ok()
    }

    pub fn element(&self) -> Option<ElementHandle> {
        parse_element(&self.value)
    }

    pub fn elements(&self) -> Vec<ElementHandle> {
        self.value
            .as_array()
            .map(|items| items.iter().filter_map(parse_element).collect())
            .unwrap_or_default()
    }
}

/// Read an element reference, accepting the legacy JSONWP `ELEMENT` key too.
pub fn parse_element(value: &Value) -> Option<ElementHandle> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get("ELEMENT"))
        .and_then(Value::as_str)
        .map(ElementHandle::new)
}

// ============================================================================
// Session
// ============================================================================

/// A live Appium session spoken to over blocking HTTP.
pub struct AppiumSession {
    client: Client,
    server_url: String,
    session_id: String,
    closed: bool,
}

impl AppiumSession {
    /// Open a new session with the given capabilities.
    pub fn start(server_url: &str, capabilities: Map<String, Value>) -> Result<Self, DriverError> {
        let server_url = server_url.trim_end_matches('/').to_string();
        let endpoint = format!("{}/session", server_url);
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| DriverError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let request = client.post(&endpoint).json(&AppiumRequest::new_session(capabilities));
        let response = dispatch(request, &endpoint)?;
        if let Some(err) = response.w3c_error() {
            return Err(DriverError::Protocol {
                command: "new session".into(),
                error: format!("{}: {}", err.error, err.message),
            });
        }

        let session_id = response
            .value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::SessionNotStarted(response.value.to_string()))?
            .to_string();

        info!(session = %session_id, server = %server_url, "Appium session started");

        Ok(AppiumSession {
            client,
            server_url,
            session_id,
            closed: false,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.server_url, self.session_id, path)
    }

    fn post(&self, path: &str, body: &AppiumRequest) -> Result<AppiumResponse, DriverError> {
        let endpoint = self.endpoint(path);
        dispatch(self.client.post(&endpoint).json(body), &endpoint)
    }

    fn get(&self, path: &str) -> Result<AppiumResponse, DriverError> {
        let endpoint = self.endpoint(path);
        dispatch(self.client.get(&endpoint), &endpoint)
    }

    /// Send and convert any W3C error payload into a `DriverError`.
    fn post_ok(&self, path: &str, body: &AppiumRequest, command: &str) -> Result<AppiumResponse, DriverError> {
        let response = self.post(path, body)?;
        check(response, command)
    }

    fn get_ok(&self, path: &str, command: &str) -> Result<AppiumResponse, DriverError> {
        let response = self.get(path)?;
        check(response, command)
    }

    fn get_bool(&self, path: &str, command: &str) -> Result<bool, DriverError> {
        let response = self.get_ok(path, command)?;
        Ok(response.value.as_bool().unwrap_or(false))
    }

    /// End the session. Safe to call more than once.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let endpoint = format!("{}/session/{}", self.server_url, self.session_id);
        dispatch(self.client.delete(&endpoint), &endpoint)?;
        info!(session = %self.session_id, "Appium session closed");
        Ok(())
    }
}

impl Driver for AppiumSession {
    fn find(&self, strategy: &Strategy) -> Result<Option<ElementHandle>, DriverError> {
        let response = self.post("/element", &AppiumRequest::find(strategy))?;
        match response.w3c_error() {
            Some(err) if err.error == "no such element" => Ok(None),
            Some(err) => Err(classify(err, "find element")),
            None => Ok(response.element()),
        }
    }

    fn find_all(&self, strategy: &Strategy) -> Result<Vec<ElementHandle>, DriverError> {
        let response = self.post_ok("/elements", &AppiumRequest::find(strategy), "find elements")?;
        Ok(response.elements())
    }

    fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.get_bool(&format!("/element/{}/displayed", element.id()), "is displayed")
    }

    fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.get_bool(&format!("/element/{}/enabled", element.id()), "is enabled")
    }

    fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.post_ok(&format!("/element/{}/click", element.id()), &AppiumRequest::empty(), "click")?;
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.post_ok(&format!("/element/{}/clear", element.id()), &AppiumRequest::empty(), "clear")?;
        Ok(())
    }

    fn send_text(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.post_ok(
            &format!("/element/{}/value", element.id()),
            &AppiumRequest::send_text(text),
            "send keys",
        )?;
        Ok(())
    }

    fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let response = self.get_ok("/screenshot", "screenshot")?;
        let encoded = response.value.as_str().ok_or_else(|| DriverError::Decode {
            context: "screenshot".into(),
            message: "value is not a string".into(),
        })?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| DriverError::Decode {
                context: "screenshot".into(),
                message: e.to_string(),
            })
    }

    fn hide_keyboard(&self) -> Result<(), DriverError> {
        self.post_ok("/appium/device/hide_keyboard", &AppiumRequest::empty(), "hide keyboard")?;
        Ok(())
    }
}

impl Drop for AppiumSession {
    fn drop(&mut self) {
        // Best-effort cleanup
        let _ = self.quit();
    }
}

fn dispatch(request: RequestBuilder, endpoint: &str) -> Result<AppiumResponse, DriverError> {
    debug!(endpoint, "appium request");
    let body = request
        .send()
        .and_then(|r| r.text())
        .map_err(|e| DriverError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

    if body.trim().is_empty() {
        return Ok(AppiumResponse { value: Value::Null });
    }

    serde_json::from_str(&body).map_err(|e| DriverError::Json {
        context: endpoint.to_string(),
        source: e,
    })
}

fn check(response: AppiumResponse, command: &str) -> Result<AppiumResponse, DriverError> {
    match response.w3c_error() {
        Some(err) => Err(classify(err, command)),
        None => Ok(response),
    }
}

fn classify(err: W3cError, command: &str) -> DriverError {
    if err.error == "stale element reference" {
        DriverError::StaleElement(err.message)
    } else {
        DriverError::Protocol {
            command: command.to_string(),
            error: format!("{}: {}", err.error, err.message),
        }
    }
}
