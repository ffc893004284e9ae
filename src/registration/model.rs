//! # Persisted registration and push token types.
//!
//! The persisted JSON form is
//! `{"url": ..., "body": {...}, "pendingDevicePushToken": {"type": ..., "data": ...} | null}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RegistrationError;

/// Platform a push token was issued for.
///
/// Unknown platform names are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Ios,
    Android,
    Other(String),
}

impl Platform {
    /// Platform name as persisted (`"ios"`, `"android"`, or the original name).
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Other(name) => name,
        }
    }

    /// Token type expected by the registration endpoint.
    ///
    /// `ios → "apns"`, `android → "fcm"`, anything else is passed through.
    pub fn token_type(&self) -> &str {
        match self {
            Platform::Ios => "apns",
            Platform::Android => "fcm",
            Platform::Other(name) => name,
        }
    }
}

impl From<String> for Platform {
    fn from(name: String) -> Self {
        match name.as_str() {
            "ios" => Platform::Ios,
            "android" => Platform::Android,
            _ => Platform::Other(name),
        }
    }
}

impl From<&str> for Platform {
    fn from(name: &str) -> Self {
        Platform::from(name.to_string())
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device push token as observed from the platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePushToken {
    #[serde(rename = "type")]
    pub platform: Platform,
    pub data: String,
}

impl DevicePushToken {
    pub fn new(platform: impl Into<Platform>, data: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            data: data.into(),
        }
    }

    pub fn ios(data: impl Into<String>) -> Self {
        Self::new(Platform::Ios, data)
    }

    pub fn android(data: impl Into<String>) -> Self {
        Self::new(Platform::Android, data)
    }
}

/// Registration endpoint plus the delivery obligation, as persisted.
///
/// `pending_token` is set right before a delivery's first network attempt and
/// cleared once the endpoint accepted it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "url")]
    pub endpoint: String,
    #[serde(default)]
    pub body: Map<String, Value>,
    #[serde(rename = "pendingDevicePushToken", default)]
    pub pending_token: Option<DevicePushToken>,
}

impl Registration {
    pub fn new(endpoint: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            endpoint: endpoint.into(),
            body,
            pending_token: None,
        }
    }

    /// Parses the persisted JSON form.
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        serde_json::from_str(raw).map_err(|e| RegistrationError::MalformedPersistedState {
            error: e.to_string(),
        })
    }

    /// Serializes to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, RegistrationError> {
        serde_json::to_string(self).map_err(|e| RegistrationError::NonRetryable {
            error: e.to_string(),
        })
    }

    /// Builds the request body sent for `token`.
    ///
    /// Custom body fields come first; `development`, `deviceToken` and `type`
    /// override custom fields of the same name.
    pub fn request_body(&self, token: &DevicePushToken, development: bool) -> Map<String, Value> {
        let mut body = self.body.clone();
        body.insert("development".to_string(), Value::Bool(development));
        body.insert("deviceToken".to_string(), Value::String(token.data.clone()));
        body.insert(
            "type".to_string(),
            Value::String(token.platform.token_type().to_string()),
        );
        body
    }
}
