use serde::Serialize;
use serde_json::{json, Value};

/// Transport-agnostic response: an HTTP-shaped status code plus an optional
/// JSON body. Whatever transport fronts the façade maps this 1:1.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn json(status: u16, body: impl Serialize) -> Self {
        Self {
            status,
            body: Some(serde_json::to_value(body).expect("response bodies serialize")),
        }
    }

    pub fn ok(body: impl Serialize) -> Self {
        Self::json(200, body)
    }

    pub fn created(body: impl Serialize) -> Self {
        Self::json(201, body)
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    /// Error body shape: `{error, details?}`.
    pub fn error(status: u16, message: impl Into<String>, details: Vec<String>) -> Self {
        let message = message.into();
        let body = if details.is_empty() {
            json!({ "error": message })
        } else {
            json!({ "error": message, "details": details })
        };
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(404, message, Vec::new())
    }

    pub fn bad_request(message: impl Into<String>, details: Vec<String>) -> Self {
        Self::error(400, message, details)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::error(409, message, Vec::new())
    }

    pub fn method_not_allowed() -> Self {
        Self::error(405, "method not allowed", Vec::new())
    }
}
