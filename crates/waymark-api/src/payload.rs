use crate::response::ApiResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /mapping/save`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMappingBody {
    pub map_name: String,
}

/// Parse a request body against a serde schema. A missing body is treated as
/// the empty object so partial-update payloads can omit everything. Schema
/// violations become 400 responses with field-level detail.
pub(crate) fn parse_body<T: DeserializeOwned>(
    body: Option<&Value>,
    what: &str,
) -> Result<T, ApiResponse> {
    let value = body.cloned().unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|e| {
        ApiResponse::bad_request(format!("invalid {what} data"), vec![e.to_string()])
    })
}
