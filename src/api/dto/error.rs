//! Error response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "code": "NOT_FOUND",
    "message": "Room with id=0 not found",
    "request_id": "5f0c6c4e-3f7a-4c1e-9a4e-0d7c2b1f9a10"
}))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_skipped() {
        let json = serde_json::to_value(ErrorResponse::new("BAD_REQUEST", "nope")).unwrap();
        assert_eq!(json, json!({"code": "BAD_REQUEST", "message": "nope"}));
    }

    #[test]
    fn test_builder_sets_details_and_request_id() {
        let response = ErrorResponse::new("VALIDATION_ERROR", "invalid")
            .with_details(json!([{"field": "name"}]))
            .with_request_id("req-1");
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["details"][0]["field"], "name");
        assert_eq!(json["request_id"], "req-1");
    }
}
