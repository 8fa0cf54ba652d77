use std::collections::HashMap;

use serde::Serialize;
use validator::ValidationError;

pub(crate) mod answer;
pub(crate) mod auth;
pub(crate) mod course;
pub(crate) mod experiment;
pub(crate) mod help_topic;
pub(crate) mod question;
pub(crate) mod request;
pub(crate) mod user;

/// Success envelope shared by every resource endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T> {
    pub(crate) success: bool,
    pub(crate) code: &'static str,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self::with_code("SUCCESS", "OK", data)
    }

    pub(crate) fn with_code(code: &'static str, message: impl Into<String>, data: T) -> Self {
        Self { success: true, code, message: message.into(), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub(crate) fn message(code: &'static str, message: impl Into<String>) -> Self {
        Self { success: true, code, message: message.into(), data: None }
    }
}

/// Rejects text that is empty once surrounding whitespace is trimmed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::message("USER_DELETED", "User deleted")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["code"], "USER_DELETED");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn whitespace_only_text_is_blank() {
        assert!(not_blank("   ").is_err());
        assert!(not_blank("\t\n").is_err());
        assert!(not_blank(" RS100 ").is_ok());
    }

    #[test]
    fn ok_envelope_wraps_data() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json["code"], "SUCCESS");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
