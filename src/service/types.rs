//! Interview Service Types - wire bodies for the `/offer` and `/cancel` endpoints

use serde::{Deserialize, Serialize};

/// Fallback reason when a failed `/offer` response carries no `error` text
pub const DEFAULT_START_ERROR: &str = "Failed to start interview";

/// Fallback reason when a failed `/cancel` response carries no `error` text
pub const DEFAULT_CANCEL_ERROR: &str = "Failed to cancel interview";

/// Body of `POST /offer`
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub agent_id: String,
    pub api_key: String,
    pub resume: String,
    pub job_description: String,
}

impl std::fmt::Debug for OfferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferRequest")
            .field("agent_id", &self.agent_id)
            .field("api_key", &"<redacted>")
            .field("resume_len", &self.resume.len())
            .field("job_description_len", &self.job_description.len())
            .finish()
    }
}

/// Successful `/offer` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub conversation_id: String,
}

/// Body of `POST /cancel`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub agent_id: String,
}

impl CancelRequest {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
        }
    }
}

/// Error body returned with a non-2xx status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, tolerating empty or non-JSON payloads.
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// The service's message, or `fallback` when it sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        match self.error.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_request_uses_camel_case() {
        let request = OfferRequest {
            agent_id: "agent".to_string(),
            api_key: "key".to_string(),
            resume: "resume".to_string(),
            job_description: "jd".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["agentId"], "agent");
        assert_eq!(json["apiKey"], "key");
        assert_eq!(json["jobDescription"], "jd");
    }

    #[test]
    fn test_offer_request_debug_hides_api_key() {
        let request = OfferRequest {
            agent_id: "agent".to_string(),
            api_key: "sk-secret".to_string(),
            resume: String::new(),
            job_description: String::new(),
        };
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_error_body_fallbacks() {
        assert_eq!(
            ErrorBody::parse(r#"{"error":"bad agent"}"#).message_or(DEFAULT_START_ERROR),
            "bad agent"
        );
        assert_eq!(
            ErrorBody::parse("<html>502</html>").message_or(DEFAULT_START_ERROR),
            DEFAULT_START_ERROR
        );
        assert_eq!(
            ErrorBody::parse(r#"{"error":"  "}"#).message_or(DEFAULT_CANCEL_ERROR),
            DEFAULT_CANCEL_ERROR
        );
    }
}
