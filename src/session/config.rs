//! Session Configuration
//!
//! The input bundle submitted for one interview attempt.

use serde::{Deserialize, Serialize};

use super::error::SessionError;
use crate::service::OfferRequest;

/// User-supplied configuration for one session attempt
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Agent identifier on the remote service
    pub agent_id: String,
    /// Credential for the remote service; never logged
    pub api_key: String,
    pub resume: String,
    pub job_description: String,
}

impl SessionConfig {
    pub fn new(
        agent_id: impl Into<String>,
        api_key: impl Into<String>,
        resume: impl Into<String>,
        job_description: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            api_key: api_key.into(),
            resume: resume.into(),
            job_description: job_description.into(),
        }
    }

    /// Wire names of every field that is empty after trimming
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("agentId", &self.agent_id),
            ("apiKey", &self.api_key),
            ("resume", &self.resume),
            ("jobDescription", &self.job_description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    /// Check that all four fields are present
    pub fn validate(&self) -> Result<(), SessionError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SessionError::Validation { missing })
        }
    }

    /// Identifier the session is cancelled by
    pub fn agent_key(&self) -> &str {
        self.agent_id.trim()
    }

    /// Build the `/offer` body. Identifiers are trimmed, free text is sent as typed.
    pub fn to_offer(&self) -> OfferRequest {
        OfferRequest {
            agent_id: self.agent_id.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            resume: self.resume.clone(),
            job_description: self.job_description.clone(),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("agent_id", &self.agent_id)
            .field("api_key", &"<redacted>")
            .field("resume_len", &self.resume.len())
            .field("job_description_len", &self.job_description.len())
            .finish()
    }
}
