use serde::{Deserialize, Serialize};

use crate::TodoError;

/// The profile cached alongside the credential at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserProfile {
    /// Decode a cached profile, checking its shape.
    pub fn parse(raw: &str) -> Result<Self, TodoError> {
        let profile: UserProfile = serde_json::from_str(raw)
            .map_err(|e| TodoError::MalformedProfile(e.to_string()))?;
        if profile.email.trim().is_empty() {
            return Err(TodoError::MalformedProfile("empty email".into()));
        }
        Ok(profile)
    }

    pub fn to_json(&self) -> String {
        // A struct of strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}
