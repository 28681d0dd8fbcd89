use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::ServiceError;

pub const USER_ID_PLACEHOLDER: &str = "{user_id}";

/// Build the base URL of the task resource from the server URL and a path
/// prefix such as `/api/{user_id}`.
///
/// The user id comes from the cached profile when present, otherwise from
/// the `sub` claim of a JWT-shaped token.
pub fn resolve_tasks_base(
    server_url: &str,
    api_prefix: &str,
    profile_id: Option<&str>,
    token: &str,
) -> Result<String, ServiceError> {
    let server_url = server_url.trim_end_matches('/');
    let prefix = api_prefix.trim_end_matches('/');

    let prefix = if prefix.contains(USER_ID_PLACEHOLDER) {
        let user_id = profile_id
            .map(str::to_string)
            .filter(|id| !id.is_empty())
            .or_else(|| token_subject(token))
            .ok_or_else(|| {
                ServiceError::Unauthorized(
                    "cannot determine user id from session; sign in again".into(),
                )
            })?;
        prefix.replace(USER_ID_PLACEHOLDER, &user_id)
    } else {
        prefix.to_string()
    };

    if prefix.is_empty() || prefix.starts_with('/') {
        Ok(format!("{server_url}{prefix}"))
    } else {
        Ok(format!("{server_url}/{prefix}"))
    }
}

/// The `sub` claim of a JWT, without verifying the signature.
pub fn token_subject(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims
        .get("sub")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}
