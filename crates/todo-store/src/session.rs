//! The signed-in session: a bearer credential plus the cached profile.
//!
//! `check` is the gate run before anything touches the task API. It performs
//! no network calls.

use todo_core::UserProfile;
use tracing::warn;

use crate::{KeyValueStore, StoreError, AUTH_TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub profile: Option<UserProfile>,
}

/// Outcome of the session gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// No credential stored. The caller must hand over to sign-in and must
    /// not request any task data.
    SignInRequired,
    Authenticated(Session),
}

/// Read the stored credential and profile.
///
/// A malformed cached profile is dropped rather than reported; the session
/// stays valid without it. An unreadable store file is treated as signed out.
pub fn check(store: &dyn KeyValueStore) -> Result<Guard, StoreError> {
    let token = match store.get(AUTH_TOKEN_KEY) {
        Ok(token) => token,
        Err(StoreError::Corrupt(msg)) => {
            warn!("session store is corrupt, treating as signed out: {msg}");
            return Ok(Guard::SignInRequired);
        }
        Err(e) => return Err(e),
    };

    let token = match token.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(Guard::SignInRequired),
    };

    let profile = match store.get(USER_KEY)? {
        Some(raw) => match UserProfile::parse(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("ignoring cached profile: {e}");
                None
            }
        },
        None => None,
    };

    Ok(Guard::Authenticated(Session { token, profile }))
}

/// Persist a freshly issued credential and its profile.
pub fn save(
    store: &dyn KeyValueStore,
    token: &str,
    profile: Option<&UserProfile>,
) -> Result<(), StoreError> {
    store.set(AUTH_TOKEN_KEY, token)?;
    match profile {
        Some(profile) => store.set(USER_KEY, &profile.to_json()),
        None => store.remove(USER_KEY),
    }
}

/// Destroy the session. Both keys are removed.
pub fn clear(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(AUTH_TOKEN_KEY)?;
    store.remove(USER_KEY)
}
