//! Session commands run outside the TUI: sign in, sign up, sign out, whoami.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use todo_core::UserProfile;
use todo_service::{AuthClient, Credentials};
use todo_store::session::{self, Guard, Session};
use todo_store::KeyValueStore;
use tracing::{info, warn};

/// Exchange credentials for a token and store the session.
pub async fn sign_in(
    store: &dyn KeyValueStore,
    server_url: &str,
    credentials: &Credentials,
) -> Result<UserProfile> {
    let auth = AuthClient::new(server_url);
    let resp = auth.sign_in(credentials).await.context("sign-in failed")?;
    session::save(store, &resp.access_token, Some(&resp.user))
        .context("failed to store session")?;
    info!(email = %resp.user.email, "signed in");
    Ok(resp.user)
}

/// Register, then sign in with the same credentials.
pub async fn sign_up(
    store: &dyn KeyValueStore,
    server_url: &str,
    credentials: &Credentials,
) -> Result<UserProfile> {
    let auth = AuthClient::new(server_url);
    let profile = auth.sign_up(credentials).await.context("sign-up failed")?;
    info!(email = %profile.email, "account created");
    sign_in(store, server_url, credentials).await
}

/// Forget the stored session. The server is told about it on a best-effort
/// basis; the local session is cleared either way.
pub async fn sign_out(store: &dyn KeyValueStore, server_url: &str) -> Result<()> {
    let token = match session::check(store).context("failed to read session store")? {
        Guard::Authenticated(session) => Some(session.token),
        Guard::SignInRequired => None,
    };
    session::clear(store).context("failed to clear session")?;

    if let Some(token) = token {
        if let Err(e) = AuthClient::new(server_url).sign_out(&token).await {
            warn!("server sign-out failed: {e}");
        }
        info!("signed out");
    }
    Ok(())
}

pub const PASSWORD_PROMPT: &str = "Password (input is echoed): ";

/// Prompt on `out` and read one line from `input`. Terminal echo is left on.
pub fn read_password(input: &mut impl BufRead, out: &mut impl Write) -> Result<String> {
    write!(out, "{PASSWORD_PROMPT}")?;
    out.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// The stored session, if any. No network access.
pub fn whoami(store: &dyn KeyValueStore) -> Result<Option<Session>> {
    match session::check(store).context("failed to read session store")? {
        Guard::Authenticated(session) => Ok(Some(session)),
        Guard::SignInRequired => Ok(None),
    }
}
