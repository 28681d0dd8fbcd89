use std::sync::Arc;

use anyhow::{Context, Result};
use todo_service::{resolve_tasks_base, HttpTaskClient, ServiceError, TaskApi};
use todo_store::session::{self, Guard};
use todo_store::KeyValueStore;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::app::App;

/// Where the task API lives.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub server_url: String,
    pub api_prefix: String,
}

pub enum Launch {
    /// No usable session. Nothing was requested from the server.
    SignInRequired,
    Ready(Box<App>),
}

/// Run the session gate and, when it passes, build the page. The page
/// starts loading immediately.
pub fn launch(store: &dyn KeyValueStore, settings: &ApiSettings, runtime: Handle) -> Result<Launch> {
    let session = match session::check(store).context("failed to read session store")? {
        Guard::SignInRequired => {
            info!("no stored credential");
            return Ok(Launch::SignInRequired);
        }
        Guard::Authenticated(session) => session,
    };

    let profile_id = session.profile.as_ref().and_then(|p| p.id.as_deref());
    let base = match resolve_tasks_base(
        &settings.server_url,
        &settings.api_prefix,
        profile_id,
        &session.token,
    ) {
        Ok(base) => base,
        Err(ServiceError::Unauthorized(msg)) => {
            warn!("{msg}");
            return Ok(Launch::SignInRequired);
        }
        Err(e) => return Err(e).context("failed to resolve task endpoint"),
    };
    info!(tasks_base = %base, "session found");

    let api: Arc<dyn TaskApi> = Arc::new(HttpTaskClient::new(&base, session.token));
    Ok(Launch::Ready(Box::new(App::new(api, session.profile, runtime))))
}
