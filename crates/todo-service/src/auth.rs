use reqwest::Client;
use serde::{Deserialize, Serialize};
use todo_core::UserProfile;
use tracing::debug;

use crate::http::{handle_response, parse_error, transport_error};
use crate::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Client for the account endpoints under `/api/auth`.
pub struct AuthClient {
    base_url: String,
    client: Client,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth/{path}", self.base_url)
    }

    /// Exchange credentials for a bearer token and the user's profile.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SigninResponse, ServiceError> {
        debug!("POST {}", self.url("signin"));
        let resp = self
            .client
            .post(self.url("signin"))
            .json(credentials)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    /// Register an account. Does not sign in.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<UserProfile, ServiceError> {
        debug!("POST {}", self.url("signup"));
        let resp = self
            .client
            .post(self.url("signup"))
            .json(credentials)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    /// Tell the server the token is no longer in use.
    pub async fn sign_out(&self, token: &str) -> Result<(), ServiceError> {
        debug!("POST {}", self.url("signout"));
        let resp = self
            .client
            .post(self.url("signout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}
