use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use todo_core::task::{CreateTask, Task, UpdateTask};
use tracing::debug;

use crate::{ServiceError, TaskApi};

/// Async HTTP client for the task resource.
///
/// `tasks_base` is everything before `/tasks`, e.g.
/// `http://127.0.0.1:8000/api/<user id>`.
pub struct HttpTaskClient {
    tasks_base: String,
    client: Client,
    token: String,
}

impl HttpTaskClient {
    pub fn new(tasks_base: &str, token: String) -> Self {
        let tasks_base = tasks_base.trim_end_matches('/').to_string();
        Self {
            tasks_base,
            client: Client::new(),
            token,
        }
    }

    pub fn tasks_url(&self) -> String {
        format!("{}/tasks", self.tasks_base)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/tasks/{id}", self.tasks_base)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, ServiceError> {
        debug!("GET {url}");
        let resp = self
            .with_auth(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!("POST {url}");
        let resp = self
            .with_auth(self.client.post(url).json(body))
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    async fn put_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!("PUT {url}");
        let resp = self
            .with_auth(self.client.put(url).json(body))
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    async fn delete_req(&self, url: String) -> Result<(), ServiceError> {
        debug!("DELETE {url}");
        let resp = self
            .with_auth(self.client.delete(url))
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

pub(crate) fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport(e.to_string())
}

pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

pub(crate) async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = error_message(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.to_string()
        } else {
            body
        }
    });

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::InvalidInput(msg)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Unauthorized(msg),
        _ => ServiceError::Internal(msg),
    }
}

/// Pull the message out of `{"detail": ...}` or `{"error": ...}` bodies.
fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let field = value.get("detail").or_else(|| value.get("error"))?;
    match field.as_str() {
        Some(s) => Some(s.to_string()),
        None => Some(field.to_string()),
    }
}

#[async_trait]
impl TaskApi for HttpTaskClient {
    async fn list(&self) -> Result<Vec<Task>, ServiceError> {
        self.get_json(self.tasks_url()).await
    }

    async fn create(&self, input: &CreateTask) -> Result<Task, ServiceError> {
        self.post_json(self.tasks_url(), input).await
    }

    async fn update(&self, id: &str, update: &UpdateTask) -> Result<Task, ServiceError> {
        if update.is_empty() {
            return Err(ServiceError::InvalidInput("update has no fields".into()));
        }
        self.put_json(self.task_url(id), update).await
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_req(self.task_url(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let client = HttpTaskClient::new("http://host/api/u1/", "tok".into());
        assert_eq!(client.tasks_url(), "http://host/api/u1/tasks");
        assert_eq!(client.task_url("t9"), "http://host/api/u1/tasks/t9");
    }

    #[test]
    fn error_message_reads_detail_or_error() {
        assert_eq!(
            error_message(r#"{"detail":"Task not found"}"#).as_deref(),
            Some("Task not found")
        );
        assert_eq!(
            error_message(r#"{"error":"missing token"}"#).as_deref(),
            Some("missing token")
        );
        assert_eq!(
            error_message(r#"{"detail":[{"loc":["body","title"]}]}"#).as_deref(),
            Some(r#"[{"loc":["body","title"]}]"#)
        );
        assert_eq!(error_message("plain text"), None);
        assert_eq!(error_message(r#"{"other":1}"#), None);
    }
}
