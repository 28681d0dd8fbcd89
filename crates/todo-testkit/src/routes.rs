use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use todo_core::{Task, UserProfile};

use crate::state::{lock, now, Account, MockState, RecordedRequest};

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, detail: &str) -> ApiError {
    (status, Json(json!({ "detail": detail })))
}

pub fn build_router(state: MockState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/signout", post(signout))
        .route("/api/{user_id}/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/{user_id}/tasks/{task_id}",
            put(update_task).delete(delete_task),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_and_inject))
        .with_state(state)
}

/// Records the request, applies latency, and short-circuits injected faults.
async fn record_and_inject(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        authorization: parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&bytes).ok(),
    };
    let is_task_request = recorded.is_task_request();
    state.record(recorded);

    if let Some(delay) = state.latency() {
        tokio::time::sleep(delay).await;
    }

    if is_task_request {
        if let Some(status) = state.take_fault(parts.method.as_str()) {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return api_error(status, "injected failure").into_response();
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// -- Auth --

#[derive(Debug, Deserialize)]
struct CredentialsBody {
    email: String,
    password: String,
}

async fn signup(
    State(state): State<MockState>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    if body.password.len() < 8 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters",
        ));
    }
    if lock(&state.0.accounts).contains_key(&body.email) {
        return Err(api_error(StatusCode::CONFLICT, "Email already registered"));
    }
    let profile = state.register_user(&body.email, &body.password);
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn signin(
    State(state): State<MockState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let account: Option<Account> = lock(&state.0.accounts).get(&body.email).cloned();
    let account = match account {
        Some(a) if a.password == body.password => a,
        _ => {
            return Err(api_error(
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
            ))
        }
    };
    let user_id = account.profile.id.clone().unwrap_or_default();
    let token = state.issue_token(&user_id, &account.profile.email);
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 24 * 3600,
        "user": account.profile,
    })))
}

async fn signout() -> Json<Value> {
    Json(json!({ "message": "Successfully signed out" }))
}

// -- Tasks --

/// Resolve the bearer token and check it belongs to `user_id`.
fn authorize(state: &MockState, headers: &HeaderMap, user_id: &str) -> Result<(), ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Authentication required"))?;
    let owner = lock(&state.0.tokens)
        .get(token)
        .cloned()
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Invalid token"))?;
    if owner != user_id {
        return Err(api_error(StatusCode::FORBIDDEN, "Access denied"));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() || title.chars().count() > 500 {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "title must be between 1 and 500 characters",
        ));
    }
    Ok(())
}

async fn list_tasks(
    State(state): State<MockState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ApiError> {
    authorize(&state, &headers, &user_id)?;
    Ok(Json(state.tasks_of(&user_id)))
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    title: String,
}

async fn create_task(
    State(state): State<MockState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    authorize(&state, &headers, &user_id)?;
    validate_title(&body.title)?;
    let task = state.seed_task(&user_id, &body.title, false);
    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    title: Option<String>,
    completed: Option<bool>,
}

async fn update_task(
    State(state): State<MockState>,
    Path((user_id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Task>, ApiError> {
    authorize(&state, &headers, &user_id)?;
    if let Some(ref title) = body.title {
        validate_title(title)?;
    }
    let mut tasks = lock(&state.0.tasks);
    let task = tasks
        .iter_mut()
        .find(|t| t.id == task_id && t.user_id == user_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Task not found"))?;
    if let Some(title) = body.title {
        task.title = title;
    }
    if let Some(completed) = body.completed {
        task.completed = completed;
    }
    task.updated_at = now();
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(state): State<MockState>,
    Path((user_id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &headers, &user_id)?;
    let mut tasks = lock(&state.0.tasks);
    let idx = tasks
        .iter()
        .position(|t| t.id == task_id && t.user_id == user_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Task not found"))?;
    tasks.remove(idx);
    Ok(StatusCode::NO_CONTENT)
}
