use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use todo_core::{Task, UserProfile};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    pub fn is_task_request(&self) -> bool {
        self.path.contains("/tasks")
    }
}

#[derive(Debug, Clone)]
struct Fault {
    method: String,
    status: u16,
    /// `None` keeps failing until cleared.
    remaining: Option<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub profile: UserProfile,
    pub password: String,
}

#[derive(Default)]
pub(crate) struct Inner {
    pub accounts: Mutex<HashMap<String, Account>>,
    pub tokens: Mutex<HashMap<String, String>>,
    pub tasks: Mutex<Vec<Task>>,
    requests: Mutex<Vec<RecordedRequest>>,
    faults: Mutex<Vec<Fault>>,
    latency: Mutex<Option<Duration>>,
}

/// Shared handle on the mock server's data. Cloning is cheap.
#[derive(Clone, Default)]
pub struct MockState(pub(crate) Arc<Inner>);

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn now() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

impl MockState {
    // -- Seeding --

    /// Create an account directly, bypassing `/api/auth/signup`.
    pub fn register_user(&self, email: &str, password: &str) -> UserProfile {
        let profile = UserProfile {
            email: email.to_string(),
            id: Some(uuid::Uuid::new_v4().to_string()),
            created_at: Some(now()),
        };
        lock(&self.0.accounts).insert(
            email.to_string(),
            Account {
                profile: profile.clone(),
                password: password.to_string(),
            },
        );
        profile
    }

    /// Issue a JWT-shaped bearer token for `user_id`. The signature part is
    /// random; the server only checks that it issued the token.
    pub fn issue_token(&self, user_id: &str, email: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = serde_json::json!({ "sub": user_id, "email": email });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let token = format!("{header}.{payload}.{}", uuid::Uuid::new_v4().simple());
        lock(&self.0.tokens).insert(token.clone(), user_id.to_string());
        token
    }

    /// Register a user and issue a token. Returns (profile, token).
    pub fn signed_in_user(&self, email: &str) -> (UserProfile, String) {
        let profile = self.register_user(email, "password123");
        let user_id = profile.id.clone().unwrap_or_default();
        let token = self.issue_token(&user_id, email);
        (profile, token)
    }

    pub fn seed_task(&self, user_id: &str, title: &str, completed: bool) -> Task {
        let ts = now();
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            completed,
            created_at: ts.clone(),
            updated_at: ts,
        };
        lock(&self.0.tasks).push(task.clone());
        task
    }

    pub fn tasks_of(&self, user_id: &str) -> Vec<Task> {
        lock(&self.0.tasks)
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Replace a stored task's fields behind the client's back.
    pub fn set_completed(&self, task_id: &str, completed: bool) {
        if let Some(task) = lock(&self.0.tasks).iter_mut().find(|t| t.id == task_id) {
            task.completed = completed;
            task.updated_at = now();
        }
    }

    // -- Inspection --

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.0.requests).clone()
    }

    pub fn task_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(RecordedRequest::is_task_request)
            .collect()
    }

    pub fn count_task_requests(&self, method: &str) -> usize {
        self.task_requests()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub(crate) fn record(&self, request: RecordedRequest) {
        lock(&self.0.requests).push(request);
    }

    // -- Fault injection (task routes only) --

    /// Make the next task request with this method fail with `status`.
    pub fn fail_next(&self, method: &str, status: u16) {
        self.push_fault(method, status, Some(1));
    }

    /// Fail every task request with this method until `clear_faults`.
    pub fn fail_always(&self, method: &str, status: u16) {
        self.push_fault(method, status, None);
    }

    pub fn clear_faults(&self) {
        lock(&self.0.faults).clear();
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.0.latency) = latency;
    }

    pub(crate) fn latency(&self) -> Option<Duration> {
        *lock(&self.0.latency)
    }

    fn push_fault(&self, method: &str, status: u16, remaining: Option<usize>) {
        lock(&self.0.faults).push(Fault {
            method: method.to_ascii_uppercase(),
            status,
            remaining,
        });
    }

    /// Consume a matching fault, returning the status to fail with.
    pub(crate) fn take_fault(&self, method: &str) -> Option<u16> {
        let mut faults = lock(&self.0.faults);
        let idx = faults.iter().position(|f| f.method == method)?;
        let status = faults[idx].status;
        if let Some(remaining) = faults[idx].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(idx);
            }
        }
        Some(status)
    }
}
