//! In-process stand-in for the remote task API, for integration tests.
//!
//! Serves the same routes as the real backend (`/api/auth/*` and
//! `/api/{user_id}/tasks[/{id}]`) from memory, records every request, and
//! can be told to fail or slow down specific calls.

mod routes;
mod state;

pub use state::{MockState, RecordedRequest};

use tokio::net::TcpListener;

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub state: MockState,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// `{base_url}/api/{user_id}`, the tasks base for `user_id`.
    pub fn tasks_base(&self, user_id: &str) -> String {
        format!("{}/api/{user_id}", self.base_url)
    }
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let state = MockState::default();
    let app = routes::build_router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}
