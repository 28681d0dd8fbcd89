use todo_core::{Task, TaskCounts};
use todo_service::ServiceError;

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load tasks. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    ReadyWithError(String),
}

/// Owner of the task collection shown on screen.
///
/// The collection only changes when a fetch result is applied, and a
/// successful fetch replaces it wholesale.
#[derive(Debug, Default)]
pub struct PageController {
    tasks: Vec<Task>,
    pending_fetches: usize,
    error: Option<String>,
}

impl PageController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a fetch was issued. Clears any previous load error.
    pub fn begin_fetch(&mut self) {
        self.pending_fetches += 1;
        self.error = None;
    }

    /// Apply a fetch result. Results are applied in completion order.
    pub fn finish_fetch(&mut self, result: Result<Vec<Task>, ServiceError>) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
        match result {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
            }
            Err(_) => self.error = Some(LOAD_ERROR_MESSAGE.to_string()),
        }
    }

    pub fn state(&self) -> LoadState {
        if self.pending_fetches > 0 {
            LoadState::Loading
        } else if let Some(ref msg) = self.error {
            LoadState::ReadyWithError(msg.clone())
        } else {
            LoadState::Ready
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending_fetches > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::of(&self.tasks)
    }
}
