use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TodoError;

/// A to-do item as the server returns it.
///
/// The timestamps are kept verbatim: the client never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// The partial update that flips this task's completion flag.
    pub fn toggle_update(&self) -> UpdateTask {
        UpdateTask {
            completed: Some(!self.completed),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
}

impl CreateTask {
    /// Build a create payload from raw user input. Surrounding whitespace is
    /// dropped; a blank title is rejected.
    pub fn new(title: &str) -> Result<Self, TodoError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::InvalidInput("title must not be empty".into()));
        }
        Ok(Self {
            title: title.to_string(),
        })
    }
}

/// Partial update. Fields left as `None` are not sent, so the server keeps
/// their current values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

/// Totals derived from a task collection. Always computed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        Self {
            total: tasks.len(),
            completed: tasks.iter().filter(|t| t.completed).count(),
        }
    }
}

impl fmt::Display for TaskCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.total == 1 { "task" } else { "tasks" };
        write!(
            f,
            "{} {noun} total \u{2022} {} completed",
            self.total, self.completed
        )
    }
}
