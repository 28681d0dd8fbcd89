pub mod error;
pub mod task;
pub mod user;

pub use error::TodoError;
pub use task::{CreateTask, Task, TaskCounts, UpdateTask};
pub use user::UserProfile;
