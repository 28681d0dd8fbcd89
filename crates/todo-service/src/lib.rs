mod auth;
mod endpoint;
mod http;
mod traits;

pub use auth::{AuthClient, Credentials, SigninResponse};
pub use endpoint::{resolve_tasks_base, token_subject, USER_ID_PLACEHOLDER};
pub use http::HttpTaskClient;
pub use traits::{ServiceError, TaskApi};
