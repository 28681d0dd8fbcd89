mod file;
mod memory;
pub mod session;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{Guard, Session};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(String),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}

/// Durable string key-value storage for client-side state.
///
/// Values survive restarts and are only removed explicitly.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never set or has been removed.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Create or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. No-op if absent.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// -- Keys --

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user";

pub const SESSION_FILE: &str = "session.json";

/// `$XDG_DATA_HOME/todo`, falling back to `~/.local/share/todo`.
pub fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("todo")
}
