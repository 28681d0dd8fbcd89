use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use todo_store::{default_data_dir, SESSION_FILE};

#[derive(Debug, Parser)]
#[command(name = "todo", about = "Terminal client for the todo task API")]
pub struct Config {
    /// Server URL
    #[arg(long, env = "TODO_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    pub server_url: String,

    /// Path prefix of the task resource. `{user_id}` is replaced with the
    /// signed-in user's id.
    #[arg(long, env = "TODO_API_PREFIX", default_value = "/api/{user_id}")]
    pub api_prefix: String,

    /// Directory holding the session file and the log
    #[arg(long, env = "TODO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "TODO_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Signin(CredentialArgs),
    /// Create an account, then sign in
    Signup(CredentialArgs),
    /// Forget the stored session
    Signout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Debug, Args)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,

    /// Read from stdin when not given; the prompt echoes what is typed
    #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join(SESSION_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("todo.log")
    }
}
