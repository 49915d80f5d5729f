//! Configuration management for likesync.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the local data directory. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Required values are reported as [`ConfigError`] rather than panicking so
//! commands that do not need them (listing likes, cleanup) keep working on a
//! fresh install.

use std::{env, path::PathBuf};

/// Directory name used under the platform data directory.
pub const APP_DIR: &str = "likesync";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set (environment or {1})")]
    Missing(&'static str, String),
    #[error("cannot prepare configuration directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the application's root in the platform data directory.
///
/// - Linux: `~/.local/share/likesync`
/// - macOS: `~/Library/Application Support/likesync`
/// - Windows: `%LOCALAPPDATA%/likesync`
pub fn app_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Path of the optional `.env` file.
pub fn env_file() -> PathBuf {
    app_dir().join(".env")
}

/// Loads environment variables from the `.env` file in the application
/// directory.
///
/// Creates the directory if needed. A missing `.env` file is not an error;
/// variables already present in the process environment are never
/// overwritten.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = env_file();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => log::debug!("loaded environment from {}", path.display()),
        Err(e) => log::debug!("no environment file at {}: {}", path.display(), e),
    }
    Ok(())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name, env_file().display().to_string()))
}

/// Directory holding the persisted likes, queue and listening time.
///
/// Reads `LIKESYNC_STATE_DIR`, defaulting to `<app_dir>/state`.
pub fn state_dir() -> PathBuf {
    env::var("LIKESYNC_STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| app_dir().join("state"))
}

/// Path of the persisted sign-in token.
pub fn token_path() -> PathBuf {
    app_dir().join("cache/token.json")
}

/// Base URL of the station API, e.g. `https://api.example-radio.com/v1`.
///
/// Reads `LIKESYNC_API_URL`. Trailing slashes are trimmed.
pub fn api_url() -> Result<String, ConfigError> {
    required("LIKESYNC_API_URL").map(|url| url.trim_end_matches('/').to_string())
}

/// OAuth authorization endpoint the browser is sent to during sign-in.
///
/// Reads `LIKESYNC_AUTH_URL`.
pub fn auth_url() -> Result<String, ConfigError> {
    required("LIKESYNC_AUTH_URL")
}

/// OAuth token endpoint used for code exchange and refresh.
///
/// Reads `LIKESYNC_TOKEN_URL`.
pub fn token_url() -> Result<String, ConfigError> {
    required("LIKESYNC_TOKEN_URL")
}

/// Public client id registered with the account service.
///
/// Reads `LIKESYNC_CLIENT_ID`.
pub fn client_id() -> Result<String, ConfigError> {
    required("LIKESYNC_CLIENT_ID")
}

/// Redirect URI handled by the local callback server.
///
/// Reads `LIKESYNC_REDIRECT_URI`, defaulting to
/// `http://127.0.0.1:8765/callback`.
pub fn redirect_uri() -> String {
    env::var("LIKESYNC_REDIRECT_URI")
        .unwrap_or_else(|_| "http://127.0.0.1:8765/callback".to_string())
}

/// Scopes requested at sign-in.
///
/// Reads `LIKESYNC_SCOPE`, defaulting to `likes`.
pub fn scope() -> String {
    env::var("LIKESYNC_SCOPE").unwrap_or_else(|_| "likes".to_string())
}

/// Bind address of the local callback server.
///
/// Reads `LIKESYNC_SERVER_ADDRESS`, defaulting to `127.0.0.1:8765`.
pub fn server_addr() -> String {
    env::var("LIKESYNC_SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8765".to_string())
}
