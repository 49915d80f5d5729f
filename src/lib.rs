//! Radio Likes Sync Library
//!
//! Local-first likes for a radio streaming client. Likes and unlikes are
//! applied to a local index immediately and recorded in a persisted outbox;
//! a sync pass later delivers the outbox to the station backend with bounded
//! retries and expiry.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local sign-in callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `management` - Persistent state: likes, listening time, tokens
//! - `radio` - Station backend client and sign-in flow
//! - `server` - Local HTTP server for OAuth callbacks
//! - `sync` - Outbox delivery worker
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use likesync::management::{LikesManager, MemoryStore};
//! use likesync::types::AudioBlock;
//!
//! #[tokio::main]
//! async fn main() -> likesync::Res<()> {
//!     let mut likes = LikesManager::open(MemoryStore::new()).await?;
//!     likes.like(AudioBlock::new(uuid::Uuid::new_v4(), "Song", "Band"), None).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod management;
pub mod radio;
pub mod server;
pub mod sync;
pub mod types;
pub mod utils;

/// Result alias used at command boundaries, where errors from several
/// layers (configuration, storage, HTTP) meet and are only reported.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a status line prefixed with a blue `o`.
///
/// ```
/// info!("{} operation(s) waiting to sync", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a line prefixed with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line to stderr and exits with status 1.
///
/// Only for failures the command cannot continue from. The expansion
/// diverges, so it can stand in for a value in a `match` arm:
///
/// ```
/// let likes = match LikesManager::open(store).await {
///     Ok(likes) => likes,
///     Err(e) => error!("Cannot load likes. Err: {}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a line prefixed with a yellow `!` for recoverable problems.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
