//! # CLI Module
//!
//! User-facing commands. Each command opens the state it needs from the
//! configured state directory, does its work through the management layer
//! and reports with the crate's output macros.
//!
//! ## Command Categories
//!
//! ### Sign-in
//!
//! - [`auth`] - Browser sign-in with the station account (OAuth 2.0 PKCE)
//!
//! ### Likes
//!
//! - [`like`], [`unlike`], [`toggle`] - Change the liked state of an audio
//!   block. Changes are recorded locally and queued; nothing is sent yet.
//! - [`list_likes`] - Table of liked blocks, or the state of a single one
//!
//! ### Queue
//!
//! - [`list_queue`] - Operations waiting for delivery
//! - [`cleanup`] - Drop operations older than seven days
//! - [`sync`] - Deliver the queue to the station
//!
//! ### Listening time
//!
//! - [`listening::show`], [`listening::start`], [`listening::stop`],
//!   [`listening::baseline`]
//!
//! ## Typical session
//!
//! ```bash
//! likesync auth
//! likesync like 3f0c... --title "Song" --artist "Band" --spin 991
//! likesync queue
//! likesync sync
//! ```
//!
//! Fatal problems (unreadable state, missing configuration) end the process
//! through [`crate::error!`]; partial sync failures are reported and left in
//! the queue for the next run.

mod auth;
mod likes;
pub mod listening;
mod queue;
mod sync;

pub use auth::auth;
pub use likes::like;
pub use likes::list_likes;
pub use likes::toggle;
pub use likes::unlike;
pub use queue::cleanup;
pub use queue::list_queue;
pub use sync::sync;
