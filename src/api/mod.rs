//! # Callback API
//!
//! HTTP endpoints served by the short-lived local server that runs while a
//! user signs in.
//!
//! - [`callback`] - Receives the authorization code from the account service
//!   and exchanges it, together with the PKCE verifier kept in shared state,
//!   for an access token.
//! - [`health`] - Reports service name and version; useful to check that the
//!   redirect URI actually reaches this process.
//!
//! ```rust,ignore
//! use likesync::server::router;
//!
//! let app = router(shared_state);
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
