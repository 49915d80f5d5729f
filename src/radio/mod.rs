//! # Station Backend Module
//!
//! Everything that talks to the radio station's servers lives here:
//!
//! - [`likes`] - The likes endpoints the sync worker delivers queued
//!   operations to, plus the failure classification that drives retries.
//! - [`auth`] - Browser based sign-in using OAuth 2.0 with PKCE. The
//!   resulting token is stored by [`crate::management::TokenManager`] and
//!   attached as a bearer token to every likes request.
//!
//! ## Endpoints
//!
//! - `POST {api}/likes` - body `{ "audioBlockId": ..., "spinId": ... }`
//! - `DELETE {api}/likes/{audioBlockId}?spinId=...`
//!
//! ## Failure classes
//!
//! | Response                         | Class          |
//! |----------------------------------|----------------|
//! | 2xx                              | success        |
//! | connect/timeout, 408, 429, 5xx   | `Transient`    |
//! | 401, 403                         | `Unauthorized` |
//! | other 4xx                        | `Permanent`    |
//!
//! A 502 is retried twice inside a single delivery before it is reported.

pub mod auth;
pub mod likes;

pub use likes::ApiError;
pub use likes::HttpLikesApi;
pub use likes::LikesApi;
