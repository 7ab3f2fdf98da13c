//! Auth module: static credentials, their tokens, and token checks.
//!
//! - `registry` provisions one random token per credential into the
//!   `authed_clients` bucket.
//! - `authenticator` answers "is this token registered" and "which token
//!   belongs to these credentials" by scanning that bucket.
//! - `service` wraps both for async callers.

pub mod domain;
pub mod errors;
pub mod registry;
pub mod authenticator;
pub mod service;

pub use service::AuthService;
