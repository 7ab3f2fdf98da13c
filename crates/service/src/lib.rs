//! Service layer: credential provisioning, token checks and bucket
//! operations on top of the `store` crate.
//! - Independent of the web framework; handlers in `server` only translate.
//! - Every store transaction runs on the blocking pool and never spans an
//!   await point.

pub mod errors;
pub mod auth;
pub mod buckets;
pub mod backup;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
