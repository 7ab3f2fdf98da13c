//! Authenticated bucket operations: put, get and delete.
//!
//! Each operation is one store transaction. Get and delete check that the
//! bucket exists before looking at the token; put creates the bucket and
//! aborts the whole transaction when the token is rejected.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::BucketService;
