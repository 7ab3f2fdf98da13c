pub mod env;
pub mod observability;
pub mod types;
pub mod utils;
