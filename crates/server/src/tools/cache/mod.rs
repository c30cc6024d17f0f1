//! Cache inspection tools.
//!
//! Read-only views of the stores the router writes to.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::keys_impl;
