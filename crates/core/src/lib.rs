//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Request and response snapshot types
//! - Cache store implementation with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, CacheStorage};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Destination, Request, RequestMode};
pub use response::Response;
