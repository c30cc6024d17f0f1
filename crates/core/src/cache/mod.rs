//! SQLite-backed cache stores.
//!
//! This module provides the durable store capability the router consumes,
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named stores created on demand and dropped as a whole
//! - Entries keyed by SHA-256 of request method and URL
//! - All-or-nothing bulk population
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::CacheStorage;
