//! Client side of shellcache.
//!
//! This crate provides the network fetch pipeline, the request router with its
//! caching strategies, and the lifecycle controller that installs and
//! activates cache generations.

pub mod fetch;
pub mod lifecycle;
pub mod router;

#[cfg(test)]
mod testing;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{
    ActivationReport, ControlMessage, Host, InstallReport, LifecycleController, LifecycleState, MessageOutcome,
    ReconcileReport,
};
pub use router::{CacheEvent, Class, Handled, Router, RouterConfig, Served, Source, Strategy};
