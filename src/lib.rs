//! Web report server lifecycle.
//!
//! Starts the report server, optionally hosts the report scheduler on a
//! dedicated thread, and funnels every shutdown path into one sequence.

pub mod config;
pub mod events;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod repository;
pub mod scheduler;

pub use config::ServerConfig;
pub use host::HostLifetime;
pub use http::HttpServer;
pub use lifecycle::{Lifecycle, LifecycleConfig};
