//! HTTP host.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → health.rs (status JSON)
//! ```

pub mod health;
pub mod server;

pub use server::{AppState, HttpServer};
