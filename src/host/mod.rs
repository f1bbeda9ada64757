//! Host process lifetime.
//!
//! # Data Flow
//! ```text
//! stop_application() (admin request, interrupt handler, server exit)
//!     → stopping callbacks run once, in registration order
//!     → stopping token cancelled
//!     → HTTP server drains and returns
//! ```
//!
//! # Design Decisions
//! - Callbacks complete before the token is cancelled, so teardown never
//!   starts ahead of the shutdown sequence
//! - Only the first stop request does any work

pub mod lifetime;

pub use lifetime::HostLifetime;
