//! Lifecycle coordination.
//!
//! # Responsibilities
//! - Graceful shutdown signal fan-out
//! - OS signal handling (SIGTERM, ctrl-c)

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
