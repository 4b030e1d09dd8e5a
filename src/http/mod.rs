//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layering)
//!     → request.rs (request ID, per-response metrics)
//!     → security middleware (rate limit)
//!     → api handlers (authorize, validate, execute, audit)
//!     → response.rs (uniform success/pagination envelopes)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use response::{Envelope, Pagination};
pub use server::{AppState, Collaborators, HttpServer};
