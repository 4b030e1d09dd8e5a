//! Hospital Financial Management API Library
//!
//! Multi-tenant HTTP JSON API for hospital/health-insurer billing accounts,
//! glosas (claim denials), dashboards, audit trails, and push subscriptions.
//! Every request flows through the same pipeline: rate limit, authorize,
//! validate, execute, audit, respond.

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod security;
pub mod store;

pub use config::AppConfig;
pub use error::ApiError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
