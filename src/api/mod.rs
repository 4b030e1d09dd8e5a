//! HTTP JSON API handlers.
//!
//! # Pipeline per request
//! ```text
//! rate limit (middleware, 429)
//!     → authorize (PermissionChecker, 401/403)
//!     → validate input (400, first offending field)
//!     → execute (store, scoped by organization_id, 500 sanitized)
//!     → side effects (audit write, push fan-out; never gate the response)
//!     → respond ({success: true, data, pagination?})
//! ```

pub mod accounts;
pub mod audit_logs;
pub mod dashboard;
pub mod glosas;
pub mod health;
pub mod notifications;
