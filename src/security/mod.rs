//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (fixed-window check, keyed by route + client)
//!     → rbac.rs (session → membership → capability)
//!     → handler executes, tenant-scoped
//!     → pii.rs (mask outbound national IDs unless entitled)
//! ```
//!
//! # Design Decisions
//! - Rate limiting always precedes auth: the cheap check rejects first
//! - RBAC fails closed: unknown role or capability means deny
//! - The limiter fails open when its counter store is unreachable; the
//!   limiter is an abuse brake, not an authorization control

pub mod pii;
pub mod rate_limit;
pub mod rbac;
