//! Compliance audit trail.
//!
//! # Data Flow
//! ```text
//! handler
//!     → AuditLogger::record / record_read (never blocks, never errors)
//!     → unbounded channel
//!     → detached writer task
//!     → Database::insert_audit_entry (append-only)
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: a failed audit write is logged and swallowed, it
//!   never gates or fails the originating request
//! - An unprovisioned audit table is a soft no-op, not an error, so
//!   first-run and dev environments work before the schema lands
//! - Read entries carry whether PII was in the record set and how many
//!   records were returned, for access-volume compliance reporting

pub mod entry;
pub mod logger;

pub use entry::AuditEntry;
pub use logger::AuditLogger;
