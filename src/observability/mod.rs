//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; subscriber initialized in main
//! - Prometheus metrics exposed on a side port, gated by config
//! - Counters only: the pipeline's interesting failures are discrete
//!   events (rate-limited, denied, audit-dropped), not distributions

pub mod metrics;
