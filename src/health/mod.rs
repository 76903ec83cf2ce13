//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → reporter.rs
//!         draining?      → 503 "Shutting down"
//!         store.ping()   → 200 "OK" | 503 "Database connection failed"
//! ```
//!
//! # Design Decisions
//! - The shutdown flag is checked before touching the store
//! - The probe is bounded by a timeout so a hung database cannot stall probes
//! - Failures are logged and reported, never retried

pub mod reporter;

pub use reporter::{HealthReport, HealthReporter};
