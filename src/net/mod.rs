//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → connection.rs (in-flight guard acquired)
//!     → Hand off to HTTP handlers
//!     → guard dropped when the response is produced
//! ```
//!
//! # Design Decisions
//! - The listening socket itself is owned by the HTTP server and closed by
//!   the drain coordinator (see `lifecycle`)
//! - In-flight counts are observed, never enforced

pub mod connection;

pub use connection::{track_in_flight, InFlightTracker};
