//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Open store → Bootstrap schema → Bind listener → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM → ShutdownRequest::Graceful
//!     SIGINT  → ShutdownRequest::Immediate
//!
//! Shutdown (shutdown.rs):
//!     Running ──Graceful──▶ Draining ──drain window──▶ Closed
//!        └──────────Immediate──────────────────────────▲
//!     Closed → server stops accepting → open connections finish → exit 0
//! ```
//!
//! # Design Decisions
//! - Health flips before the listener closes so the balancer can react first
//! - The listener keeps accepting during the whole drain window
//! - Immediate shutdown skips draining and leaves health untouched

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{CloseSignal, DrainCoordinator, Phase, ShutdownRequest, ShutdownState};
pub use signals::forward_signals;
pub use startup::{Service, SHUTDOWN_CHANNEL_CAPACITY};
