//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Connect ledger → Open history → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Flush history → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! In-flight confirmation waits are allowed to finish during the drain; a
//! submitted transaction is never abandoned mid-wait by shutdown.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
