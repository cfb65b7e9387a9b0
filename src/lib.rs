//! Token wallet backend for a permissioned Quorum ledger.

// Core subsystems
pub mod ledger;
pub mod token;
pub mod orchestrator;
pub mod history;
pub mod api;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use api::HttpServer;
pub use config::WalletConfig;
pub use lifecycle::Shutdown;
pub use orchestrator::TransactionOrchestrator;
