//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! request
//!     → server.rs (request ID, trace span, body limit, timeout)
//!     → handlers.rs (extract path/query/headers/body)
//!     → validation.rs (field checks, privateFor header)
//!     → TransactionOrchestrator
//!     → response.rs (GeneralResponse envelope on failure)
//! ```

pub mod handlers;
pub mod response;
pub mod server;
pub mod validation;

pub use response::{ErrorKind, GeneralResponse};
pub use server::{AppState, HttpServer};
