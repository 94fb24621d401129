//! Server configuration, state and startup
//!
//! - [`Config`] - environment configuration
//! - [`ServerState`] - shared handles for HTTP handlers
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup failures

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{CancellationFeePolicy, Config, EngineConfig, PaymentGatewayConfig};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
