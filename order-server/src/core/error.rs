use thiserror::Error;

use crate::orders::ManagerError;
use crate::payment::GatewayError;

/// Startup and serve-loop failures
///
/// Request-level failures are `AppError`s; these only stop the process.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to prepare work directory: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("Failed to open order database: {0}")]
    Database(#[from] ManagerError),

    #[error("Payment gateway client: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
