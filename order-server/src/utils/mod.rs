//! Utilities
//!
//! - [`error`] - engine errors to [`AppError`] / HTTP status
//! - [`logger`] - tracing setup and log retention

pub mod error;
pub mod logger;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, command_result, ok};
