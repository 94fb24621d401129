//! Unified error system
//!
//! - [`ErrorCode`]: Standardized numeric error codes
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! Order command failures convert into [`AppError`] via `From<CommandError>`.
//!
//! # Example
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", "ord-1");
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(4001));
//! ```

mod category;
mod codes;
mod command;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
