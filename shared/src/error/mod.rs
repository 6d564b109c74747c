//! Unified error system for the seating engine
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified response envelope
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Wedding errors
//! - 2xxx: Guest errors
//! - 3xxx: Table errors
//! - 4xxx: Seating run errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::with_message(ErrorCode::TableNotFound, "Table 9 not found")
//!     .with_detail("table_id", 9);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(3001));
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
