//! Shared types for the wedding seating engine
//!
//! Domain records exchanged with guest, table, settings and preference
//! surfaces, plus the unified error and response types.

pub mod error;
pub mod models;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
