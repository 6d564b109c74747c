//! Unified error codes for the seating engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Wedding errors
//! - 2xxx: Guest errors
//! - 3xxx: Table errors
//! - 4xxx: Seating run errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,

    // ==================== 1xxx: Wedding ====================
    /// Wedding not found
    WeddingNotFound = 1001,
    /// Seating settings missing for the wedding
    SettingsMissing = 1002,

    // ==================== 2xxx: Guest ====================
    /// Guest not found
    GuestNotFound = 2001,
    /// Guest is still referenced by seat assignments
    GuestHasAssignments = 2002,
    /// Guest group not found
    GroupNotFound = 2101,

    // ==================== 3xxx: Table ====================
    /// Table not found
    TableNotFound = 3001,
    /// Table number already used in this wedding
    TableNumberExists = 3002,
    /// Table is still referenced by seat assignments
    TableHasAssignments = 3003,
    /// Table capacity would be exceeded
    TableCapacityExceeded = 3004,

    // ==================== 4xxx: Seating run ====================
    /// Another run for the same wedding partition is in flight
    RunInProgress = 4001,
    /// Simulation runs are disabled for this wedding
    SimulationDisabled = 4002,
    /// Real runs are not allowed while seating is in manual mode
    ManualModeActive = 4003,
    /// Run did not finish within the orchestration timeout
    RunTimeout = 4004,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",

            // Wedding
            ErrorCode::WeddingNotFound => "Wedding not found",
            ErrorCode::SettingsMissing => "Seating settings are missing for this wedding",

            // Guest
            ErrorCode::GuestNotFound => "Guest not found",
            ErrorCode::GuestHasAssignments => "Guest still has seat assignments",
            ErrorCode::GroupNotFound => "Guest group not found",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNumberExists => "Table number already exists",
            ErrorCode::TableHasAssignments => "Table still has seat assignments",
            ErrorCode::TableCapacityExceeded => "Table capacity exceeded",

            // Seating run
            ErrorCode::RunInProgress => "A seating run is already in progress",
            ErrorCode::SimulationDisabled => "Simulation runs are disabled",
            ErrorCode::ManualModeActive => "Seating is in manual mode",
            ErrorCode::RunTimeout => "Seating run timed out",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),

            // Wedding
            1001 => Ok(ErrorCode::WeddingNotFound),
            1002 => Ok(ErrorCode::SettingsMissing),

            // Guest
            2001 => Ok(ErrorCode::GuestNotFound),
            2002 => Ok(ErrorCode::GuestHasAssignments),
            2101 => Ok(ErrorCode::GroupNotFound),

            // Table
            3001 => Ok(ErrorCode::TableNotFound),
            3002 => Ok(ErrorCode::TableNumberExists),
            3003 => Ok(ErrorCode::TableHasAssignments),
            3004 => Ok(ErrorCode::TableCapacityExceeded),

            // Seating run
            4001 => Ok(ErrorCode::RunInProgress),
            4002 => Ok(ErrorCode::SimulationDisabled),
            4003 => Ok(ErrorCode::ManualModeActive),
            4004 => Ok(ErrorCode::RunTimeout),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::WeddingNotFound.code(), 1001);
        assert_eq!(ErrorCode::GuestHasAssignments.code(), 2002);
        assert_eq!(ErrorCode::TableCapacityExceeded.code(), 3004);
        assert_eq!(ErrorCode::RunInProgress.code(), 4001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::RunInProgress.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(1002), Ok(ErrorCode::SettingsMissing));
        assert_eq!(ErrorCode::try_from(4003), Ok(ErrorCode::ManualModeActive));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
    }

    #[test]
    fn test_try_from_rejects_unassigned_codes() {
        for value in [2, 3, 4, 5, 2201, 9005] {
            assert_eq!(ErrorCode::try_from(value), Err(InvalidErrorCode(value)));
        }
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::TableNotFound).unwrap();
        assert_eq!(json, "3001");
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("65000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::RunInProgress.to_string(), "E4001");
        assert_eq!(ErrorCode::Success.to_string(), "E0000");
    }

    #[test]
    fn test_invalid_error_code_display() {
        assert_eq!(InvalidErrorCode(42).to_string(), "invalid error code: 42");
    }
}
