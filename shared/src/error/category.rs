//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 1xxx: Wedding errors
/// - 2xxx: Guest errors
/// - 3xxx: Table errors
/// - 4xxx: Seating run errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Wedding errors (1xxx)
    Wedding,
    /// Guest, group and preference errors (2xxx)
    Guest,
    /// Table errors (3xxx)
    Table,
    /// Seating run errors (4xxx)
    Seating,
    /// System errors (9xxx and anything unclassified)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Wedding,
            2000..3000 => Self::Guest,
            3000..4000 => Self::Table,
            4000..5000 => Self::Seating,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Wedding => "wedding",
            Self::Guest => "guest",
            Self::Table => "table",
            Self::Seating => "seating",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Wedding);
        assert_eq!(ErrorCategory::from_code(2201), ErrorCategory::Guest);
        assert_eq!(ErrorCategory::from_code(3004), ErrorCategory::Table);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Seating);
        assert_eq!(ErrorCategory::from_code(6000), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::SettingsMissing.category(), ErrorCategory::Wedding);
        assert_eq!(ErrorCode::GroupNotFound.category(), ErrorCategory::Guest);
        assert_eq!(ErrorCode::TableNotFound.category(), ErrorCategory::Table);
        assert_eq!(ErrorCode::RunTimeout.category(), ErrorCategory::Seating);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Seating).unwrap();
        assert_eq!(json, "\"seating\"");

        let category: ErrorCategory = serde_json::from_str("\"table\"").unwrap();
        assert_eq!(category, ErrorCategory::Table);
    }
}
