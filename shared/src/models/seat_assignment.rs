//! Seat Assignment Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Assignment partition
///
/// Real and simulation rows never mix: a simulation run can not corrupt the
/// committed seating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    Real,
    Simulation,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Simulation => "simulation",
        }
    }

    /// Storage discriminant
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Real => 0,
            Self::Simulation => 1,
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "real" => Ok(Self::Real),
            "simulation" | "sim" => Ok(Self::Simulation),
            other => Err(format!("unknown assignment type: {}", other)),
        }
    }
}

/// Seat assignment record (座位分配)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub wedding_id: i64,
    pub table_id: i64,
    pub guest_id: i64,
    pub seats_count: i32,
    pub assignment_type: AssignmentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_type_parse() {
        assert_eq!("real".parse::<AssignmentType>(), Ok(AssignmentType::Real));
        assert_eq!("SIM".parse::<AssignmentType>(), Ok(AssignmentType::Simulation));
        assert!("draft".parse::<AssignmentType>().is_err());
    }

    #[test]
    fn test_assignment_type_display() {
        assert_eq!(AssignmentType::Simulation.to_string(), "simulation");
        assert_eq!(AssignmentType::Real.as_u8(), 0);
    }
}
