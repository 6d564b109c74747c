//! Data models
//!
//! Records supplied by the guest, table, settings and preference surfaces,
//! plus the records the seating engine produces. All IDs are `i64`.

pub mod guest;
pub mod guest_group;
pub mod seat_assignment;
pub mod seating_conflict;
pub mod seating_preference;
pub mod seating_run;
pub mod seating_settings;
pub mod seating_table;
pub mod table_adjacency;
pub mod wedding;

// Re-exports
pub use guest::*;
pub use guest_group::*;
pub use seat_assignment::*;
pub use seating_conflict::*;
pub use seating_preference::*;
pub use seating_run::*;
pub use seating_settings::*;
pub use seating_table::*;
pub use table_adjacency::*;
pub use wedding::*;
