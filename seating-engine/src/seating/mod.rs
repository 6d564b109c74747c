//! Seating engine core
//!
//! - [`ConstraintBuilder`] turns guests, groups and preferences into a
//!   [`ConstraintGraph`] of must-together clusters
//! - [`PlacementSolver`] places clusters onto tables
//! - [`SeatingStorage`] persists inputs, assignment partitions and run logs
//!   in redb
//!
//! # Run pipeline
//!
//! ```text
//! WeddingData ──► ConstraintBuilder ──► ConstraintGraph
//!                        │                     │
//!                        ▼                     ▼
//!                 ConflictReporter ◄── PlacementSolver ──► Placement
//!                        │                                     │
//!                        └──────────► RunCommit ◄──────────────┘
//! ```

pub mod conflicts;
pub mod constraints;
pub mod context;
pub mod kids;
pub mod reconcile;
pub mod solver;
pub mod storage;
pub mod union_find;

pub use conflicts::ConflictReporter;
pub use constraints::{ClusterId, ConstraintBuilder, ConstraintGraph};
pub use context::{RunContext, WeddingData};
pub use kids::KidsTablePolicy;
pub use solver::{Placement, PlacementSolver, TableAllocator};
pub use storage::{RunCommit, SeatingStorage, StorageError, StorageResult};
