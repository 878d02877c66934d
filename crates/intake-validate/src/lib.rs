//! Validation stages for shipment intake.
//!
//! - **rows**: per-row extraction, normalization and checks
//! - **final_check**: invariants re-checked on the records actually returned
//! - **aggregate**: ordering, capping and the overall success flag

pub mod aggregate;
pub mod final_check;
pub mod rows;

pub use aggregate::{AggregatedIssues, IssueAggregator};
pub use final_check::FinalValidator;
pub use rows::{RowValidation, RowValidator};
