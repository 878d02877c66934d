//! Normalization of free-text cell values:
//! - **datetime**: date/time text to canonical UTC timestamps
//! - **status**: free-text shipment status to the canonical vocabulary

pub mod datetime;
pub mod status;

pub use datetime::{
    AssumedZone, DateTimeNormalizer, NormalizeError, NormalizedDateTime, is_canonical_timestamp,
};
pub use status::{CANONICAL_STATUSES, StatusCanonicalizer};
