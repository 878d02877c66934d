//! Value normalization for shipment extracts.

pub mod normalization;

pub use normalization::{
    AssumedZone, CANONICAL_STATUSES, DateTimeNormalizer, NormalizeError, NormalizedDateTime,
    StatusCanonicalizer, is_canonical_timestamp,
};
