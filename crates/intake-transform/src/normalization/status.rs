//! Shipment status canonicalization.

use std::collections::BTreeMap;

/// The canonical status vocabulary.
pub const CANONICAL_STATUSES: [&str; 6] = [
    "PENDING",
    "DISPATCHED",
    "IN_TRANSIT",
    "DELIVERED",
    "DELAYED",
    "CANCELLED",
];

const STATUS_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "PENDING",
        &["pending", "booked", "tendered", "available", "open", "planned", "scheduled", "new"],
    ),
    (
        "DISPATCHED",
        &["dispatched", "assigned", "covered", "accepted"],
    ),
    (
        "IN_TRANSIT",
        &[
            "in transit",
            "rolling",
            "en route",
            "on the road",
            "picked up",
            "loaded",
            "moving",
        ],
    ),
    (
        "DELIVERED",
        &["delivered", "complete", "completed", "pod", "unloaded"],
    ),
    (
        "DELAYED",
        &["delayed", "late", "running late", "behind schedule"],
    ),
    (
        "CANCELLED",
        &["cancelled", "canceled", "cancel", "void", "voided", "tonu"],
    ),
];

/// Creates a compact key by keeping only uppercase alphanumeric characters.
fn compact_key(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_uppercase())
        .collect()
}

/// Maps free-text status to the canonical vocabulary.
///
/// Lookup is case-insensitive and ignores punctuation and spacing, so
/// `In-Transit`, `in transit` and `IN_TRANSIT` agree. Unrecognized input is
/// returned trimmed but otherwise unchanged so drift checks can see it.
#[derive(Debug, Clone)]
pub struct StatusCanonicalizer {
    lookup: BTreeMap<String, &'static str>,
}

impl Default for StatusCanonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCanonicalizer {
    pub fn new() -> Self {
        let mut lookup = BTreeMap::new();
        for (canonical, synonyms) in STATUS_SYNONYMS {
            lookup.insert(compact_key(canonical), *canonical);
            for synonym in *synonyms {
                lookup.insert(compact_key(synonym), *canonical);
            }
        }
        Self { lookup }
    }

    /// Canonical token for `raw`, if it is a known status.
    pub fn resolve(&self, raw: &str) -> Option<&'static str> {
        let key = compact_key(raw);
        if key.is_empty() {
            return None;
        }
        self.lookup.get(&key).copied()
    }

    /// Canonical token for `raw`, or `raw` trimmed when unknown.
    pub fn canonicalize(&self, raw: &str) -> String {
        self.resolve(raw)
            .map_or_else(|| raw.trim().to_string(), str::to_string)
    }

    /// True when `value` is exactly one of [`CANONICAL_STATUSES`].
    pub fn is_canonical(value: &str) -> bool {
        CANONICAL_STATUSES.contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonym_clusters_resolve() {
        let canonicalizer = StatusCanonicalizer::new();
        assert_eq!(canonicalizer.canonicalize("rolling"), "IN_TRANSIT");
        assert_eq!(canonicalizer.canonicalize("En Route"), "IN_TRANSIT");
        assert_eq!(canonicalizer.canonicalize("In-Transit"), "IN_TRANSIT");
        assert_eq!(canonicalizer.canonicalize("complete"), "DELIVERED");
        assert_eq!(canonicalizer.canonicalize("canceled"), "CANCELLED");
        assert_eq!(canonicalizer.canonicalize("CANCELLED"), "CANCELLED");
    }

    #[test]
    fn unknown_status_passes_through() {
        let canonicalizer = StatusCanonicalizer::new();
        assert_eq!(canonicalizer.canonicalize("  On Hold "), "On Hold");
        assert_eq!(canonicalizer.resolve("On Hold"), None);
        assert!(!StatusCanonicalizer::is_canonical("On Hold"));
    }

    #[test]
    fn every_canonical_token_maps_to_itself() {
        let canonicalizer = StatusCanonicalizer::new();
        for status in CANONICAL_STATUSES {
            assert_eq!(canonicalizer.canonicalize(status), status);
            assert!(StatusCanonicalizer::is_canonical(status));
        }
    }
}
