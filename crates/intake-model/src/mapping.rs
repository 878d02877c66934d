//! Header-to-field mapping types.
//!
//! These types describe how source headers resolve to canonical fields:
//! direct column mappings, fields assembled from a date column plus a time
//! column, unresolved ambiguities, and externally suggested mappings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::CanonicalField;

/// Header text to canonical field.
///
/// A header maps to at most one field, and once mapping completes a field is
/// claimed by at most one entry. Entries for split-sourced datetime fields use
/// the composite key from [`SplitMapping::composite_key`] and do not name a
/// real column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: BTreeMap<String, CanonicalField>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field mapped from `header`, if any.
    pub fn get(&self, header: &str) -> Option<CanonicalField> {
        self.entries.get(header).copied()
    }

    /// Header (or composite key) currently claiming `field`.
    pub fn header_for(&self, field: CanonicalField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, f)| **f == field)
            .map(|(header, _)| header.as_str())
    }

    pub fn contains_field(&self, field: CanonicalField) -> bool {
        self.entries.values().any(|f| *f == field)
    }

    pub fn contains_header(&self, header: &str) -> bool {
        self.entries.contains_key(header)
    }

    /// Inserts without releasing other claims. Used by the phased mapper,
    /// which never offers an already-claimed field or header.
    pub fn insert(&mut self, header: impl Into<String>, field: CanonicalField) {
        self.entries.insert(header.into(), field);
    }

    /// Removes whichever entry claims `field`, returning its header.
    pub fn release_field(&mut self, field: CanonicalField) -> Option<String> {
        let header = self.header_for(field)?.to_string();
        self.entries.remove(&header);
        Some(header)
    }

    /// Assigns `header` to `field`, releasing any previous claim on either.
    ///
    /// Returns the header that previously claimed `field`, if it was a
    /// different one.
    pub fn assign(&mut self, header: &str, field: CanonicalField) -> Option<String> {
        let previous = self.release_field(field);
        self.entries.remove(header);
        self.entries.insert(header.to_string(), field);
        previous.filter(|prev| prev != header)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.entries.iter().map(|(h, f)| (h.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A datetime field sourced from a date column and an optional time column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMapping {
    pub field: CanonicalField,
    pub date_header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_header: Option<String>,
}

impl SplitMapping {
    /// Synthetic key recorded in [`FieldMapping`] for visibility.
    pub fn composite_key(&self) -> String {
        match &self.time_header {
            Some(time) => format!("{} + {}", self.date_header, time),
            None => self.date_header.clone(),
        }
    }

    /// Real headers backing this field.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.date_header.as_str()).chain(self.time_header.as_deref())
    }
}

/// A field with several equally good fuzzy candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambiguity {
    pub field: CanonicalField,
    /// Every qualifying header, in column order.
    pub candidates: Vec<String>,
    /// The provisional pick: shortest candidate, earliest column on ties.
    pub chosen: String,
}

/// How a field ended up mapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    Override,
    Exact,
    Split,
    Fuzzy,
    AmbiguousFallback,
    Suggested { confidence: f64 },
}

impl MatchKind {
    /// Confidence attributed to this kind of match.
    pub fn confidence(&self) -> f64 {
        match self {
            MatchKind::Override | MatchKind::Exact => 1.0,
            MatchKind::Split => 0.9,
            MatchKind::Fuzzy => 0.75,
            MatchKind::AmbiguousFallback => 0.5,
            MatchKind::Suggested { confidence } => *confidence,
        }
    }
}

/// A header-to-field mapping proposed by the external suggestion capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSuggestion {
    pub header: String,
    /// Canonical field key as supplied; validated when merged.
    pub field: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

/// Kind of change recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Mapping,
    Data,
    Format,
}

/// One entry of the change log shown alongside a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub field: CanonicalField,
    pub from: String,
    pub to: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_releases_previous_claims() {
        let mut mapping = FieldMapping::new();
        mapping.insert("Load", CanonicalField::Id);
        mapping.insert("Ref", CanonicalField::VehicleId);

        let previous = mapping.assign("Ref", CanonicalField::Id);

        assert_eq!(previous.as_deref(), Some("Load"));
        assert_eq!(mapping.get("Ref"), Some(CanonicalField::Id));
        assert!(!mapping.contains_header("Load"));
        assert!(!mapping.contains_field(CanonicalField::VehicleId));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn reassigning_same_header_reports_no_previous() {
        let mut mapping = FieldMapping::new();
        mapping.insert("Driver", CanonicalField::OperatorName);
        assert_eq!(mapping.assign("Driver", CanonicalField::OperatorName), None);
    }

    #[test]
    fn composite_key_names_both_columns() {
        let split = SplitMapping {
            field: CanonicalField::OriginTimestamp,
            date_header: "PU Date".to_string(),
            time_header: Some("PU Time".to_string()),
        };
        assert_eq!(split.composite_key(), "PU Date + PU Time");
        assert_eq!(split.headers().collect::<Vec<_>>(), vec!["PU Date", "PU Time"]);
    }
}
