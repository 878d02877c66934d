use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, Severity};
use crate::mapping::{Ambiguity, ChangeRecord, FieldMapping, SplitMapping};
use crate::options::RequestOptions;
use crate::record::ShipmentRecord;
use crate::table::RawTable;

/// A logical intake request, already authenticated and decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeRequest {
    #[serde(flatten)]
    pub table: RawTable,
    /// Header text to canonical field key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub options: RequestOptions,
    /// Canonical field key to additional synonym phrases.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_synonyms: BTreeMap<String, Vec<String>>,
}

impl IntakeRequest {
    pub fn new(table: RawTable) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    pub fn with_override(mut self, header: impl Into<String>, field: impl Into<String>) -> Self {
        self.overrides.insert(header.into(), field.into());
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingMeta {
    pub splits: Vec<SplitMapping>,
    pub ambiguities: Vec<Ambiguity>,
    pub unmapped_headers: Vec<String>,
    pub suggestions_applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub rows_analyzed: usize,
    pub blank_rows_skipped: usize,
    pub rows_truncated: usize,
    pub records_emitted: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub issues_dropped: usize,
    /// Canonical UTC time the response was produced.
    pub generated_at: String,
    /// Mean confidence over mapped fields; absent when nothing mapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_average: Option<f64>,
    pub suggestions_applied: bool,
}

/// Result of one intake invocation.
///
/// `records` is present only when `success` is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeResponse {
    pub success: bool,
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<ShipmentRecord>>,
    pub mapping: FieldMapping,
    pub mapping_meta: MappingMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeRecord>,
    pub meta: RunMeta,
}

impl IntakeResponse {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warn)
            .count()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    pub fn issues_with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |issue| issue.code == code)
    }

    pub fn record_count(&self) -> usize {
        self.records.as_ref().map_or(0, Vec::len)
    }
}
