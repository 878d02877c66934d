//! Diagnostic issue types.
//!
//! [`IssueKind`] provides type-safe issue creation where each variant carries
//! only its needed data. Stages push kinds; the response carries the flat
//! [`Issue`] shape produced by [`IssueKind::to_issue`].

use serde::{Deserialize, Serialize};

use crate::field::CanonicalField;

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks overall success.
    Error,
    /// Informational; never blocks success.
    Warn,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warn => "Warning",
        }
    }
}

/// A diagnostic as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    /// Affected rows, 1-based with the header counted as row 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Issue - each variant carries only its needed data.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    // Terminal and structural
    /// No headers or no data rows were supplied.
    NoData,
    /// A required field has no column, direct or split.
    MissingRequiredColumn {
        field: CanonicalField,
        closest_header: Option<String>,
    },
    /// Headers no phase could map; reported once for the whole table.
    NonSchemaHeaders { headers: Vec<String> },
    /// Rows past the configured limit were not analyzed.
    RowsTruncated { analyzed: usize, dropped: usize },

    // Mapping confidence
    /// Several headers qualified equally for a field.
    AmbiguousHeader {
        field: CanonicalField,
        candidates: Vec<String>,
        chosen: String,
    },

    // Per-cell data quality
    EmptyRequiredField {
        field: CanonicalField,
        row: usize,
        column: Option<String>,
    },
    BadDateFormat {
        field: CanonicalField,
        row: usize,
        column: String,
        text: String,
        reason: String,
    },
    DuplicateId {
        id: String,
        row: usize,
        first_row: usize,
    },

    // Normalization side effects
    DateNormalized {
        field: CanonicalField,
        row: usize,
        column: String,
        from: String,
        to: String,
    },

    // Vocabulary drift
    StatusVocabularyDrift {
        distinct: usize,
        threshold: usize,
        unknown: Vec<String>,
        sample: Vec<String>,
    },

    // External suggestions
    SuggestionReview {
        header: String,
        field: String,
        confidence: f64,
        alternatives: Vec<String>,
    },
    SuggestionRejected {
        header: String,
        field: String,
        confidence: f64,
    },
    /// A suggestion naming an unknown header or field, or an out-of-range confidence.
    SuggestionInvalid {
        header: String,
        field: String,
        reason: String,
    },
    SuggestionUnavailable { reason: String },
    SuggestionTimeout { millis: u64 },
    SuggestionUnparseable { reason: String },

    // Final re-check of returned records
    FinalDuplicateId { id: String, occurrences: usize },
    FinalEmptyField { id: String, field: CanonicalField },
    FinalBadTimestamp {
        id: String,
        field: CanonicalField,
        value: String,
    },

    // Terminal
    NoValidRecords { rows_analyzed: usize },
    IssuesTruncated { dropped: usize },
}

impl IssueKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::NoData => "NO_DATA",
            IssueKind::MissingRequiredColumn { .. } => "MISSING_REQUIRED_COLUMN",
            IssueKind::NonSchemaHeaders { .. } => "NON_SCHEMA_HEADERS",
            IssueKind::RowsTruncated { .. } => "ROWS_TRUNCATED",
            IssueKind::AmbiguousHeader { .. } => "AMBIGUOUS_HEADER",
            IssueKind::EmptyRequiredField { .. } => "EMPTY_REQUIRED_FIELD",
            IssueKind::BadDateFormat { .. } => "BAD_DATE_FORMAT",
            IssueKind::DuplicateId { .. } => "DUPLICATE_ID",
            IssueKind::DateNormalized { .. } => "DATE_NORMALIZED",
            IssueKind::StatusVocabularyDrift { .. } => "STATUS_VOCABULARY_DRIFT",
            IssueKind::SuggestionReview { .. } => "SUGGESTION_REVIEW",
            IssueKind::SuggestionRejected { .. } => "SUGGESTION_REJECTED",
            IssueKind::SuggestionInvalid { .. } => "SUGGESTION_INVALID",
            IssueKind::SuggestionUnavailable { .. } => "SUGGESTION_UNAVAILABLE",
            IssueKind::SuggestionTimeout { .. } => "SUGGESTION_TIMEOUT",
            IssueKind::SuggestionUnparseable { .. } => "SUGGESTION_UNPARSEABLE",
            IssueKind::FinalDuplicateId { .. } => "FINAL_DUPLICATE_ID",
            IssueKind::FinalEmptyField { .. } => "FINAL_EMPTY_FIELD",
            IssueKind::FinalBadTimestamp { .. } => "FINAL_BAD_TIMESTAMP",
            IssueKind::NoValidRecords { .. } => "NO_VALID_RECORDS",
            IssueKind::IssuesTruncated { .. } => "ISSUES_TRUNCATED",
        }
    }

    /// Severity for this issue type.
    ///
    /// Normalization side effects and external-capability failures are always
    /// warnings so the pipeline degrades gracefully.
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::NonSchemaHeaders { .. }
            | IssueKind::RowsTruncated { .. }
            | IssueKind::AmbiguousHeader { .. }
            | IssueKind::DateNormalized { .. }
            | IssueKind::StatusVocabularyDrift { .. }
            | IssueKind::SuggestionReview { .. }
            | IssueKind::SuggestionInvalid { .. }
            | IssueKind::SuggestionUnavailable { .. }
            | IssueKind::SuggestionTimeout { .. }
            | IssueKind::SuggestionUnparseable { .. }
            | IssueKind::IssuesTruncated { .. } => Severity::Warn,
            _ => Severity::Error,
        }
    }

    /// Affected rows, 1-based with the header as row 1.
    pub fn rows(&self) -> Option<Vec<usize>> {
        match self {
            IssueKind::EmptyRequiredField { row, .. }
            | IssueKind::BadDateFormat { row, .. }
            | IssueKind::DuplicateId { row, .. }
            | IssueKind::DateNormalized { row, .. } => Some(vec![*row]),
            _ => None,
        }
    }

    /// Column the issue refers to, when it is tied to one.
    pub fn column(&self) -> Option<String> {
        match self {
            IssueKind::EmptyRequiredField { column, .. } => column.clone(),
            IssueKind::BadDateFormat { column, .. } | IssueKind::DateNormalized { column, .. } => {
                Some(column.clone())
            }
            IssueKind::AmbiguousHeader { chosen, .. } => Some(chosen.clone()),
            IssueKind::SuggestionReview { header, .. }
            | IssueKind::SuggestionRejected { header, .. }
            | IssueKind::SuggestionInvalid { header, .. } => Some(header.clone()),
            _ => None,
        }
    }

    /// Remediation hint, when there is a useful one.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            IssueKind::NoData => Some("Supply a header row and at least one data row".to_string()),
            IssueKind::MissingRequiredColumn {
                field,
                closest_header: Some(header),
            } => Some(format!(
                "Header '{header}' looks closest; add an override mapping it to {field}"
            )),
            IssueKind::MissingRequiredColumn { field, .. } => Some(format!(
                "Add a column for {} or supply a header override",
                field.label()
            )),
            IssueKind::NonSchemaHeaders { .. } => {
                Some("Add header overrides if any of these columns should be mapped".to_string())
            }
            IssueKind::AmbiguousHeader { field, .. } => Some(format!(
                "Add a header override for {field} to pick the intended column"
            )),
            IssueKind::EmptyRequiredField { field, .. } => {
                Some(format!("Fill in {} for this row", field.label()))
            }
            IssueKind::BadDateFormat { .. } => Some(
                "Use YYYY-MM-DDTHH:MM:SSZ or a recognizable date such as 09/20/2025 08:00"
                    .to_string(),
            ),
            IssueKind::DuplicateId { first_row, .. } => Some(format!(
                "Load IDs must be unique; first seen on row {first_row}"
            )),
            IssueKind::StatusVocabularyDrift { .. } => Some(
                "Map status values to PENDING, DISPATCHED, IN_TRANSIT, DELIVERED, DELAYED or CANCELLED"
                    .to_string(),
            ),
            IssueKind::SuggestionReview { .. } => {
                Some("Confirm with a header override if the suggestion is right".to_string())
            }
            IssueKind::SuggestionRejected { .. } => {
                Some("Rename the column or add a header override".to_string())
            }
            _ => None,
        }
    }

    /// Format message with issue-specific data.
    pub fn message(&self) -> String {
        match self {
            IssueKind::NoData => "No data supplied".to_string(),
            IssueKind::MissingRequiredColumn { field, .. } => {
                format!("Required column for {} ({}) not found", field.label(), field)
            }
            IssueKind::NonSchemaHeaders { headers } => format!(
                "{} header(s) not part of the shipment schema were ignored: {}",
                headers.len(),
                headers.join(", ")
            ),
            IssueKind::RowsTruncated { analyzed, dropped } => format!(
                "Row limit reached: analyzed {analyzed} row(s), skipped {dropped}"
            ),
            IssueKind::AmbiguousHeader {
                field,
                candidates,
                chosen,
            } => format!(
                "Ambiguous headers for {}: {}; provisionally using '{}'",
                field,
                candidates.join(", "),
                chosen
            ),
            IssueKind::EmptyRequiredField { field, row, .. } => {
                format!("Row {row}: required field {} is empty", field.label())
            }
            IssueKind::BadDateFormat {
                field, row, text, ..
            } => format!(
                "Row {row}: could not parse {} '{}'",
                field.label(),
                text
            ),
            IssueKind::DuplicateId { id, row, .. } => {
                format!("Row {row}: duplicate Load ID '{id}'")
            }
            IssueKind::DateNormalized { row, from, to, .. } => {
                format!("Row {row}: normalized '{from}' to '{to}'")
            }
            IssueKind::StatusVocabularyDrift {
                distinct,
                threshold,
                unknown,
                sample,
            } => {
                let unknown_str = if unknown.is_empty() {
                    String::new()
                } else {
                    format!("; unrecognized: {}", unknown.join(", "))
                };
                format!(
                    "Status vocabulary drift: {distinct} distinct value(s) (threshold {threshold}): {}{}",
                    sample.join(", "),
                    unknown_str
                )
            }
            IssueKind::SuggestionReview {
                header,
                field,
                confidence,
                alternatives,
            } => {
                let alt_str = if alternatives.is_empty() {
                    String::new()
                } else {
                    format!(" (alternatives: {})", alternatives.join(", "))
                };
                format!(
                    "Header '{header}' may be {field} (confidence {confidence:.2}){alt_str}"
                )
            }
            IssueKind::SuggestionRejected {
                header,
                field,
                confidence,
            } => format!(
                "Header '{header}' is unclear: best guess {field} at confidence {confidence:.2}"
            ),
            IssueKind::SuggestionInvalid {
                header,
                field,
                reason,
            } => format!("Ignored suggestion '{header}' -> '{field}': {reason}"),
            IssueKind::SuggestionUnavailable { reason } => {
                format!("Mapping suggestions unavailable: {reason}")
            }
            IssueKind::SuggestionTimeout { millis } => {
                format!("Mapping suggestions timed out after {millis} ms")
            }
            IssueKind::SuggestionUnparseable { reason } => {
                format!("Mapping suggestions could not be parsed: {reason}")
            }
            IssueKind::FinalDuplicateId { id, occurrences } => {
                format!("Load ID '{id}' appears {occurrences} times in the returned records")
            }
            IssueKind::FinalEmptyField { id, field } => {
                format!("Record '{id}' has an empty {}", field.label())
            }
            IssueKind::FinalBadTimestamp { id, field, value } => format!(
                "Record '{id}' has a non-canonical {}: '{value}'",
                field.label()
            ),
            IssueKind::NoValidRecords { rows_analyzed } => {
                format!("No valid records produced from {rows_analyzed} row(s)")
            }
            IssueKind::IssuesTruncated { dropped } => {
                format!("{dropped} further issue(s) omitted")
            }
        }
    }

    /// Flattens into the response shape.
    pub fn to_issue(&self) -> Issue {
        Issue {
            code: self.code().to_string(),
            severity: self.severity(),
            message: self.message(),
            rows: self.rows(),
            column: self.column(),
            suggestion: self.suggestion(),
        }
    }
}

impl From<IssueKind> for Issue {
    fn from(kind: IssueKind) -> Self {
        kind.to_issue()
    }
}
