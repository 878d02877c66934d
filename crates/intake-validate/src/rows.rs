//! Per-row extraction and validation.
//!
//! Walks every analyzed row once: extracts mapped fields, normalizes
//! timestamps and status, then checks required fields and id uniqueness.
//! A record is emitted only for rows with no error-severity issue and a
//! non-empty id.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use intake_map::MappingOutcome;
use intake_model::{
    CanonicalField, CellValue, ChangeKind, ChangeRecord, IssueKind, Severity, ShipmentRecord,
};
use intake_transform::{DateTimeNormalizer, StatusCanonicalizer};
use tracing::{debug, info};

/// Maximum distinct statuses listed in a drift warning.
const DRIFT_SAMPLE_MAX: usize = 10;

/// Where a field's value comes from in each row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Column { index: usize, label: String },
    Split {
        date: usize,
        time: Option<usize>,
        label: String,
    },
    Absent,
}

impl Source {
    fn label(&self) -> Option<&str> {
        match self {
            Source::Column { label, .. } | Source::Split { label, .. } => Some(label),
            Source::Absent => None,
        }
    }
}

/// Output of [`RowValidator::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowValidation {
    pub records: Vec<ShipmentRecord>,
    pub issues: Vec<IssueKind>,
    pub changes: Vec<ChangeRecord>,
    /// Source values per analyzed row number, before normalization.
    pub originals: BTreeMap<usize, BTreeMap<CanonicalField, String>>,
    /// Distinct canonicalized statuses, in first-seen order.
    pub statuses: Vec<String>,
    pub rows_analyzed: usize,
    pub blank_rows_skipped: usize,
}

/// Validates rows against a resolved mapping.
pub struct RowValidator<'a> {
    outcome: &'a MappingOutcome,
    normalizer: &'a DateTimeNormalizer,
    canonicalizer: &'a StatusCanonicalizer,
    drift_threshold: usize,
}

impl<'a> RowValidator<'a> {
    pub fn new(
        outcome: &'a MappingOutcome,
        normalizer: &'a DateTimeNormalizer,
        canonicalizer: &'a StatusCanonicalizer,
    ) -> Self {
        Self {
            outcome,
            normalizer,
            canonicalizer,
            drift_threshold: 5,
        }
    }

    /// More distinct statuses than `threshold` raises a drift warning.
    pub fn with_drift_threshold(mut self, threshold: usize) -> Self {
        self.drift_threshold = threshold;
        self
    }

    fn resolve_sources(&self, headers: &[String]) -> BTreeMap<CanonicalField, Source> {
        let position = |header: &str| headers.iter().position(|h| h == header);
        CanonicalField::ALL
            .into_iter()
            .map(|field| {
                let source = if let Some(split) = self.outcome.split_for(field) {
                    match position(&split.date_header) {
                        Some(date) => Source::Split {
                            date,
                            time: split.time_header.as_deref().and_then(position),
                            label: split.composite_key(),
                        },
                        None => Source::Absent,
                    }
                } else {
                    self.outcome
                        .mapping
                        .header_for(field)
                        .and_then(|header| {
                            position(header).map(|index| Source::Column {
                                index,
                                label: header.to_string(),
                            })
                        })
                        .unwrap_or(Source::Absent)
                };
                (field, source)
            })
            .collect()
    }

    /// Validates `rows` laid out under `headers`.
    pub fn validate(&self, headers: &[String], rows: &[Vec<CellValue>]) -> RowValidation {
        let sources = self.resolve_sources(headers);
        let mut result = RowValidation::default();
        let mut seen_ids: HashMap<String, usize> = HashMap::new();
        let mut seen_statuses: BTreeSet<String> = BTreeSet::new();

        for (index, cells) in rows.iter().enumerate() {
            // Header is row 1.
            let row = index + 2;
            if cells.iter().all(CellValue::is_blank) {
                result.blank_rows_skipped += 1;
                continue;
            }
            result.rows_analyzed += 1;

            let text = |column: usize| {
                cells
                    .get(column)
                    .map(CellValue::as_text)
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            };

            let mut record = ShipmentRecord::default();
            let mut originals = BTreeMap::new();
            let mut row_issues: Vec<IssueKind> = Vec::new();
            let mut bad_dates: BTreeSet<CanonicalField> = BTreeSet::new();

            for (field, source) in &sources {
                let field = *field;
                let (raw, time) = match source {
                    Source::Column { index, .. } => (text(*index), None),
                    Source::Split { date, time, .. } => {
                        (text(*date), time.map(text).filter(|t| !t.is_empty()))
                    }
                    Source::Absent => continue,
                };
                let original = match &time {
                    Some(time) if !raw.is_empty() => format!("{raw} {time}"),
                    _ => raw.clone(),
                };
                originals.insert(field, original.clone());

                if field.is_datetime() {
                    if raw.is_empty() {
                        continue;
                    }
                    let label = source.label().unwrap_or(field.as_str()).to_string();
                    match self.normalizer.normalize(&raw, time.as_deref()) {
                        Ok(parsed) => {
                            if parsed.normalized {
                                row_issues.push(IssueKind::DateNormalized {
                                    field,
                                    row,
                                    column: label,
                                    from: original.clone(),
                                    to: parsed.canonical.clone(),
                                });
                                result.changes.push(ChangeRecord {
                                    kind: ChangeKind::Format,
                                    field,
                                    from: original,
                                    to: parsed.canonical.clone(),
                                    reason: "normalized to canonical UTC".to_string(),
                                    row: Some(row),
                                });
                            }
                            record.set(field, parsed.canonical);
                        }
                        Err(err) => {
                            bad_dates.insert(field);
                            row_issues.push(IssueKind::BadDateFormat {
                                field,
                                row,
                                column: label,
                                text: err.text().to_string(),
                                reason: err.to_string(),
                            });
                        }
                    }
                } else if field == CanonicalField::Status {
                    let canonical = self.canonicalizer.canonicalize(&raw);
                    if canonical != raw {
                        result.changes.push(ChangeRecord {
                            kind: ChangeKind::Data,
                            field,
                            from: raw.clone(),
                            to: canonical.clone(),
                            reason: "status canonicalized".to_string(),
                            row: Some(row),
                        });
                    }
                    record.set(field, canonical);
                } else {
                    record.set(field, raw);
                }
            }

            for field in CanonicalField::required() {
                if record.get(field).is_empty() && !bad_dates.contains(&field) {
                    row_issues.push(IssueKind::EmptyRequiredField {
                        field,
                        row,
                        column: sources
                            .get(&field)
                            .and_then(Source::label)
                            .map(str::to_string),
                    });
                }
            }

            if !record.id.is_empty() {
                match seen_ids.get(&record.id) {
                    Some(first_row) => row_issues.push(IssueKind::DuplicateId {
                        id: record.id.clone(),
                        row,
                        first_row: *first_row,
                    }),
                    None => {
                        seen_ids.insert(record.id.clone(), row);
                    }
                }
            }

            if !record.status.is_empty() && seen_statuses.insert(record.status.clone()) {
                result.statuses.push(record.status.clone());
            }

            let errors = row_issues
                .iter()
                .filter(|issue| issue.severity() == Severity::Error)
                .count();
            if errors == 0 && !record.id.is_empty() {
                result.records.push(record);
            } else {
                debug!(row, errors, "row excluded from records");
            }
            result.originals.insert(row, originals);
            result.issues.extend(row_issues);
        }

        if let Some(drift) = self.drift_issue(&result.statuses) {
            result.issues.push(drift);
        }

        info!(
            rows = result.rows_analyzed,
            blank = result.blank_rows_skipped,
            records = result.records.len(),
            issues = result.issues.len(),
            "validated rows"
        );
        result
    }

    fn drift_issue(&self, statuses: &[String]) -> Option<IssueKind> {
        let unknown: Vec<String> = statuses
            .iter()
            .filter(|s| !StatusCanonicalizer::is_canonical(s))
            .cloned()
            .collect();
        if statuses.len() <= self.drift_threshold && unknown.is_empty() {
            return None;
        }
        Some(IssueKind::StatusVocabularyDrift {
            distinct: statuses.len(),
            threshold: self.drift_threshold,
            unknown: unknown.into_iter().take(DRIFT_SAMPLE_MAX).collect(),
            sample: statuses.iter().take(DRIFT_SAMPLE_MAX).cloned().collect(),
        })
    }
}
