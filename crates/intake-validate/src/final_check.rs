//! Re-check of the records about to be returned.

use std::collections::BTreeMap;

use intake_model::{CanonicalField, IssueKind, ShipmentRecord};
use intake_transform::is_canonical_timestamp;

/// Checks the final record set independently of row validation.
///
/// Any issue found here is an error: it means earlier stages let an
/// inconsistent record through.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalValidator;

impl FinalValidator {
    pub fn check(records: &[ShipmentRecord]) -> Vec<IssueKind> {
        let mut issues = Vec::new();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in records {
            let id = record.id.trim();
            if !id.is_empty() {
                *counts.entry(id).or_default() += 1;
            }
        }
        // Report in first-occurrence order.
        for record in records {
            let id = record.id.trim();
            if let Some(occurrences) = counts.remove(id)
                && occurrences > 1
            {
                issues.push(IssueKind::FinalDuplicateId {
                    id: id.to_string(),
                    occurrences,
                });
            }
        }

        for record in records {
            for field in CanonicalField::required() {
                let value = record.get(field);
                if value.trim().is_empty() {
                    issues.push(IssueKind::FinalEmptyField {
                        id: record.id.clone(),
                        field,
                    });
                } else if field.is_datetime() && !is_canonical_timestamp(value) {
                    issues.push(IssueKind::FinalBadTimestamp {
                        id: record.id.clone(),
                        field,
                        value: value.to_string(),
                    });
                }
            }
        }
        issues
    }
}
