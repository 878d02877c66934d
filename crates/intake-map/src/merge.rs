//! Overlaying external mapping suggestions on the deterministic mapping.

use intake_model::{
    CanonicalField, ChangeKind, ChangeRecord, ConfidenceSuggestion, IssueKind, MatchKind,
};
use tracing::{debug, info};

use crate::confidence::ConfidenceTier;
use crate::mapper::MappingOutcome;

/// What a merge changed and reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub changes: Vec<ChangeRecord>,
    pub issues: Vec<IssueKind>,
    /// Number of auto-tier suggestions that altered the mapping.
    pub applied: usize,
}

impl MergeReport {
    pub fn mapping_changed(&self) -> bool {
        self.applied > 0
    }
}

/// Applies confidence-tiered suggestions to a [`MappingOutcome`].
///
/// Auto-tier entries overwrite or extend the mapping and are logged as
/// changes. Review-tier entries become warnings and reject-tier entries
/// become errors; neither touches the mapping.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionMerger<'a> {
    headers: &'a [String],
}

impl<'a> SuggestionMerger<'a> {
    /// `headers` are the table's headers; suggestions naming anything else
    /// are ignored.
    pub fn new(headers: &'a [String]) -> Self {
        Self { headers }
    }

    pub fn merge(
        &self,
        outcome: &mut MappingOutcome,
        suggestions: &[ConfidenceSuggestion],
    ) -> MergeReport {
        let mut report = MergeReport::default();
        for suggestion in suggestions {
            let field = match self.validate(suggestion) {
                Ok(field) => field,
                Err(reason) => {
                    debug!(header = %suggestion.header, field = %suggestion.field, %reason, "invalid suggestion");
                    report.issues.push(IssueKind::SuggestionInvalid {
                        header: suggestion.header.clone(),
                        field: suggestion.field.clone(),
                        reason,
                    });
                    continue;
                }
            };

            match ConfidenceTier::of(suggestion.confidence) {
                ConfidenceTier::Auto => {
                    if let Some(change) =
                        self.apply(outcome, &suggestion.header, field, suggestion.confidence)
                    {
                        report.applied += 1;
                        report.changes.push(change);
                    }
                }
                ConfidenceTier::Review => report.issues.push(IssueKind::SuggestionReview {
                    header: suggestion.header.clone(),
                    field: field.as_str().to_string(),
                    confidence: suggestion.confidence,
                    alternatives: suggestion.alternatives.clone(),
                }),
                ConfidenceTier::Reject => report.issues.push(IssueKind::SuggestionRejected {
                    header: suggestion.header.clone(),
                    field: field.as_str().to_string(),
                    confidence: suggestion.confidence,
                }),
            }
        }
        info!(
            suggestions = suggestions.len(),
            applied = report.applied,
            "merged mapping suggestions"
        );
        report
    }

    fn validate(&self, suggestion: &ConfidenceSuggestion) -> Result<CanonicalField, String> {
        let field = suggestion
            .field
            .parse::<CanonicalField>()
            .map_err(|e| e.to_string())?;
        if !suggestion.confidence.is_finite() || !(0.0..=1.0).contains(&suggestion.confidence) {
            return Err(format!("confidence {} outside [0, 1]", suggestion.confidence));
        }
        if !self.headers.iter().any(|h| h == &suggestion.header) {
            return Err("header not present in the table".to_string());
        }
        Ok(field)
    }

    /// Assigns `header` to `field`, returning the change when the mapping moved.
    fn apply(
        &self,
        outcome: &mut MappingOutcome,
        header: &str,
        field: CanonicalField,
        confidence: f64,
    ) -> Option<ChangeRecord> {
        if outcome.split_for(field).is_none() && outcome.mapping.get(header) == Some(field) {
            debug!(%header, %field, "suggestion matches existing mapping");
            return None;
        }

        let mut from = None;
        let mut released: Vec<String> = Vec::new();
        if let Some(split) = outcome.drop_split(field) {
            from = Some(split.composite_key());
            released.extend(split.headers().map(str::to_string));
        }

        // A header backing another field's split can no longer serve that split.
        let displaced: Vec<CanonicalField> = outcome
            .splits
            .iter()
            .filter(|s| s.headers().any(|h| h == header))
            .map(|s| s.field)
            .collect();
        for other in displaced {
            if let Some(split) = outcome.drop_split(other) {
                released.extend(split.headers().map(str::to_string));
            }
        }

        if let Some(previous_field) = outcome.mapping.get(header) {
            outcome.provenance.remove(&previous_field);
        }
        if let Some(previous) = outcome.mapping.assign(header, field) {
            released.push(previous.clone());
            from = Some(previous);
        }
        outcome
            .provenance
            .insert(field, MatchKind::Suggested { confidence });

        outcome.unmapped_headers.retain(|h| h != header);
        for released_header in released {
            if released_header != header && !outcome.unmapped_headers.contains(&released_header) {
                outcome.unmapped_headers.push(released_header);
            }
        }
        let position = |h: &String| self.headers.iter().position(|x| x == h);
        outcome.unmapped_headers.sort_by_key(position);

        Some(ChangeRecord {
            kind: ChangeKind::Mapping,
            field,
            from: from.unwrap_or_default(),
            to: header.to_string(),
            reason: format!("auto-applied external suggestion (confidence {confidence:.2})"),
            row: None,
        })
    }
}
