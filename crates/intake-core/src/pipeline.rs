//! Shipment intake pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Guard**: reject empty input
//! 2. **Map**: resolve headers to canonical fields, stop if a required field
//!    has no column
//! 3. **Validate**: extract, normalize and check each analyzed row
//! 4. **Suggest** (optional): overlay external suggestions, re-validating
//!    rows when the mapping moved
//! 5. **Final check**: re-check the record set about to be returned
//! 6. **Aggregate**: order, cap and summarize issues, decide success
//!
//! Every problem is recorded as an issue; only the guard and a missing
//! required column end a run early.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, info_span, warn};

use intake_map::{
    HeaderMapper, MappingOutcome, MergeReport, SuggestionMerger, SynonymTable, closest_header,
};
use intake_model::{
    CellValue, ChangeRecord, IntakeRequest, IntakeResponse, IssueKind, MappingMeta,
    ProcessingOptions, RunMeta,
};
use intake_transform::{DateTimeNormalizer, StatusCanonicalizer};
use intake_validate::{FinalValidator, IssueAggregator, RowValidation, RowValidator};

use crate::suggest::{SuggestionProvider, SuggestionRequest, fetch_suggestions};

/// Stateless intake pipeline.
///
/// One instance can serve any number of concurrent invocations; each call
/// works on its own inputs and returns a self-contained response.
#[derive(Clone)]
pub struct IntakePipeline {
    options: ProcessingOptions,
    synonyms: SynonymTable,
    canonicalizer: StatusCanonicalizer,
    provider: Option<Arc<dyn SuggestionProvider>>,
}

impl std::fmt::Debug for IntakePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakePipeline")
            .field("options", &self.options)
            .field("provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for IntakePipeline {
    fn default() -> Self {
        Self::new(ProcessingOptions::default())
    }
}

impl IntakePipeline {
    /// Pipeline with `options` as defaults; configured extra synonyms are
    /// added to the stock table.
    pub fn new(options: ProcessingOptions) -> Self {
        let synonyms = SynonymTable::with_extras(&options.extra_synonyms);
        Self {
            options,
            synonyms,
            canonicalizer: StatusCanonicalizer::new(),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn SuggestionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Deterministic run without external suggestions.
    pub fn process(&self, request: &IntakeRequest) -> IntakeResponse {
        let _span = info_span!("intake").entered();
        match self.analyze(request) {
            Ok(run) => self.finish(run),
            Err(response) => *response,
        }
    }

    /// Run with the configured suggestion provider, if any.
    ///
    /// The provider is bounded by the suggestion deadline; when it fails,
    /// times out or replies with garbage the deterministic result stands and
    /// one warning is added.
    pub async fn process_with_suggestions(&self, request: &IntakeRequest) -> IntakeResponse {
        let mut run = match self.analyze(request) {
            Ok(run) => run,
            Err(response) => return *response,
        };
        if let Some(provider) = &self.provider {
            self.suggest(&mut run, Arc::clone(provider)).await;
        }
        self.finish(run)
    }

    /// [`Self::process_with_suggestions`] on a private current-thread runtime.
    ///
    /// The runtime is shut down without waiting for a provider call that
    /// outlived its deadline, so a hung provider cannot hold up the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be built.
    pub fn process_blocking(&self, request: &IntakeRequest) -> std::io::Result<IntakeResponse> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let response = runtime.block_on(self.process_with_suggestions(request));
        runtime.shutdown_background();
        Ok(response)
    }

    // ========================================================================
    // Stages 1-3: guard, map, validate
    // ========================================================================

    fn analyze<'r>(&self, request: &'r IntakeRequest) -> Result<Run<'r>, Box<IntakeResponse>> {
        let options = self.options.resolve(&request.options);
        let mut aggregator = IssueAggregator::new(options.issue_cap);
        let table = &request.table;

        if table.is_empty() {
            info!("no data supplied");
            aggregator.push(IssueKind::NoData);
            return Err(Box::new(short_circuit(
                aggregator,
                MappingOutcome::default(),
            )));
        }

        let mut synonyms = self.synonyms.clone();
        let unknown = synonyms.extend(&request.extra_synonyms);
        if !unknown.is_empty() {
            debug!(?unknown, "request synonyms for unknown fields ignored");
        }

        let outcome = HeaderMapper::new(&synonyms)
            .with_overrides(&request.overrides)
            .map_headers(&table.headers);
        aggregator.extend(outcome.structural_issues());

        let missing = outcome.missing_required();
        if !missing.is_empty() {
            info!(missing = missing.len(), "required columns not found");
            for field in missing {
                let closest_header = closest_header(field, &outcome.unmapped_headers, &synonyms)
                    .map(|(header, _)| header.to_string());
                aggregator.push(IssueKind::MissingRequiredColumn {
                    field,
                    closest_header,
                });
            }
            return Err(Box::new(short_circuit(aggregator, outcome)));
        }

        let limit = options.row_limit.unwrap_or(usize::MAX);
        let analyzed = table.rows.len().min(limit);
        let rows = &table.rows[..analyzed];
        let rows_truncated = table.rows.len() - analyzed;
        if rows_truncated > 0 {
            aggregator.push(IssueKind::RowsTruncated {
                analyzed,
                dropped: rows_truncated,
            });
        }

        let normalizer = DateTimeNormalizer::from_options(&options);
        let validation = self.validate_rows(&options, &normalizer, &outcome, &table.headers, rows);

        Ok(Run {
            options,
            headers: &table.headers,
            rows,
            normalizer,
            outcome,
            validation,
            aggregator,
            mapping_changes: Vec::new(),
            suggestions_applied: false,
            rows_truncated,
        })
    }

    fn validate_rows(
        &self,
        options: &ProcessingOptions,
        normalizer: &DateTimeNormalizer,
        outcome: &MappingOutcome,
        headers: &[String],
        rows: &[Vec<CellValue>],
    ) -> RowValidation {
        RowValidator::new(outcome, normalizer, &self.canonicalizer)
            .with_drift_threshold(options.status_drift_threshold)
            .validate(headers, rows)
    }

    // ========================================================================
    // Stage 4: suggestions
    // ========================================================================

    async fn suggest(&self, run: &mut Run<'_>, provider: Arc<dyn SuggestionProvider>) {
        let request = SuggestionRequest {
            headers: run.headers.to_vec(),
            sample_rows: run
                .rows
                .iter()
                .take(run.options.suggestion_sample_rows)
                .cloned()
                .collect(),
            mapping: run.outcome.mapping.clone(),
        };
        let deadline = Duration::from_millis(run.options.suggestion_timeout_ms);

        let suggestions = match fetch_suggestions(provider, request, deadline).await {
            Ok(suggestions) => suggestions,
            Err(error) => {
                warn!("continuing without suggestions: {error}");
                run.aggregator.push(error.to_issue());
                return;
            }
        };

        let MergeReport {
            changes,
            issues,
            applied,
        } = SuggestionMerger::new(run.headers).merge(&mut run.outcome, &suggestions);
        run.aggregator.extend(issues);
        run.mapping_changes = changes;

        if applied > 0 {
            info!(applied, "mapping adjusted by suggestions; re-validating rows");
            run.suggestions_applied = true;
            run.validation = self.validate_rows(
                &run.options,
                &run.normalizer,
                &run.outcome,
                run.headers,
                run.rows,
            );
        }
    }

    // ========================================================================
    // Stages 5-6: final check, aggregate
    // ========================================================================

    fn finish(&self, run: Run<'_>) -> IntakeResponse {
        let Run {
            outcome,
            validation,
            mut aggregator,
            mapping_changes,
            suggestions_applied,
            rows_truncated,
            ..
        } = run;
        let RowValidation {
            records,
            issues: row_issues,
            changes: row_changes,
            rows_analyzed,
            blank_rows_skipped,
            ..
        } = validation;

        aggregator.extend(row_issues);
        aggregator.extend(FinalValidator::check(&records));
        if records.is_empty() {
            aggregator.push(IssueKind::NoValidRecords { rows_analyzed });
        }

        let summary = aggregator.finish(records.len());
        let records_emitted = if summary.success { records.len() } else { 0 };
        info!(
            success = summary.success,
            rows = rows_analyzed,
            records = records_emitted,
            errors = summary.error_count,
            warnings = summary.warning_count,
            "intake finished"
        );

        let mut changes: Vec<ChangeRecord> = mapping_changes;
        changes.extend(row_changes);

        IntakeResponse {
            success: summary.success,
            issues: summary.issues,
            records: summary.success.then_some(records),
            mapping: outcome.mapping.clone(),
            mapping_meta: mapping_meta(&outcome, suggestions_applied),
            changes,
            meta: RunMeta {
                rows_analyzed,
                blank_rows_skipped,
                rows_truncated,
                records_emitted,
                error_count: summary.error_count,
                warning_count: summary.warning_count,
                issues_dropped: summary.dropped,
                generated_at: generated_at(),
                confidence_average: outcome.confidence_average(),
                suggestions_applied,
            },
        }
    }
}

/// Working state of one invocation between stages.
struct Run<'r> {
    options: ProcessingOptions,
    headers: &'r [String],
    rows: &'r [Vec<CellValue>],
    normalizer: DateTimeNormalizer,
    outcome: MappingOutcome,
    validation: RowValidation,
    aggregator: IssueAggregator,
    mapping_changes: Vec<ChangeRecord>,
    suggestions_applied: bool,
    rows_truncated: usize,
}

fn short_circuit(aggregator: IssueAggregator, outcome: MappingOutcome) -> IntakeResponse {
    let summary = aggregator.finish(0);
    IntakeResponse {
        success: false,
        issues: summary.issues,
        records: None,
        mapping: outcome.mapping.clone(),
        mapping_meta: mapping_meta(&outcome, false),
        changes: Vec::new(),
        meta: RunMeta {
            error_count: summary.error_count,
            warning_count: summary.warning_count,
            issues_dropped: summary.dropped,
            generated_at: generated_at(),
            confidence_average: outcome.confidence_average(),
            ..RunMeta::default()
        },
    }
}

fn mapping_meta(outcome: &MappingOutcome, suggestions_applied: bool) -> MappingMeta {
    MappingMeta {
        splits: outcome.splits.clone(),
        ambiguities: outcome.ambiguities.clone(),
        unmapped_headers: outcome.unmapped_headers.clone(),
        suggestions_applied,
    }
}

fn generated_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
