//! External mapping suggestions.
//!
//! The suggestion capability is an injected dependency that may be slow,
//! unavailable or return garbage. Every call goes through
//! [`fetch_suggestions`], which bounds it with a hard deadline and turns
//! each failure into a [`SuggestError`] the pipeline reports as a warning.

use std::sync::Arc;
use std::time::Duration;

use intake_model::{CellValue, ConfidenceSuggestion, FieldMapping, IssueKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// What the provider is shown: headers, a few sample rows, and the
/// deterministic mapping it may refine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestionRequest {
    pub headers: Vec<String>,
    pub sample_rows: Vec<Vec<CellValue>>,
    pub mapping: FieldMapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestError {
    #[error("suggestion capability unavailable: {0}")]
    Unavailable(String),
    #[error("suggestion capability timed out after {millis} ms")]
    Timeout { millis: u64 },
    #[error("suggestion output could not be parsed: {0}")]
    Unparseable(String),
}

impl SuggestError {
    /// The warning reported when suggestions are skipped.
    pub fn to_issue(&self) -> IssueKind {
        match self {
            SuggestError::Unavailable(reason) => IssueKind::SuggestionUnavailable {
                reason: reason.clone(),
            },
            SuggestError::Timeout { millis } => IssueKind::SuggestionTimeout { millis: *millis },
            SuggestError::Unparseable(reason) => IssueKind::SuggestionUnparseable {
                reason: reason.clone(),
            },
        }
    }
}

/// Source of confidence-scored header suggestions.
///
/// Implementations may block; the pipeline runs them on a blocking thread.
/// The reply is raw text, typically a JSON array of suggestions, possibly
/// wrapped in prose or a fenced code block.
pub trait SuggestionProvider: Send + Sync {
    fn suggest(&self, request: &SuggestionRequest) -> Result<String, SuggestError>;
}

/// Serves a fixed reply regardless of the request.
#[derive(Debug, Clone)]
pub struct StaticSuggestionProvider {
    reply: String,
}

impl StaticSuggestionProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }

    pub fn from_suggestions(suggestions: &[ConfidenceSuggestion]) -> Self {
        // A Vec of plain structs always serializes.
        Self::new(serde_json::to_string(suggestions).unwrap_or_else(|_| "[]".to_string()))
    }
}

impl SuggestionProvider for StaticSuggestionProvider {
    fn suggest(&self, _request: &SuggestionRequest) -> Result<String, SuggestError> {
        Ok(self.reply.clone())
    }
}

/// Extracts the JSON payload from a provider reply.
///
/// Prefers the first fenced ```` ```json ```` block, then the outermost bare
/// `[...]` array.
pub fn extract_json(reply: &str) -> Result<&str, SuggestError> {
    if let Some(marker) = reply.find("```json") {
        let start = marker + "```json".len();
        if let Some(end) = reply[start..].find("```") {
            return Ok(reply[start..start + end].trim());
        }
    }

    if let Some(start) = reply.find('[')
        && let Some(end) = reply.rfind(']')
        && end >= start
    {
        return Ok(&reply[start..=end]);
    }

    Err(SuggestError::Unparseable(
        "no JSON array in provider reply".to_string(),
    ))
}

/// Parses a provider reply into suggestions.
pub fn parse_suggestions(reply: &str) -> Result<Vec<ConfidenceSuggestion>, SuggestError> {
    let json = extract_json(reply)?;
    serde_json::from_str(json).map_err(|e| SuggestError::Unparseable(e.to_string()))
}

/// Calls `provider` on a blocking thread, bounded by `deadline`.
///
/// On timeout the call is abandoned; its eventual reply is discarded.
pub async fn fetch_suggestions(
    provider: Arc<dyn SuggestionProvider>,
    request: SuggestionRequest,
    deadline: Duration,
) -> Result<Vec<ConfidenceSuggestion>, SuggestError> {
    let millis = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
    let task = tokio::task::spawn_blocking(move || provider.suggest(&request));

    let reply = match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_error)) => {
            warn!("suggestion task failed: {join_error}");
            return Err(SuggestError::Unavailable(format!(
                "provider task failed: {join_error}"
            )));
        }
        Err(_) => {
            warn!(millis, "suggestion capability timed out");
            return Err(SuggestError::Timeout { millis });
        }
    };

    let suggestions = parse_suggestions(&reply)?;
    debug!(count = suggestions.len(), "received mapping suggestions");
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_wins_over_bare_array() {
        let reply = "Here you go [ignored]\n```json\n[{\"a\": 1}]\n```\n";
        assert_eq!(extract_json(reply).unwrap(), "[{\"a\": 1}]");
    }

    #[test]
    fn bare_array_is_found_inside_prose() {
        let reply = "Sure: [{\"header\":\"Ref\",\"field\":\"id\",\"confidence\":0.95}] hope it helps";
        let parsed = parse_suggestions(reply).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].header, "Ref");
        assert!(parsed[0].alternatives.is_empty());
    }

    #[test]
    fn prose_without_json_is_unparseable() {
        assert!(matches!(
            parse_suggestions("I could not decide."),
            Err(SuggestError::Unparseable(_))
        ));
        assert!(matches!(
            parse_suggestions("[not json]"),
            Err(SuggestError::Unparseable(_))
        ));
    }

    #[test]
    fn errors_map_to_warnings() {
        let issue = SuggestError::Timeout { millis: 50 }.to_issue();
        assert_eq!(issue.code(), "SUGGESTION_TIMEOUT");
        assert_eq!(issue.severity(), intake_model::Severity::Warn);
    }

    #[tokio::test]
    async fn static_provider_round_trips_through_runner() {
        let suggestion = ConfidenceSuggestion {
            header: "Ref".to_string(),
            field: "id".to_string(),
            confidence: 0.92,
            alternatives: vec!["vehicle_id".to_string()],
        };
        let provider: Arc<dyn SuggestionProvider> = Arc::new(
            StaticSuggestionProvider::from_suggestions(std::slice::from_ref(&suggestion)),
        );

        let fetched = fetch_suggestions(
            provider,
            SuggestionRequest::default(),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(fetched, vec![suggestion]);
    }
}
