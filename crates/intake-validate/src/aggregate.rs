//! Collects issues from every stage into the capped response list.

use intake_model::{Issue, IssueKind, Severity};
use tracing::debug;

/// Result of [`IssueAggregator::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedIssues {
    /// Errors first, then warnings, stable within severity, capped.
    pub issues: Vec<Issue>,
    /// At least one record and zero errors in the uncapped list.
    pub success: bool,
    /// Counts over the uncapped list.
    pub error_count: usize,
    pub warning_count: usize,
    /// Issues removed by the cap, zero when nothing was dropped.
    pub dropped: usize,
}

/// Shared issue list appended to by every stage.
#[derive(Debug, Clone)]
pub struct IssueAggregator {
    cap: usize,
    issues: Vec<IssueKind>,
}

impl IssueAggregator {
    /// A cap below one is raised to one so the truncation notice always fits.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            issues: Vec::new(),
        }
    }

    pub fn push(&mut self, issue: IssueKind) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = IssueKind>) {
        self.issues.extend(issues);
    }

    fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
            .count()
    }

    /// Orders, counts and caps the collected issues.
    pub fn finish(mut self, record_count: usize) -> AggregatedIssues {
        // Stable: preserves stage order within each severity.
        self.issues.sort_by_key(|issue| match issue.severity() {
            Severity::Error => 0u8,
            Severity::Warn => 1,
        });

        let error_count = self.error_count();
        let warning_count = self.issues.len() - error_count;
        let success = record_count > 0 && error_count == 0;

        let mut dropped = 0;
        if self.issues.len() > self.cap {
            let keep = self.cap - 1;
            dropped = self.issues.len() - keep;
            self.issues.truncate(keep);
            self.issues.push(IssueKind::IssuesTruncated { dropped });
            debug!(cap = self.cap, dropped, "issue list capped");
        }

        AggregatedIssues {
            issues: self.issues.iter().map(IssueKind::to_issue).collect(),
            success,
            error_count,
            warning_count,
            dropped,
        }
    }
}

impl Default for IssueAggregator {
    fn default() -> Self {
        Self::new(200)
    }
}
