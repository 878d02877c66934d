//! Configuration options for shipment intake.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// Interpretation of bare numeric dates such as `03/04/2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `MM/DD/YYYY` is tried first.
    #[default]
    MonthFirst,
    /// `DD/MM/YYYY` is tried first.
    DayFirst,
}

impl DateOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateOrder::MonthFirst => "month_first",
            DateOrder::DayFirst => "day_first",
        }
    }

    /// Date order implied by a locale tag such as `en-US` or `fr_FR`.
    ///
    /// Regions `US`, `PH` and `FM` write month first; every other locale,
    /// including one without a region subtag, is taken as day first.
    pub fn from_locale(locale: &str) -> Self {
        let region = locale
            .split(['-', '_'])
            .skip(1)
            .find(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase);
        match region.as_deref() {
            Some("US" | "PH" | "FM") => DateOrder::MonthFirst,
            _ => DateOrder::DayFirst,
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateOrder {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "month_first" | "mdy" => Ok(DateOrder::MonthFirst),
            "day_first" | "dmy" => Ok(DateOrder::DayFirst),
            _ => Err(IntakeError::UnknownDateOrder(s.to_string())),
        }
    }
}

/// Options controlling intake processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Zone assumed for date text without an explicit offset: `UTC`, a
    /// numeric offset such as `-05:00`, or a zone name.
    pub timezone: String,

    /// Order tried first for bare numeric dates.
    pub date_order: DateOrder,

    /// More distinct canonical statuses than this raises a drift warning.
    pub status_drift_threshold: usize,

    /// Maximum number of issues returned.
    pub issue_cap: usize,

    /// Rows past this count are not analyzed.
    pub row_limit: Option<usize>,

    /// Deadline for the external suggestion capability.
    pub suggestion_timeout_ms: u64,

    /// Number of leading rows sent to the suggestion capability.
    pub suggestion_sample_rows: usize,

    /// Additional synonym phrases per canonical field key.
    pub extra_synonyms: BTreeMap<String, Vec<String>>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            date_order: DateOrder::MonthFirst,
            status_drift_threshold: 5,
            issue_cap: 200,
            row_limit: None,
            suggestion_timeout_ms: 5000,
            suggestion_sample_rows: 20,
            extra_synonyms: BTreeMap::new(),
        }
    }
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    pub fn with_issue_cap(mut self, cap: usize) -> Self {
        self.issue_cap = cap;
        self
    }

    /// Applies per-request overrides on top of these defaults.
    pub fn resolve(&self, request: &RequestOptions) -> ProcessingOptions {
        let mut resolved = self.clone();
        if let Some(limit) = request.row_limit {
            resolved.row_limit = Some(limit);
        }
        if let Some(timezone) = request.timezone.as_deref().map(str::trim)
            && !timezone.is_empty()
        {
            resolved.timezone = timezone.to_string();
        }
        resolved.date_order = match (request.date_order, request.locale.as_deref()) {
            (Some(order), _) => order,
            (None, Some(locale)) if !locale.trim().is_empty() => DateOrder::from_locale(locale),
            _ => self.date_order,
        };
        resolved
    }
}

/// Per-request options as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Only consulted for date order when `date_order` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_order: Option<DateOrder>,
}
