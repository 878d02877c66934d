use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use intake_core::{
    IntakePipeline, StaticSuggestionProvider, SuggestError, SuggestionProvider, SuggestionRequest,
};
use intake_model::{
    CanonicalField, CellValue, ConfidenceSuggestion, IntakeRequest, ProcessingOptions, RawTable,
    RequestOptions, Severity,
};
use proptest::prelude::*;

const HEADERS: [&str; 11] = [
    "Load #",
    "Pickup Address",
    "Pickup Date",
    "Pickup Time",
    "Delivery Address",
    "Delivery Appointment",
    "Load Status",
    "Driver Name",
    "Truck #",
    "Carrier",
    "Ref Code",
];

fn row(id: &str, status: &str) -> Vec<CellValue> {
    [
        id,
        "100 Main St, Reno NV",
        "09/20/2025",
        "08:00",
        "200 Oak Ave, Boise ID",
        "2025-09-21T10:00:00Z",
        status,
        "Sam Ortiz",
        "T-9",
        "Acme Freight",
        "X-1",
    ]
    .into_iter()
    .map(CellValue::from)
    .collect()
}

fn request(rows: Vec<Vec<CellValue>>) -> IntakeRequest {
    IntakeRequest::new(RawTable::new(
        HEADERS.iter().map(|h| (*h).to_string()).collect(),
        rows,
    ))
}

fn suggestion(header: &str, field: &str, confidence: f64) -> ConfidenceSuggestion {
    ConfidenceSuggestion {
        header: header.to_string(),
        field: field.to_string(),
        confidence,
        alternatives: Vec::new(),
    }
}

fn with_suggestions(suggestions: &[ConfidenceSuggestion]) -> IntakePipeline {
    IntakePipeline::default().with_provider(Arc::new(StaticSuggestionProvider::from_suggestions(
        suggestions,
    )))
}

#[test]
fn clean_extract_succeeds() {
    let response = IntakePipeline::default().process(&request(vec![
        row("A1", "rolling"),
        row("A2", "Delivered"),
    ]));

    assert!(response.success, "{:?}", response.issues);
    let records = response.records.as_ref().expect("records on success");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].origin_timestamp, "2025-09-20T08:00:00Z");
    assert_eq!(records[0].status, "IN_TRANSIT");
    assert_eq!(response.error_count(), 0);
    assert_eq!(response.meta.records_emitted, 2);
    assert_eq!(response.meta.rows_analyzed, 2);
    assert_eq!(response.mapping_meta.unmapped_headers, vec!["Ref Code"]);
    assert!(response.meta.confidence_average.is_some());
}

#[test]
fn abbreviated_headers_without_delivery_date_short_circuit() {
    let table = RawTable::new(
        ["Load ID", "PU", "PU Time", "DEL Time", "Driver"]
            .iter()
            .map(|h| (*h).to_string())
            .collect(),
        vec![
            ["A1", "09/20/2025", "08:00", "17:00", "Sam"]
                .into_iter()
                .map(CellValue::from)
                .collect(),
        ],
    );
    let response = IntakePipeline::default().process(&IntakeRequest::new(table));

    assert!(!response.success);
    assert!(response.records.is_none());
    assert_eq!(
        response.mapping.header_for(CanonicalField::Id),
        Some("Load ID")
    );
    assert_eq!(
        response.mapping.header_for(CanonicalField::OperatorName),
        Some("Driver")
    );
    let missing: Vec<_> = response
        .issues_with_code("MISSING_REQUIRED_COLUMN")
        .collect();
    assert!(
        missing
            .iter()
            .any(|issue| issue.message.contains("Delivery time"))
    );
    let delivery = missing
        .iter()
        .find(|issue| issue.message.contains("destination_timestamp"))
        .expect("delivery time missing");
    insta::assert_snapshot!(
        delivery.message,
        @"Required column for Delivery time (destination_timestamp) not found"
    );
}

#[test]
fn two_digit_year_is_a_bad_date_not_year_25() {
    let mut raw = row("A1", "PENDING");
    raw[2] = CellValue::from("09/20/25");
    let response = IntakePipeline::default().process(&request(vec![raw]));

    assert!(!response.success);
    assert!(response.records.is_none());
    let bad = response
        .issues_with_code("BAD_DATE_FORMAT")
        .next()
        .expect("bad date issue");
    assert_eq!(bad.rows, Some(vec![2]));
    insta::assert_snapshot!(
        bad.message,
        @"Row 2: could not parse Pickup time '09/20/25 08:00'"
    );
}

#[test]
fn duplicate_id_fails_the_run() {
    let response = IntakePipeline::default().process(&request(vec![
        row("A1", "PENDING"),
        row("A1", "PENDING"),
    ]));

    assert!(!response.success);
    assert!(response.records.is_none());
    let duplicate = response
        .issues_with_code("DUPLICATE_ID")
        .next()
        .expect("duplicate issue");
    assert_eq!(duplicate.rows, Some(vec![3]));
    assert_eq!(duplicate.severity, Severity::Error);
}

#[test]
fn zero_rows_is_a_single_no_data_error() {
    let response = IntakePipeline::default().process(&request(Vec::new()));

    assert!(!response.success);
    assert_eq!(response.issues.len(), 1);
    assert_eq!(response.issues[0].code, "NO_DATA");
    let json = serde_json::to_value(&response).expect("serialize");
    assert!(json.get("records").is_none());
}

#[test]
fn row_limit_truncates_and_warns() {
    let mut req = request((0..5).map(|i| row(&format!("L{i}"), "PENDING")).collect());
    req.options = RequestOptions {
        row_limit: Some(3),
        ..RequestOptions::default()
    };
    let response = IntakePipeline::default().process(&req);

    assert!(response.success);
    assert_eq!(response.record_count(), 3);
    assert_eq!(response.meta.rows_truncated, 2);
    assert!(response.has_code("ROWS_TRUNCATED"));
}

#[test]
fn issue_cap_keeps_success_judgement() {
    let rows: Vec<Vec<CellValue>> = (0..10).map(|i| row(&format!("L{i}"), "PENDING")).collect();
    let pipeline = IntakePipeline::new(ProcessingOptions::default().with_issue_cap(4));
    let response = pipeline.process(&request(rows));

    // Ten normalization warnings plus the non-schema warning, capped.
    assert!(response.success);
    assert_eq!(response.issues.len(), 4);
    assert_eq!(response.issues[3].code, "ISSUES_TRUNCATED");
    assert_eq!(response.meta.issues_dropped, 8);
}

#[test]
fn locale_selects_date_order_deterministically() {
    let mut raw = row("A1", "PENDING");
    raw[2] = CellValue::from("03/04/2025");
    raw[3] = CellValue::Empty;

    let mut us = request(vec![raw.clone()]);
    us.options.locale = Some("en-US".to_string());
    let mut gb = request(vec![raw]);
    gb.options.locale = Some("en-GB".to_string());

    let pipeline = IntakePipeline::default();
    let us_records = pipeline.process(&us).records.expect("us records");
    let gb_records = pipeline.process(&gb).records.expect("gb records");
    assert_eq!(us_records[0].origin_timestamp, "2025-03-04T00:00:00Z");
    assert_eq!(gb_records[0].origin_timestamp, "2025-04-03T00:00:00Z");
}

#[tokio::test]
async fn auto_suggestion_remaps_and_revalidates() {
    // Point the id at "Ref Code" instead of "Load #".
    let pipeline = with_suggestions(&[suggestion("Ref Code", "id", 0.9)]);
    let response = pipeline
        .process_with_suggestions(&request(vec![row("A1", "PENDING")]))
        .await;

    assert!(response.success, "{:?}", response.issues);
    assert!(response.mapping_meta.suggestions_applied);
    assert!(response.meta.suggestions_applied);
    assert_eq!(
        response.mapping.header_for(CanonicalField::Id),
        Some("Ref Code")
    );
    assert_eq!(response.records.expect("records")[0].id, "X-1");
    assert_eq!(
        response.changes[0].reason,
        "auto-applied external suggestion (confidence 0.90)"
    );
}

#[tokio::test]
async fn review_tier_warns_without_touching_mapping() {
    let pipeline = with_suggestions(&[suggestion("Ref Code", "id", 0.8999)]);
    let response = pipeline
        .process_with_suggestions(&request(vec![row("A1", "PENDING")]))
        .await;

    assert!(response.success);
    assert!(!response.mapping_meta.suggestions_applied);
    assert_eq!(response.mapping.header_for(CanonicalField::Id), Some("Load #"));
    let review = response
        .issues_with_code("SUGGESTION_REVIEW")
        .next()
        .expect("review warning");
    assert_eq!(review.severity, Severity::Warn);
    insta::assert_snapshot!(
        review.message,
        @"Header 'Ref Code' may be id (confidence 0.90)"
    );
}

#[tokio::test]
async fn reject_tier_fails_an_otherwise_clean_run() {
    let pipeline = with_suggestions(&[suggestion("Ref Code", "vehicle_id", 0.59)]);
    let response = pipeline
        .process_with_suggestions(&request(vec![row("A1", "PENDING")]))
        .await;

    assert!(!response.success);
    assert!(response.records.is_none());
    assert!(response.has_code("SUGGESTION_REJECTED"));
}

struct SlowProvider(Duration);

impl SuggestionProvider for SlowProvider {
    fn suggest(&self, _request: &SuggestionRequest) -> Result<String, SuggestError> {
        thread::sleep(self.0);
        Ok("[]".to_string())
    }
}

struct DownProvider;

impl SuggestionProvider for DownProvider {
    fn suggest(&self, _request: &SuggestionRequest) -> Result<String, SuggestError> {
        Err(SuggestError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn slow_provider_times_out_and_result_stands() {
    let options = ProcessingOptions {
        suggestion_timeout_ms: 20,
        ..ProcessingOptions::default()
    };
    let pipeline = IntakePipeline::new(options)
        .with_provider(Arc::new(SlowProvider(Duration::from_millis(300))));
    let response = pipeline
        .process_with_suggestions(&request(vec![row("A1", "PENDING")]))
        .await;

    assert!(response.success);
    let timeout: Vec<_> = response.issues_with_code("SUGGESTION_TIMEOUT").collect();
    assert_eq!(timeout.len(), 1);
    assert_eq!(timeout[0].severity, Severity::Warn);
}

#[test]
fn blocking_run_returns_without_waiting_for_hung_provider() {
    let options = ProcessingOptions {
        suggestion_timeout_ms: 20,
        ..ProcessingOptions::default()
    };
    let pipeline =
        IntakePipeline::new(options).with_provider(Arc::new(SlowProvider(Duration::from_secs(5))));

    let started = Instant::now();
    let response = pipeline
        .process_blocking(&request(vec![row("A1", "PENDING")]))
        .expect("runtime");

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(response.success);
    assert!(response.has_code("SUGGESTION_TIMEOUT"));
}

#[tokio::test]
async fn failing_or_garbled_provider_adds_one_warning() {
    let down = IntakePipeline::default().with_provider(Arc::new(DownProvider));
    let response = down
        .process_with_suggestions(&request(vec![row("A1", "PENDING")]))
        .await;
    assert!(response.success);
    assert_eq!(response.issues_with_code("SUGGESTION_UNAVAILABLE").count(), 1);

    let garbled = IntakePipeline::default()
        .with_provider(Arc::new(StaticSuggestionProvider::new("no idea, sorry")));
    let response = garbled
        .process_with_suggestions(&request(vec![row("A1", "PENDING")]))
        .await;
    assert!(response.success);
    assert_eq!(response.issues_with_code("SUGGESTION_UNPARSEABLE").count(), 1);
}

#[test]
fn sync_and_async_agree_without_provider() {
    let req = request(vec![row("A1", "rolling")]);
    let pipeline = IntakePipeline::default();
    let sync = pipeline.process(&req);
    let asynchronous = pipeline.process_blocking(&req).expect("runtime");

    assert_eq!(sync.records, asynchronous.records);
    assert_eq!(sync.issues, asynchronous.issues);
    assert_eq!(sync.changes, asynchronous.changes);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn suggestion_tier_decides_outcome(confidence in 0.0f64..=1.0) {
        let pipeline = with_suggestions(&[suggestion("Ref Code", "vehicle_id", confidence)]);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let response = runtime
            .block_on(pipeline.process_with_suggestions(&request(vec![row("A1", "PENDING")])));

        prop_assert_eq!(response.success, confidence >= 0.6);
        prop_assert_eq!(response.mapping_meta.suggestions_applied, confidence >= 0.9);
        prop_assert_eq!(response.has_code("SUGGESTION_REVIEW"), (0.6..0.9).contains(&confidence));
        prop_assert_eq!(response.has_code("SUGGESTION_REJECTED"), confidence < 0.6);
    }
}
