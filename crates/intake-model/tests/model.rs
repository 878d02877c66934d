use intake_model::{
    CanonicalField, ChangeKind, ChangeRecord, IntakeResponse, IssueKind, MatchKind, Severity,
};

#[test]
fn issue_serializes_to_flat_shape() {
    let issue = IssueKind::DuplicateId {
        id: "A1".to_string(),
        row: 3,
        first_row: 2,
    }
    .to_issue();
    let json = serde_json::to_string(&issue).unwrap();
    insta::assert_snapshot!(json, @r#"{"code":"DUPLICATE_ID","severity":"error","message":"Row 3: duplicate Load ID 'A1'","rows":[3],"suggestion":"Load IDs must be unique; first seen on row 2"}"#);
}

#[test]
fn warning_omits_absent_optional_parts() {
    let issue = IssueKind::SuggestionTimeout { millis: 250 }.to_issue();
    let json = serde_json::to_value(&issue).unwrap();
    assert_eq!(json["severity"], "warn");
    assert!(json.get("rows").is_none());
    assert!(json.get("column").is_none());
    assert!(json.get("suggestion").is_none());
}

#[test]
fn drift_message_lists_unknown_values() {
    let kind = IssueKind::StatusVocabularyDrift {
        distinct: 6,
        threshold: 5,
        unknown: vec!["ON HOLD".to_string()],
        sample: vec!["DELIVERED".to_string(), "ON HOLD".to_string()],
    };
    assert_eq!(kind.severity(), Severity::Warn);
    insta::assert_snapshot!(
        kind.message(),
        @"Status vocabulary drift: 6 distinct value(s) (threshold 5): DELIVERED, ON HOLD; unrecognized: ON HOLD"
    );
}

#[test]
fn change_record_uses_type_key() {
    let change = ChangeRecord {
        kind: ChangeKind::Data,
        field: CanonicalField::Status,
        from: "rolling".to_string(),
        to: "IN_TRANSIT".to_string(),
        reason: "status canonicalized".to_string(),
        row: Some(2),
    };
    let json = serde_json::to_value(&change).unwrap();
    assert_eq!(json["type"], "data");
    assert_eq!(json["field"], "status");
    assert_eq!(json["row"], 2);
}

#[test]
fn match_kind_confidences_are_ordered() {
    let kinds = [
        MatchKind::Override,
        MatchKind::Split,
        MatchKind::Fuzzy,
        MatchKind::AmbiguousFallback,
    ];
    let confidences: Vec<f64> = kinds.iter().map(MatchKind::confidence).collect();
    assert_eq!(confidences, vec![1.0, 0.9, 0.75, 0.5]);
    assert_eq!(MatchKind::Suggested { confidence: 0.93 }.confidence(), 0.93);
}

#[test]
fn response_counts_by_severity() {
    let response = IntakeResponse {
        issues: vec![
            IssueKind::NoData.to_issue(),
            IssueKind::RowsTruncated {
                analyzed: 10,
                dropped: 2,
            }
            .to_issue(),
        ],
        ..Default::default()
    };
    assert_eq!(response.error_count(), 1);
    assert_eq!(response.warning_count(), 1);
    assert!(response.has_code("ROWS_TRUNCATED"));
    assert_eq!(response.record_count(), 0);
}
