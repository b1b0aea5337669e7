use logscope_core::frame::{Column, DType, Frame, Value};
use logscope_report::{
    describe, export_jsonl, info, render_bar_chart, render_table, requests_per_session, top_n,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn session_frame() -> Frame {
    Frame::from_columns(vec![
        Column::new(
            "session_global_id",
            vec![
                "10.0.0.1_0".into(),
                "10.0.0.1_0".into(),
                "10.0.0.1_0".into(),
                "10.0.0.2_0".into(),
                "10.0.0.3_1".into(),
                "10.0.0.3_1".into(),
            ],
        ),
        Column::new(
            "size_in_bytes",
            vec![
                Value::Float(0.0),
                Value::Float(0.2),
                Value::Float(0.4),
                Value::Float(0.6),
                Value::Float(0.8),
                Value::Float(1.0),
            ],
        ),
    ])
    .unwrap()
}

// =============================================================================
// Summaries
// =============================================================================

#[test]
fn test_info_and_describe_cover_frame() {
    let frame = session_frame();
    let info = info(&frame);
    assert_eq!(info.len(), 2);
    assert_eq!(info[0].dtype, DType::Text);
    assert_eq!(info[1].non_null, 6);

    let stats = describe(&frame);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].count, 6);
    assert!((stats[0].mean - 0.5).abs() < 1e-12);
    assert!((stats[0].p50 - 0.5).abs() < 1e-12);
    assert_eq!(stats[0].min, 0.0);
    assert_eq!(stats[0].max, 1.0);
}

#[test]
fn test_summaries_serialize_for_export() {
    let json = serde_json::to_value(info(&session_frame())).unwrap();
    assert_eq!(json[0]["dtype"], "text");
    assert_eq!(json[1]["column"], "size_in_bytes");
}

// =============================================================================
// Session ranking
// =============================================================================

#[test]
fn test_top_sessions_chart() {
    let ranked = requests_per_session(&session_frame(), "session_global_id").unwrap();
    let top = top_n(&ranked, 2);
    assert_eq!(top[0].session_id, "10.0.0.1_0");
    assert_eq!(top[0].num_requests, 3);
    assert_eq!(top[1].session_id, "10.0.0.3_1");

    let chart = render_bar_chart(top);
    assert_eq!(chart.lines().count(), 2);
    assert!(chart.lines().next().unwrap().ends_with(" 3"));

    let rows: Vec<Vec<String>> = top
        .iter()
        .map(|s| vec![s.session_id.clone(), s.num_requests.to_string()])
        .collect();
    let table = render_table(&["session_global_id", "num_requests"], &rows);
    assert!(table.starts_with("session_global_id"));
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_writes_one_object_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/frame.jsonl");
    export_jsonl(&session_frame(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[3]["session_global_id"], "10.0.0.2_0");
    assert_eq!(rows[5]["size_in_bytes"], 1.0);
}
