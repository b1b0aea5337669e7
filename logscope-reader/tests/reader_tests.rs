use logscope_core::frame::Value;
use logscope_reader::{LogReader, load_chunks, sample};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// =============================================================================
// Helper Functions
// =============================================================================

fn clf_line(ip: &str, second: u32, method: &str) -> String {
    format!(
        r#"{ip} - - [22/Jan/2019:03:56:{second:02} +0330] "{method} /p/{second} HTTP/1.1" 200 {size} "-" "agent""#,
        size = 100 + second
    )
}

fn write_log(path: &Path, lines: &[String]) {
    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(path, text).unwrap();
}

// =============================================================================
// LogReader
// =============================================================================

#[test]
fn test_read_parses_all_valid_lines() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("access.log");
    write_log(
        &log,
        &[
            clf_line("1.1.1.1", 1, "GET"),
            clf_line("2.2.2.2", 2, "POST"),
            clf_line("1.1.1.1", 3, "GET"),
        ],
    );

    let outcome = LogReader::new(10)
        .read(&log, &dir.path().join("chunks"), &dir.path().join("errors.txt"))
        .unwrap();

    assert_eq!(outcome.parsed, 3);
    assert_eq!(outcome.rejected, 0);
    assert_eq!(outcome.frame.height(), 3);
    assert_eq!(outcome.chunks.len(), 1);
    assert!(outcome.chunks[0].ends_with("file_3.jsonl"));
    assert!(!dir.path().join("errors.txt").exists());
    assert_eq!(
        outcome.frame.column("method").unwrap().values[1],
        Value::from("POST")
    );
}

#[test]
fn test_read_writes_rejects_to_errors_file() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("access.log");
    write_log(
        &log,
        &[
            clf_line("1.1.1.1", 1, "GET"),
            "this is not a log line".to_string(),
            clf_line("2.2.2.2", 2, "GET"),
        ],
    );
    let errors = dir.path().join("errors.txt");

    let outcome = LogReader::new(10)
        .read(&log, &dir.path().join("chunks"), &errors)
        .unwrap();

    assert_eq!(outcome.parsed, 2);
    assert_eq!(outcome.rejected, 1);

    let text = fs::read_to_string(&errors).unwrap();
    let entry: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(entry["line"], 2);
    assert_eq!(entry["content"], "this is not a log line");
    assert!(entry["error"].as_str().unwrap().contains("combined log format"));
}

#[test]
fn test_read_splits_into_chunks() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("access.log");
    let lines: Vec<String> = (0..5).map(|i| clf_line("1.1.1.1", i, "GET")).collect();
    write_log(&log, &lines);
    let chunk_dir = dir.path().join("chunks");

    let outcome = LogReader::new(2)
        .read(&log, &chunk_dir, &dir.path().join("errors.txt"))
        .unwrap();

    let names: Vec<String> = outcome
        .chunks
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["file_2.jsonl", "file_4.jsonl", "file_5.jsonl"]);
    assert_eq!(outcome.frame.height(), 5);
}

#[test]
fn test_read_exact_multiple_keeps_last_chunk() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("access.log");
    let lines: Vec<String> = (0..4).map(|i| clf_line("1.1.1.1", i, "GET")).collect();
    write_log(&log, &lines);
    let chunk_dir = dir.path().join("chunks");

    let outcome = LogReader::new(2)
        .read(&log, &chunk_dir, &dir.path().join("errors.txt"))
        .unwrap();

    assert_eq!(outcome.chunks.len(), 2);
    let reloaded = load_chunks(&chunk_dir).unwrap();
    assert_eq!(reloaded.height(), 4);
}

#[test]
fn test_read_empty_file_yields_single_empty_chunk() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("access.log");
    fs::write(&log, "").unwrap();

    let outcome = LogReader::default()
        .read(&log, &dir.path().join("chunks"), &dir.path().join("errors.txt"))
        .unwrap();

    assert_eq!(outcome.parsed, 0);
    assert_eq!(outcome.chunks.len(), 1);
    assert!(outcome.chunks[0].ends_with("file_0.jsonl"));
    assert_eq!(outcome.frame.shape(), (0, 9));
}

#[test]
fn test_read_removes_stale_chunks() {
    let dir = tempdir().unwrap();
    let chunk_dir = dir.path().join("chunks");
    fs::create_dir_all(&chunk_dir).unwrap();
    fs::write(chunk_dir.join("file_999.jsonl"), "garbage\n").unwrap();
    fs::write(chunk_dir.join("notes.txt"), "keep me").unwrap();

    let log = dir.path().join("access.log");
    write_log(&log, &[clf_line("1.1.1.1", 1, "GET")]);
    LogReader::new(10)
        .read(&log, &chunk_dir, &dir.path().join("errors.txt"))
        .unwrap();

    assert!(!chunk_dir.join("file_999.jsonl").exists());
    assert!(chunk_dir.join("notes.txt").exists());
    assert_eq!(load_chunks(&chunk_dir).unwrap().height(), 1);
}

#[test]
fn test_read_missing_logfile_is_io_error() {
    let dir = tempdir().unwrap();
    let err = LogReader::default()
        .read(
            &dir.path().join("missing.log"),
            &dir.path().join("chunks"),
            &dir.path().join("errors.txt"),
        )
        .unwrap_err();
    assert!(matches!(err, logscope_core::LogscopeError::Io(_)));
}

// =============================================================================
// load_chunks
// =============================================================================

#[test]
fn test_load_chunks_orders_numerically() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("access.log");
    let lines: Vec<String> = (0..12).map(|i| clf_line("1.1.1.1", i, "GET")).collect();
    write_log(&log, &lines);
    let chunk_dir = dir.path().join("chunks");
    // file_5, file_10, file_12: lexical order would put file_10 first.
    LogReader::new(5)
        .read(&log, &chunk_dir, &dir.path().join("errors.txt"))
        .unwrap();

    let frame = load_chunks(&chunk_dir).unwrap();
    let requests = &frame.column("request").unwrap().values;
    assert_eq!(requests[0], Value::from("/p/0"));
    assert_eq!(requests[11], Value::from("/p/11"));
}

#[test]
fn test_load_chunks_reports_malformed_line() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("file_1.jsonl"), "{not json}\n").unwrap();
    let err = load_chunks(dir.path()).unwrap_err();
    assert!(err.to_string().contains("file_1.jsonl:1"));
}

// =============================================================================
// sample
// =============================================================================

#[test]
fn test_sample_drops_partial_trailing_line() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("big.log");
    fs::write(&input, "aaaa\nbbbb\ncccc\n").unwrap();
    let output = dir.path().join("small.log");

    // Budget ends in the middle of the third line.
    let outcome = sample(&input, &output, 12).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "aaaa\nbbbb\n");
    assert_eq!(outcome.lines, 2);
    assert_eq!(outcome.bytes_written, 10);
}

#[test]
fn test_sample_budget_larger_than_file_copies_everything() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("big.log");
    fs::write(&input, "aaaa\nbbbb\n").unwrap();
    let output = dir.path().join("out/small.log");

    let outcome = sample(&input, &output, 1 << 20).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "aaaa\nbbbb\n");
    assert_eq!(outcome.lines, 2);
}

#[test]
fn test_sample_budget_smaller_than_first_line_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("big.log");
    fs::write(&input, "aaaaaaaa\n").unwrap();
    let output = dir.path().join("small.log");

    let outcome = sample(&input, &output, 3).unwrap();

    assert_eq!(outcome.lines, 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "");
}
