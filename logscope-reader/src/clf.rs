//! Combined Log Format line parser.
//!
//! ```text
//! 54.36.149.41 - - [22/Jan/2019:03:56:14 +0330] "GET /filter/27 HTTP/1.1" 200 30577 "-" "Mozilla/5.0"
//! ```
//!
//! The pattern anchors at the start of the line and stops after the user
//! agent's opening quote, so trailing fields some servers append are ignored.

use logscope_core::record::AccessRecord;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const CLF_PATTERN: &str = concat!(
    r#"^(?P<client>\S+) \S+ (?P<userid>\S+) \[(?P<datetime>[^\]]+)\] "#,
    r#""(?P<method>[A-Z]+) (?P<request>[^ "]+)? HTTP/[0-9.]+" "#,
    r#"(?P<status>[0-9]{3}) (?P<size>[0-9]+|-) "#,
    r#""(?P<referer>[^"]*)" "(?P<user_agent>[^"]*)"#,
);

static CLF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CLF_PATTERN).expect("CLF pattern is a valid regex"));

/// Why a line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line does not match the combined log format")]
    NoMatch,

    #[error("invalid timestamp {0:?} (expected dd/Mon/yyyy:HH:MM:SS +zzzz)")]
    BadTimestamp(String),

    #[error("invalid status code {0:?}")]
    BadStatus(String),

    #[error("invalid response size {0:?}")]
    BadSize(String),
}

/// Parse one access-log line.
pub fn parse_line(line: &str) -> Result<AccessRecord, ParseError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let caps = CLF_REGEX.captures(line).ok_or(ParseError::NoMatch)?;
    let field = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or_default();

    let raw_dt = field("datetime");
    let datetime = AccessRecord::parse_datetime(raw_dt)
        .ok_or_else(|| ParseError::BadTimestamp(raw_dt.to_string()))?;

    let raw_status = field("status");
    let status = raw_status
        .parse::<u16>()
        .map_err(|_| ParseError::BadStatus(raw_status.to_string()))?;

    let raw_size = field("size");
    let size_in_bytes = match raw_size {
        "-" => 0,
        s => s
            .parse::<u64>()
            .ok()
            .filter(|n| i64::try_from(*n).is_ok())
            .ok_or_else(|| ParseError::BadSize(s.to_string()))?,
    };

    Ok(AccessRecord {
        client: field("client").to_string(),
        userid: field("userid").to_string(),
        datetime,
        method: field("method").to_string(),
        request: field("request").to_string(),
        status,
        size_in_bytes,
        referer: field("referer").to_string(),
        user_agent: field("user_agent").to_string(),
    })
}
