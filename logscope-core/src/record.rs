use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Timestamp layout used by Common Log Format, e.g. `10/Oct/2000:13:55:36 -0700`.
pub const CLF_DATETIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Column order produced for a freshly parsed log.
pub const RECORD_COLUMNS: [&str; 9] = [
    "client",
    "userid",
    "datetime",
    "method",
    "request",
    "status",
    "size_in_bytes",
    "referer",
    "user_agent",
];

/// One parsed access-log line (combined log format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    /// Remote host as written by the server (usually an IP address).
    pub client: String,

    /// Authenticated user, `-` when absent.
    pub userid: String,

    pub datetime: DateTime<FixedOffset>,

    pub method: String,

    /// Request target. Empty when the request line carried none.
    #[serde(default)]
    pub request: String,

    pub status: u16,

    /// Response body size. A `-` in the log is read as 0.
    pub size_in_bytes: u64,

    #[serde(default)]
    pub referer: String,

    #[serde(default)]
    pub user_agent: String,
}

impl AccessRecord {
    /// Parse a CLF timestamp.
    pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_str(raw, CLF_DATETIME_FORMAT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_clf_timestamp_with_offset() {
        let dt = AccessRecord::parse_datetime("22/Jan/2019:03:56:14 +0330").unwrap();
        assert_eq!(dt.year(), 2019);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.offset().local_minus_utc(), 3 * 3600 + 30 * 60);
    }

    #[test]
    fn rejects_iso_timestamp() {
        assert!(AccessRecord::parse_datetime("2019-01-22T03:56:14+03:30").is_none());
    }

    #[test]
    fn record_deserializes_without_optional_text_fields() {
        let json = r#"{
            "client": "1.2.3.4",
            "userid": "-",
            "datetime": "2019-01-22T03:56:14+03:30",
            "method": "GET",
            "status": 200,
            "size_in_bytes": 10
        }"#;
        let rec: AccessRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.client, "1.2.3.4");
        assert!(rec.request.is_empty());
        assert!(rec.referer.is_empty());
        assert!(rec.user_agent.is_empty());
    }
}
