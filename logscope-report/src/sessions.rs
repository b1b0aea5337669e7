use logscope_core::frame::Frame;
use logscope_core::LogscopeError;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCount {
    pub session_id: String,
    pub num_requests: usize,
}

/// Number of requests per session id in `column`, busiest session first.
/// Ties are ordered by id. Missing ids are not counted.
pub fn requests_per_session(
    frame: &Frame,
    column: &str,
) -> Result<Vec<SessionCount>, LogscopeError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in &frame.column(column)?.values {
        if value.is_missing() {
            continue;
        }
        *counts.entry(value.to_string()).or_default() += 1;
    }

    let mut ranked: Vec<SessionCount> = counts
        .into_iter()
        .map(|(session_id, num_requests)| SessionCount {
            session_id,
            num_requests,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.num_requests
            .cmp(&a.num_requests)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    Ok(ranked)
}

pub fn top_n(ranked: &[SessionCount], n: usize) -> &[SessionCount] {
    &ranked[..n.min(ranked.len())]
}
