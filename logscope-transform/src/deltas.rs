use crate::DATETIME_COLUMN;
use chrono::{DateTime, FixedOffset};
use logscope_core::frame::{Column, Frame, Value};
use logscope_core::LogscopeError;
use tracing::info;

/// Milliseconds from `earlier` to `later`.
pub(crate) fn millis_between(earlier: DateTime<FixedOffset>, later: DateTime<FixedOffset>) -> f64 {
    (later - earlier).num_milliseconds() as f64
}

/// Timestamps of `column`, `None` for missing cells. Any other cell type is an error.
pub(crate) fn time_values(
    frame: &Frame,
    column: &str,
    operation: &'static str,
) -> Result<Vec<Option<DateTime<FixedOffset>>>, LogscopeError> {
    frame
        .column(column)?
        .values
        .iter()
        .map(|v| match v {
            Value::Time(t) => Ok(Some(*t)),
            v if v.is_missing() => Ok(None),
            other => Err(LogscopeError::InvalidColumnType {
                column: column.to_string(),
                dtype: other.dtype().map(|d| d.to_string()).unwrap_or_default(),
                operation,
            }),
        })
        .collect()
}

/// Add `new_col`: milliseconds elapsed since the previous row's request, in
/// the frame's current row order. The first row (and any row next to a missing
/// timestamp) gets a missing value.
pub fn add_request_deltas(frame: &mut Frame, new_col: &str) -> Result<(), LogscopeError> {
    info!(column = new_col, "Adding time between consecutive requests");
    let times = time_values(frame, DATETIME_COLUMN, "request deltas")?;

    let mut deltas = Vec::with_capacity(times.len());
    let mut prev: Option<DateTime<FixedOffset>> = None;
    for t in &times {
        let delta = match (prev, t) {
            (Some(p), Some(t)) => Value::Float(millis_between(p, *t)),
            _ => Value::Null,
        };
        deltas.push(delta);
        prev = *t;
    }

    frame.push_column(Column::new(new_col, deltas))
}
