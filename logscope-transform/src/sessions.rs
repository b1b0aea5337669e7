//! Session reconstruction.
//!
//! Rows are stably sorted by (client, datetime). Walking the sorted rows, a
//! request from the same client that comes more than `minutes` after the
//! previous one opens a new session. The session counter is shared by all
//! clients and only moves on such gaps, so the id `"{client}_{counter}"` is
//! unique while the number alone is not.

use crate::deltas::{millis_between, time_values};
use crate::{CLIENT_COLUMN, DATETIME_COLUMN, SESSION_DELTA_COLUMN, SESSION_ID_COLUMN};
use chrono::{DateTime, FixedOffset};
use logscope_core::frame::{Column, Frame, Value};
use logscope_core::LogscopeError;
use std::cmp::Ordering;
use tracing::info;

/// Sort rows by (client, datetime) and add `session_global_id` and
/// `datetime_delta_ms_in_session`. The frame is left in sorted order.
///
/// Rows missing a client or a timestamp sort last and get missing values in
/// both new columns.
pub fn add_session_info(frame: &mut Frame, minutes: u64) -> Result<(), LogscopeError> {
    info!(
        minutes,
        "Adding {SESSION_ID_COLUMN} and {SESSION_DELTA_COLUMN}"
    );
    let clients = client_values(frame)?;
    let times = time_values(frame, DATETIME_COLUMN, "sessionization")?;
    let gap_ms = minutes.saturating_mul(60_000) as f64;

    let mut order: Vec<usize> = (0..frame.height()).collect();
    order.sort_by(|&a, &b| {
        cmp_missing_last(clients[a].as_deref(), clients[b].as_deref())
            .then_with(|| cmp_missing_last(times[a], times[b]))
    });

    let mut session_ids = Vec::with_capacity(order.len());
    let mut session_deltas = Vec::with_capacity(order.len());
    let mut counter: u64 = 0;
    let mut prev: Option<(&str, DateTime<FixedOffset>)> = None;

    for &row in &order {
        let (Some(client), Some(t)) = (clients[row].as_deref(), times[row]) else {
            session_ids.push(Value::Null);
            session_deltas.push(Value::Null);
            continue;
        };

        let delta = match prev {
            Some((prev_client, prev_t)) if prev_client == client => {
                let elapsed = millis_between(prev_t, t);
                if elapsed > gap_ms {
                    counter += 1;
                    0.0
                } else {
                    elapsed
                }
            }
            _ => 0.0,
        };

        session_ids.push(Value::Text(format!("{client}_{counter}")));
        session_deltas.push(Value::Float(delta));
        prev = Some((client, t));
    }

    let mut sorted = frame.take(&order);
    sorted.push_column(Column::new(SESSION_ID_COLUMN, session_ids))?;
    sorted.push_column(Column::new(SESSION_DELTA_COLUMN, session_deltas))?;
    *frame = sorted;
    Ok(())
}

fn client_values(frame: &Frame) -> Result<Vec<Option<String>>, LogscopeError> {
    frame
        .column(CLIENT_COLUMN)?
        .values
        .iter()
        .map(|v| match v {
            Value::Text(s) => Ok(Some(s.clone())),
            v if v.is_missing() => Ok(None),
            other => Err(LogscopeError::InvalidColumnType {
                column: CLIENT_COLUMN.to_string(),
                dtype: other.dtype().map(|d| d.to_string()).unwrap_or_default(),
                operation: "sessionization",
            }),
        })
        .collect()
}

fn cmp_missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
