//! Plain-text rendering for the terminal report.

use crate::sessions::SessionCount;
use logscope_core::frame::{Frame, Value};
use std::fmt::Write;

/// Longest bar of the session chart, in characters.
const BAR_WIDTH: usize = 40;
/// Cells wider than this are cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 32;

/// Render rows under a header as an aligned table. Numeric-looking cells are
/// right-aligned.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                if cell.parse::<f64>().is_ok() {
                    format!("{cell:>w$}")
                } else {
                    format!("{cell:<w$}")
                }
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join("  ").trim_end());
    }
    out
}

/// Render a frame (typically its head) as a table.
pub fn render_frame(frame: &Frame) -> String {
    let headers = frame.column_names();
    let rows: Vec<Vec<String>> = (0..frame.height())
        .filter_map(|i| frame.row(i))
        .map(|row| row.into_iter().map(cell).collect())
        .collect();
    render_table(&headers, &rows)
}

/// Horizontal bar chart of request counts, one line per session.
pub fn render_bar_chart(sessions: &[SessionCount]) -> String {
    let Some(max) = sessions.iter().map(|s| s.num_requests).max() else {
        return String::from("(no sessions)\n");
    };
    let label_width = sessions
        .iter()
        .map(|s| s.session_id.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for s in sessions {
        let len = if max == 0 {
            0
        } else {
            (s.num_requests * BAR_WIDTH).div_ceil(max)
        };
        let _ = writeln!(
            out,
            "{:<label_width$} | {} {}",
            s.session_id,
            "#".repeat(len),
            s.num_requests
        );
    }
    out
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Float(f) if !f.is_nan() => format!("{f:.4}"),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        let cut: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_core::frame::Column;

    #[test]
    fn table_aligns_columns() {
        let out = render_table(
            &["name", "n"],
            &[
                vec!["alpha".into(), "1".into()],
                vec!["b".into(), "100".into()],
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name   n");
        assert_eq!(lines[1], "-----  ---");
        assert_eq!(lines[2], "alpha    1");
        assert_eq!(lines[3], "b      100");
    }

    #[test]
    fn frame_cells_are_formatted_and_truncated() {
        let long = "x".repeat(100);
        let frame = Frame::from_columns(vec![
            Column::new("f", vec![Value::Float(0.5)]),
            Column::new("t", vec![long.into()]),
        ])
        .unwrap();
        let out = render_frame(&frame);
        assert!(out.contains("0.5000"));
        assert!(out.contains('…'));
        assert!(!out.contains(&"x".repeat(MAX_CELL_WIDTH)));
    }

    #[test]
    fn bar_chart_scales_to_busiest_session() {
        let sessions = vec![
            SessionCount {
                session_id: "a_0".into(),
                num_requests: 10,
            },
            SessionCount {
                session_id: "b_1".into(),
                num_requests: 5,
            },
        ];
        let out = render_bar_chart(&sessions);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], format!("a_0 | {} 10", "#".repeat(BAR_WIDTH)));
        assert_eq!(lines[1], format!("b_1 | {} 5", "#".repeat(BAR_WIDTH / 2)));
    }

    #[test]
    fn empty_chart_says_so() {
        assert_eq!(render_bar_chart(&[]), "(no sessions)\n");
    }
}
