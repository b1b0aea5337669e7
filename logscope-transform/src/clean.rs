use logscope_core::frame::Frame;
use logscope_core::LogscopeError;
use serde::Serialize;
use tracing::info;

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingInfo {
    pub column: String,
    pub missing: usize,
    /// Share of missing cells, 0–100, rounded to two decimals.
    pub percentage: f64,
}

/// Drop every row with at least one missing cell. Returns the number of rows removed.
pub fn drop_null_rows(frame: &mut Frame) -> usize {
    let before = frame.height();
    let mask: Vec<bool> = (0..before)
        .map(|i| frame.columns().iter().all(|c| !c.values[i].is_missing()))
        .collect();
    if mask.iter().all(|keep| *keep) {
        return 0;
    }
    *frame = frame.filter(&mask);
    let removed = before - frame.height();
    info!(removed, remaining = frame.height(), "Dropped rows with missing values");
    removed
}

/// Remove a column by name.
pub fn drop_column(frame: &mut Frame, name: &str) -> Result<(), LogscopeError> {
    frame.drop_column(name)?;
    info!(column = name, "Dropped column");
    Ok(())
}

/// Per-column missing counts, in column order.
pub fn missing_values(frame: &Frame) -> Vec<MissingInfo> {
    let rows = frame.height();
    frame
        .columns()
        .iter()
        .map(|c| {
            let missing = c.null_count();
            let percentage = if rows == 0 {
                0.0
            } else {
                (missing as f64 / rows as f64 * 10_000.0).round() / 100.0
            };
            MissingInfo {
                column: c.name.clone(),
                missing,
                percentage,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_core::frame::{Column, Value};

    fn sample() -> Frame {
        Frame::from_columns(vec![
            Column::new("a", vec![Value::Int(1), Value::Null, Value::Int(3)]),
            Column::new("b", vec!["x".into(), "y".into(), Value::Float(f64::NAN)]),
        ])
        .unwrap()
    }

    #[test]
    fn drop_null_rows_keeps_complete_rows() {
        let mut f = sample();
        assert_eq!(drop_null_rows(&mut f), 2);
        assert_eq!(f.height(), 1);
        assert_eq!(f.column("a").unwrap().values, vec![Value::Int(1)]);
    }

    #[test]
    fn drop_null_rows_on_complete_frame_is_noop() {
        let mut f = Frame::from_columns(vec![Column::new("a", vec![Value::Int(1)])]).unwrap();
        assert_eq!(drop_null_rows(&mut f), 0);
        assert_eq!(f.height(), 1);
    }

    #[test]
    fn missing_values_reports_percentages() {
        let info = missing_values(&sample());
        assert_eq!(info[0].column, "a");
        assert_eq!(info[0].missing, 1);
        assert_eq!(info[0].percentage, 33.33);
        assert_eq!(info[1].missing, 1);
    }

    #[test]
    fn missing_values_of_empty_frame_are_zero() {
        let f = Frame::from_columns(vec![Column::new("a", vec![])]).unwrap();
        assert_eq!(missing_values(&f)[0].percentage, 0.0);
    }

    #[test]
    fn drop_unknown_column_is_error() {
        let mut f = sample();
        assert!(matches!(
            drop_column(&mut f, "zzz"),
            Err(LogscopeError::ColumnNotFound(_))
        ));
        drop_column(&mut f, "a").unwrap();
        assert_eq!(f.column_names(), vec!["b"]);
    }
}
