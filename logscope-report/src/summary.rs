//! Column summaries: the non-null/dtype listing and the numeric statistics table.

use logscope_core::frame::{Column, DType, Frame};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub column: String,
    pub non_null: usize,
    pub dtype: DType,
}

/// Statistics of one numeric column. Missing cells are skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN with fewer than two values.
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

pub fn info(frame: &Frame) -> Vec<ColumnInfo> {
    frame
        .columns()
        .iter()
        .map(|c| ColumnInfo {
            column: c.name.clone(),
            non_null: c.non_null_count(),
            dtype: c.dtype(),
        })
        .collect()
}

/// Statistics for every numeric column, in column order. Columns whose
/// present cells are all numbers count as numeric; all-missing columns are skipped.
pub fn describe(frame: &Frame) -> Vec<ColumnStats> {
    frame
        .columns()
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .map(column_stats)
        .collect()
}

fn column_stats(column: &Column) -> ColumnStats {
    let mut values = column.numeric_values();
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    ColumnStats {
        column: column.name.clone(),
        count,
        mean,
        std,
        min: quantile(&values, 0.0),
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.5),
        p75: quantile(&values, 0.75),
        max: quantile(&values, 1.0),
    }
}

/// Linear-interpolation quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}
