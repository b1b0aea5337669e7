use logscope_core::frame::{Column, Frame, Value};
use logscope_core::LogscopeError;
use tracing::{debug, info};

/// Min-max scale each listed column into `[0, 1]`, then move the scaled
/// columns to the front in the order given. Duplicates in `columns` are
/// ignored after their first occurrence.
///
/// A constant column scales to all zeros. Missing cells stay missing.
pub fn normalize(frame: &mut Frame, columns: &[&str]) -> Result<(), LogscopeError> {
    let mut targets: Vec<&str> = Vec::with_capacity(columns.len());
    for name in columns {
        if !targets.contains(name) {
            targets.push(name);
        }
    }

    // Validate everything before touching the frame.
    for name in &targets {
        let column = frame.column(name)?;
        if let Some(bad) = column.values.iter().find_map(|v| match v.dtype() {
            Some(dt) if !dt.is_numeric() => Some(dt),
            _ => None,
        }) {
            return Err(LogscopeError::InvalidColumnType {
                column: name.to_string(),
                dtype: bad.to_string(),
                operation: "normalization",
            });
        }
    }

    for name in &targets {
        let column = frame.column_mut(name)?;
        let scaled = min_max(column);
        debug!(column = *name, "Scaled column");
        *column = Column::new(*name, scaled);
    }
    frame.move_to_front(&targets)?;
    info!(columns = ?targets, "Normalized columns");
    Ok(())
}

fn min_max(column: &Column) -> Vec<Value> {
    let present = column.numeric_values();
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    column
        .values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) if range > 0.0 => Value::Float((x - min) / range),
            Some(_) => Value::Float(0.0),
            None => Value::Null,
        })
        .collect()
}
