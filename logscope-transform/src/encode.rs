use logscope_core::frame::{Column, Frame, Value};
use logscope_core::LogscopeError;
use std::collections::BTreeSet;
use tracing::info;

/// Category used for missing cells.
const MISSING_CATEGORY: &str = "null";

/// Replace each listed column with one 0/1 column per distinct value, named
/// `{column}_{value}`. Categories are sorted; the encoded columns come first,
/// in the order the source columns were listed.
pub fn one_hot(frame: &mut Frame, columns: &[&str]) -> Result<(), LogscopeError> {
    let mut encoded: Vec<Column> = Vec::new();
    for name in columns {
        let source = frame.column(name)?;
        let labels: Vec<String> = source.values.iter().map(label).collect();
        let categories: BTreeSet<&str> = labels.iter().map(String::as_str).collect();

        for category in categories {
            let new_name = format!("{name}_{category}");
            if encoded.iter().any(|c| c.name == new_name)
                || (frame.has_column(&new_name) && !columns.contains(&new_name.as_str()))
            {
                return Err(LogscopeError::ColumnExists(new_name));
            }
            let values = labels
                .iter()
                .map(|l| Value::Float(if l == category { 1.0 } else { 0.0 }))
                .collect();
            encoded.push(Column::new(new_name, values));
        }
        info!(column = *name, "One-hot encoded column");
    }

    for name in columns {
        frame.drop_column(name)?;
    }
    let new_names: Vec<String> = encoded.iter().map(|c| c.name.clone()).collect();
    for column in encoded {
        frame.push_column(column)?;
    }
    let front: Vec<&str> = new_names.iter().map(String::as_str).collect();
    frame.move_to_front(&front)
}

fn label(value: &Value) -> String {
    if value.is_missing() {
        MISSING_CATEGORY.to_string()
    } else {
        value.to_string()
    }
}
