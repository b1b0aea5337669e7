//! A small column-oriented table.
//!
//! Every pipeline stage after parsing works on a [`Frame`]: enrichment adds
//! columns, cleaning drops rows and columns, scaling and encoding rewrite
//! columns in place. Columns are addressed by name, all columns have the same
//! length, and names are unique.

use crate::error::LogscopeError;
use crate::record::{AccessRecord, RECORD_COLUMNS};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// ── Value ─────────────────────────────────────────────────────

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Time(DateTime<FixedOffset>),
}

impl Value {
    /// `Null` and `Float(NaN)` are both missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Missing and non-numeric cells yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Type of a present cell; `None` for missing cells.
    pub fn dtype(&self) -> Option<DType> {
        if self.is_missing() {
            return None;
        }
        Some(match self {
            Value::Int(_) => DType::Int,
            Value::Float(_) => DType::Float,
            Value::Text(_) => DType::Text,
            Value::Time(_) => DType::Time,
            Value::Null => DType::Null,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(*i),
            // NaN has no JSON representation; serde_json maps it to null.
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Text(s) => serde_json::Value::from(s.as_str()),
            Value::Time(t) => {
                serde_json::Value::from(t.to_rfc3339_opts(SecondsFormat::Secs, false))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => write!(f, "NaN"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%:z")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ── DType ─────────────────────────────────────────────────────

/// Column type as reported by `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int,
    Float,
    Text,
    Time,
    /// Every cell is missing.
    Null,
    /// More than one present type.
    Mixed,
}

impl DType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int | DType::Float)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::Int => "int",
            DType::Float => "float",
            DType::Text => "text",
            DType::Time => "time",
            DType::Null => "null",
            DType::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

// ── Column ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Int and Float together count as Float.
    pub fn dtype(&self) -> DType {
        let mut seen: Option<DType> = None;
        for dt in self.values.iter().filter_map(Value::dtype) {
            seen = Some(match (seen, dt) {
                (None, dt) => dt,
                (Some(a), b) if a == b => a,
                (Some(a), b) if a.is_numeric() && b.is_numeric() => DType::Float,
                _ => return DType::Mixed,
            });
        }
        seen.unwrap_or(DType::Null)
    }

    /// Present numeric cells, skipping missing ones.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }
}

// ── Frame ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from columns, enforcing equal lengths and unique names.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, LogscopeError> {
        let mut frame = Frame::new();
        for column in columns {
            frame.push_column(column)?;
        }
        Ok(frame)
    }

    pub fn from_records(records: &[AccessRecord]) -> Self {
        let mut columns: Vec<Column> = RECORD_COLUMNS
            .iter()
            .map(|name| Column::new(*name, Vec::with_capacity(records.len())))
            .collect();
        for r in records {
            columns[0].values.push(Value::from(r.client.as_str()));
            columns[1].values.push(Value::from(r.userid.as_str()));
            columns[2].values.push(Value::Time(r.datetime));
            columns[3].values.push(Value::from(r.method.as_str()));
            columns[4].values.push(Value::from(r.request.as_str()));
            columns[5].values.push(Value::Int(i64::from(r.status)));
            columns[6].values.push(Value::Int(i64::try_from(r.size_in_bytes).unwrap_or(i64::MAX)));
            columns[7].values.push(Value::from(r.referer.as_str()));
            columns[8].values.push(Value::from(r.user_agent.as_str()));
        }
        Self { columns }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, LogscopeError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| LogscopeError::ColumnNotFound(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, LogscopeError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| LogscopeError::ColumnNotFound(name.to_string()))
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, column: Column) -> Result<(), LogscopeError> {
        if self.has_column(&column.name) {
            return Err(LogscopeError::ColumnExists(column.name));
        }
        if !self.columns.is_empty() && column.len() != self.height() {
            let actual = column.len();
            return Err(LogscopeError::LengthMismatch {
                column: column.name,
                expected: self.height(),
                actual,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Append a column, replacing any existing column of the same name in place.
    pub fn set_column(&mut self, column: Column) -> Result<(), LogscopeError> {
        match self.position(&column.name) {
            Some(idx) => {
                if column.len() != self.height() {
                    let actual = column.len();
                    return Err(LogscopeError::LengthMismatch {
                        column: column.name,
                        expected: self.height(),
                        actual,
                    });
                }
                self.columns[idx] = column;
                Ok(())
            }
            None => self.push_column(column),
        }
    }

    /// Remove and return a column.
    pub fn drop_column(&mut self, name: &str) -> Result<Column, LogscopeError> {
        let idx = self
            .position(name)
            .ok_or_else(|| LogscopeError::ColumnNotFound(name.to_string()))?;
        Ok(self.columns.remove(idx))
    }

    /// Move the named columns to the front, in the given order.
    pub fn move_to_front(&mut self, names: &[&str]) -> Result<(), LogscopeError> {
        let mut front = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .position(name)
                .ok_or_else(|| LogscopeError::ColumnNotFound(name.to_string()))?;
            front.push(self.columns.remove(idx));
        }
        front.append(&mut self.columns);
        self.columns = front;
        Ok(())
    }

    /// Gather rows by index. Indices may repeat or reorder rows.
    ///
    /// # Panics
    ///
    /// Panics if any index is `>= self.height()`.
    pub fn take(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    c.name.clone(),
                    indices.iter().map(|&i| c.values[i].clone()).collect(),
                )
            })
            .collect();
        Frame { columns }
    }

    /// Keep rows whose mask entry is `true`.
    pub fn filter(&self, mask: &[bool]) -> Frame {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        self.take(&indices)
    }

    /// Cells of row `i`, in column order.
    pub fn row(&self, i: usize) -> Option<Vec<&Value>> {
        if i >= self.height() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[i]).collect())
    }

    pub fn head(&self, n: usize) -> Frame {
        let n = n.min(self.height());
        let indices: Vec<usize> = (0..n).collect();
        self.take(&indices)
    }

    /// Append the rows of `other`. Both frames must have the same column names
    /// in the same order (an empty frame adopts `other`).
    pub fn vstack(&mut self, other: Frame) -> Result<(), LogscopeError> {
        if self.columns.is_empty() {
            self.columns = other.columns;
            return Ok(());
        }
        if self.column_names() != other.column_names() {
            return Err(LogscopeError::SchemaMismatch(format!(
                "expected [{}], got [{}]",
                self.column_names().join(", "),
                other.column_names().join(", ")
            )));
        }
        for (mine, theirs) in self.columns.iter_mut().zip(other.columns) {
            mine.values.extend(theirs.values);
        }
        Ok(())
    }

    /// Write one JSON object per row, keys in column order.
    pub fn write_jsonl<W: Write>(&self, mut out: W) -> Result<(), LogscopeError> {
        for i in 0..self.height() {
            serde_json::to_writer(&mut out, &RowRef { frame: self, row: i })?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_jsonl_file(&self, path: &Path) -> Result<(), LogscopeError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_jsonl(BufWriter::new(file))
    }
}

struct RowRef<'a> {
    frame: &'a Frame,
    row: usize,
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.frame.width()))?;
        for column in &self.frame.columns {
            map.serialize_entry(&column.name, &column.values[self.row])?;
        }
        map.end()
    }
}
