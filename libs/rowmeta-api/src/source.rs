use crate::value::Value;

/// Storage class a row source reports for a column of the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

/// Cursor-like view of the row a result set is currently positioned on.
///
/// [`Record::decode`](crate::record::Record::decode) only reads from it; it
/// never advances the cursor. Indexes are `0..column_count()`.
pub trait RowSource {
    fn column_count(&self) -> usize;
    fn column_name(&self, index: usize) -> String;
    fn is_null(&self, index: usize) -> bool;
    fn column_kind(&self, index: usize) -> ColumnKind;

    fn read_integer(&self, index: usize) -> i64;
    fn read_float(&self, index: usize) -> f64;
    fn read_text(&self, index: usize) -> String;
    fn read_blob(&self, index: usize) -> Vec<u8>;

    /// Decode one cell. The null check precedes type dispatch, so the
    /// declared kind is ignored for absent values. Integers that fit 32 bits
    /// become [`Value::Int`].
    ///
    /// Sources that already hold typed values override this to hand them over
    /// unchanged.
    fn read_value(&self, index: usize) -> Value {
        if self.is_null(index) {
            return Value::Null;
        }
        match self.column_kind(index) {
            ColumnKind::Integer => {
                let v = self.read_integer(index);
                i32::try_from(v).map(Value::Int).unwrap_or(Value::Int64(v))
            }
            ColumnKind::Float => Value::Float64(self.read_float(index)),
            ColumnKind::Text => Value::Text(self.read_text(index)),
            ColumnKind::Blob => Value::Blob(self.read_blob(index)),
            ColumnKind::Null => Value::Null,
        }
    }
}

/// In-memory row of named values. Lets callers build a synthetic row of
/// computed columns and decode it like a database row. Values are decoded
/// exactly as pushed, bools and dates included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    columns: Vec<(String, Value)>,
}

impl ValueRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((name.into(), value.into()));
    }

    fn cell(&self, index: usize) -> &Value {
        self.columns.get(index).map(|(_, v)| v).unwrap_or(&Value::Null)
    }
}

impl RowSource for ValueRow {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> String {
        self.columns
            .get(index)
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }

    fn is_null(&self, index: usize) -> bool {
        self.cell(index).is_null()
    }

    fn column_kind(&self, index: usize) -> ColumnKind {
        match self.cell(index) {
            Value::Null => ColumnKind::Null,
            Value::Int(_) | Value::Int64(_) | Value::Bool(_) => ColumnKind::Integer,
            Value::Float(_) | Value::Float64(_) => ColumnKind::Float,
            Value::Text(_) | Value::Date(_) => ColumnKind::Text,
            Value::Blob(_) => ColumnKind::Blob,
        }
    }

    fn read_integer(&self, index: usize) -> i64 {
        match self.cell(index) {
            Value::Int(v) => i64::from(*v),
            Value::Int64(v) => *v,
            Value::Bool(v) => i64::from(*v),
            _ => 0,
        }
    }

    fn read_float(&self, index: usize) -> f64 {
        match self.cell(index) {
            Value::Float(v) => f64::from(*v),
            Value::Float64(v) => *v,
            _ => 0.0,
        }
    }

    fn read_text(&self, index: usize) -> String {
        self.cell(index).render()
    }

    fn read_blob(&self, index: usize) -> Vec<u8> {
        match self.cell(index) {
            Value::Blob(bytes) => bytes.clone(),
            _ => Vec::new(),
        }
    }

    fn read_value(&self, index: usize) -> Value {
        self.cell(index).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_dispatch_narrows_integers() {
        let row = ValueRow::new()
            .with("small", 7i64)
            .with("big", i64::MAX)
            .with("gone", Value::Null);
        // Bypass the typed override to exercise the storage-class path.
        struct Classes<'a>(&'a ValueRow);
        impl RowSource for Classes<'_> {
            fn column_count(&self) -> usize {
                self.0.column_count()
            }
            fn column_name(&self, index: usize) -> String {
                self.0.column_name(index)
            }
            fn is_null(&self, index: usize) -> bool {
                self.0.is_null(index)
            }
            fn column_kind(&self, index: usize) -> ColumnKind {
                self.0.column_kind(index)
            }
            fn read_integer(&self, index: usize) -> i64 {
                self.0.read_integer(index)
            }
            fn read_float(&self, index: usize) -> f64 {
                self.0.read_float(index)
            }
            fn read_text(&self, index: usize) -> String {
                self.0.read_text(index)
            }
            fn read_blob(&self, index: usize) -> Vec<u8> {
                self.0.read_blob(index)
            }
        }

        let classes = Classes(&row);
        assert_eq!(classes.read_value(0), Value::Int(7));
        assert_eq!(classes.read_value(1), Value::Int64(i64::MAX));
        assert_eq!(classes.read_value(2), Value::Null);
    }

    #[test]
    fn value_row_hands_over_typed_values() {
        let row = ValueRow::new().with("flag", true).with("ratio", 0.1f32);
        assert_eq!(row.read_value(0), Value::Bool(true));
        assert_eq!(row.read_value(1), Value::Float(0.1));
        assert_eq!(row.read_value(5), Value::Null);
    }
}
