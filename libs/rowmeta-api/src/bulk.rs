use crate::value::{Row, Value};

/// Collects positional parameter rows for a bulk SQL operation.
///
/// Values are appended to the current row with [`add`](BulkData::add); the
/// row is committed with [`push_row`](BulkData::push_row), once per row and
/// before the bulk operation runs.
#[derive(Debug, Clone, Default)]
pub struct BulkData {
    rows: Vec<Row>,
    current: Row,
}

impl BulkData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to the row being built.
    pub fn add<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.current.0.extend(values.into_iter().map(Into::into));
    }

    /// Commit the row being built and start a new one.
    pub fn push_row(&mut self) {
        self.rows.push(std::mem::take(&mut self.current));
    }

    /// Committed rows. The uncommitted row is not included.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn current(&self) -> &Row {
        &self.current
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.current = Row::default();
    }
}
