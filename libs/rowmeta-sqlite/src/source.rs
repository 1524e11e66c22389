use rusqlite::types::{Type, ValueRef};
use rusqlite::{Row, Statement};

use rowmeta_api::source::{ColumnKind, RowSource};

/// The row a `rusqlite` cursor is positioned on.
///
/// Cells that cannot be fetched read as null.
pub struct SqliteRow<'a, 'stmt> {
    row: &'a Row<'stmt>,
}

impl<'a, 'stmt> SqliteRow<'a, 'stmt> {
    pub fn new(row: &'a Row<'stmt>) -> Self {
        Self { row }
    }

    fn cell(&self, index: usize) -> ValueRef<'_> {
        match self.row.get_ref(index) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(index, error = %e, "unreadable cell, treating as null");
                ValueRef::Null
            }
        }
    }
}

impl RowSource for SqliteRow<'_, '_> {
    fn column_count(&self) -> usize {
        self.row.as_ref().column_count()
    }

    fn column_name(&self, index: usize) -> String {
        self.row
            .as_ref()
            .column_name(index)
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn is_null(&self, index: usize) -> bool {
        matches!(self.cell(index), ValueRef::Null)
    }

    fn column_kind(&self, index: usize) -> ColumnKind {
        match self.cell(index).data_type() {
            Type::Integer => ColumnKind::Integer,
            Type::Real => ColumnKind::Float,
            Type::Text => ColumnKind::Text,
            Type::Blob => ColumnKind::Blob,
            Type::Null => ColumnKind::Null,
        }
    }

    fn read_integer(&self, index: usize) -> i64 {
        match self.cell(index) {
            ValueRef::Integer(v) => v,
            _ => 0,
        }
    }

    fn read_float(&self, index: usize) -> f64 {
        match self.cell(index) {
            ValueRef::Real(v) => v,
            ValueRef::Integer(v) => v as f64,
            _ => 0.0,
        }
    }

    fn read_text(&self, index: usize) -> String {
        match self.cell(index) {
            ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            _ => String::new(),
        }
    }

    fn read_blob(&self, index: usize) -> Vec<u8> {
        match self.cell(index) {
            ValueRef::Blob(bytes) => bytes.to_vec(),
            _ => Vec::new(),
        }
    }
}

/// Column names of a prepared statement, with no row behind them. Decoding
/// it yields a columns-only record even for queries that return nothing.
pub struct StatementColumns<'a, 'conn> {
    stmt: &'a Statement<'conn>,
}

impl<'a, 'conn> StatementColumns<'a, 'conn> {
    pub fn new(stmt: &'a Statement<'conn>) -> Self {
        Self { stmt }
    }
}

impl RowSource for StatementColumns<'_, '_> {
    fn column_count(&self) -> usize {
        self.stmt.column_count()
    }

    fn column_name(&self, index: usize) -> String {
        self.stmt
            .column_name(index)
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn is_null(&self, _index: usize) -> bool {
        true
    }

    fn column_kind(&self, _index: usize) -> ColumnKind {
        ColumnKind::Null
    }

    fn read_integer(&self, _index: usize) -> i64 {
        0
    }

    fn read_float(&self, _index: usize) -> f64 {
        0.0
    }

    fn read_text(&self, _index: usize) -> String {
        String::new()
    }

    fn read_blob(&self, _index: usize) -> Vec<u8> {
        Vec::new()
    }
}
