use rusqlite::{Connection, Params};
use tracing::{debug, instrument};

use rowmeta_api::{FromValue, Record};

use crate::error::StoreError;
use crate::source::{SqliteRow, StatementColumns};

/// Stream every result row through one reusable [`Record`].
///
/// The record is re-decoded in place for each row, so `f` sees a fresh
/// baseline and a clean dirty flag every time. Returns the row count.
#[instrument(skip(conn, params, f))]
pub fn for_each_record<P, F>(
    conn: &Connection,
    sql: &str,
    params: P,
    mut f: F,
) -> Result<usize, StoreError>
where
    P: Params,
    F: FnMut(&Record),
{
    let mut stmt = conn.prepare(sql).map_err(|e| StoreError::query(sql, e))?;
    let mut rows = stmt.query(params).map_err(|e| StoreError::query(sql, e))?;

    let mut record = Record::new();
    let mut count = 0usize;
    while let Some(row) = rows.next()? {
        record.decode(&SqliteRow::new(row), false);
        f(&record);
        count += 1;
    }

    debug!(rows = count, "streamed records");
    Ok(count)
}

/// Collect every result row as an independent [`Record`].
pub fn query_records<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    for_each_record(conn, sql, params, |record| records.push(record.clone()))?;
    Ok(records)
}

/// Describe the result shape of `sql` without executing it.
#[instrument(skip(conn))]
pub fn query_columns(conn: &Connection, sql: &str) -> Result<Record, StoreError> {
    let stmt = conn.prepare(sql).map_err(|e| StoreError::query(sql, e))?;
    let record = Record::from_source(&StatementColumns::new(&stmt), true);
    debug!(columns = record.len(), "described statement");
    Ok(record)
}

/// First column of the first row, coerced to `T`.
///
/// An empty result, a null cell or a failed coercion all yield `default`.
pub fn query_value<T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    default: T,
) -> Result<T, StoreError>
where
    T: FromValue,
    P: Params,
{
    let mut stmt = conn.prepare(sql).map_err(|e| StoreError::query(sql, e))?;
    let mut rows = stmt.query(params).map_err(|e| StoreError::query(sql, e))?;

    match rows.next()? {
        Some(row) => Ok(Record::from_source(&SqliteRow::new(row), false).get_at(0, default)),
        None => Ok(default),
    }
}
