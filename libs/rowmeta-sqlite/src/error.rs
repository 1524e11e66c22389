#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("query failed ({sql}): {source}")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// Attach the statement text to an engine error.
    pub fn query(sql: &str, source: rusqlite::Error) -> Self {
        StoreError::Query {
            sql: sql.to_string(),
            source,
        }
    }
}
