//! SQLite row source for `rowmeta-api` records.

pub mod error;
pub mod query;
pub mod source;

pub use error::StoreError;
pub use query::{for_each_record, query_columns, query_records, query_value};
pub use source::{SqliteRow, StatementColumns};
