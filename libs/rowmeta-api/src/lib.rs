// Lets the derive's `rowmeta_api::...` paths resolve inside this crate.
extern crate self as rowmeta_api;

pub mod accessor;
pub mod binding;
pub mod bulk;
pub mod config;
pub mod crypto;
pub mod error;
pub mod meta;
pub mod record;
pub mod source;
pub mod value;

pub use rowmeta_api_derive::RowBinding;

pub use accessor::{Accessor, FromValue};
pub use binding::RowBinding;
pub use crypto::Crypto;
pub use error::{ErrorKind, RowMetaError};
pub use meta::{MetaEntry, MetaNode};
pub use record::{ChangeHooks, Record, RecordSliceExt};
pub use source::{ColumnKind, RowSource, ValueRow};
pub use value::{Row, Value};
