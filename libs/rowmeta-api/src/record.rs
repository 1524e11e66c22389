use std::collections::HashMap;
use std::fmt;

use crate::accessor::{Accessor, FromValue};
use crate::config::RecordConfig;
use crate::source::RowSource;
use crate::value::Value;

/// Observer of record mutations.
///
/// `before_change` may veto an assignment by returning `false`; the record is
/// then left untouched, dirty flag included.
pub trait ChangeHooks {
    fn before_change(&mut self, column: &str, new_value: &Value) -> bool {
        let _ = (column, new_value);
        true
    }

    fn after_change(&mut self, column: &str, new_value: &Value) {
        let _ = (column, new_value);
    }
}

/// One row of named, case-insensitively addressed values.
///
/// Built by decoding a [`RowSource`] (a row of a result set, or a synthetic
/// row of computed columns), or empty for manual population.
///
/// Two change concepts coexist:
/// - `is_dirty()`: an assignment happened since decode / `reset_dirty()`.
/// - `signature(true) != signature(false)`: content differs from the decoded
///   baseline.
#[derive(Default)]
pub struct Record {
    /// Canonical names, source order.
    columns: Vec<String>,
    /// Parallel to `columns`.
    values: Vec<Value>,
    /// Lowercased name → position in `columns`.
    key_map: HashMap<String, usize>,
    signature: String,
    dirty: bool,
    allow_new_keys: bool,
    hooks: Option<Box<dyn ChangeHooks>>,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("columns", &self.columns)
            .field("values", &self.values)
            .field("dirty", &self.dirty)
            .field("allow_new_keys", &self.allow_new_keys)
            .finish()
    }
}

/// Deep copy with its own dirty and signature state. Hooks stay with the
/// original.
impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.clone(),
            key_map: self.key_map.clone(),
            signature: self.signature.clone(),
            dirty: self.dirty,
            allow_new_keys: self.allow_new_keys,
            hooks: None,
        }
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured(config: &RecordConfig) -> Self {
        Self {
            allow_new_keys: config.allow_new_keys,
            ..Self::default()
        }
    }

    /// Decode the row `source` is positioned on.
    pub fn from_source<S: RowSource + ?Sized>(source: &S, columns_only: bool) -> Self {
        let mut record = Self::new();
        record.decode(source, columns_only);
        record
    }

    /// Replace the whole record with the row `source` is positioned on.
    ///
    /// With `columns_only`, names are recorded but every value stays null,
    /// which describes a result shape without materialising data. The
    /// baseline signature is recaptured and the dirty flag cleared. Hooks and
    /// the allow-new-keys mode survive.
    pub fn decode<S: RowSource + ?Sized>(&mut self, source: &S, columns_only: bool) {
        self.columns.clear();
        self.values.clear();
        self.key_map.clear();

        let count = source.column_count();
        for index in 0..count {
            let name = source.column_name(index);
            let value = if columns_only {
                Value::Null
            } else {
                source.read_value(index)
            };
            self.insert_column(name, value);
        }

        self.signature = self.compute_signature();
        self.dirty = false;
        tracing::trace!(columns = count, columns_only, "decoded record");
    }

    /// Drop every column and value.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.values.clear();
        self.key_map.clear();
        self.signature = self.compute_signature();
        self.dirty = false;
    }

    pub fn allow_new_keys(&self) -> bool {
        self.allow_new_keys
    }

    /// When enabled, setting an unknown column creates it instead of being
    /// ignored.
    pub fn set_allow_new_keys(&mut self, allow: bool) {
        self.allow_new_keys = allow;
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn ChangeHooks>) {
        self.hooks = Some(hooks);
    }

    pub fn take_hooks(&mut self) -> Option<Box<dyn ChangeHooks>> {
        self.hooks.take()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Canonical column names in source order, minus `excluding`
    /// (case-insensitive).
    pub fn columns(&self, excluding: &[&str]) -> Vec<String> {
        let excluded: Vec<String> = excluding.iter().map(|c| c.to_lowercase()).collect();
        self.columns
            .iter()
            .filter(|c| !excluded.contains(&c.to_lowercase()))
            .cloned()
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.key_map.get(&name.to_lowercase()).copied()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
    }

    /// Baseline signature captured at decode time (`original = true`) or a
    /// fresh one for the current content.
    pub fn signature(&self, original: bool) -> String {
        if original {
            return self.signature.clone();
        }
        self.compute_signature()
    }

    /// Absent columns count as null.
    pub fn is_null(&self, name: &str) -> bool {
        self.value(name).is_none_or(Value::is_null)
    }

    /// Canonical text of a column, or `default` when absent or null.
    pub fn text(&self, name: &str, default: &str) -> String {
        match self.value(name) {
            Some(v) if !v.is_null() => v.render(),
            _ => default.to_string(),
        }
    }

    /// Positional read by source column order.
    pub fn get_at<T: FromValue>(&self, index: usize, default: T) -> T {
        match self.columns.get(index) {
            Some(name) => self.get(name, default),
            None => default,
        }
    }

    pub fn get_opt_at<T: FromValue>(&self, index: usize) -> Option<T> {
        self.columns.get(index).and_then(|name| self.get_opt(name))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Pretty-printed JSON object of the column values.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
    }

    /// Add a column, or overwrite the value of a column already present
    /// under another casing. Returns its position.
    fn insert_column(&mut self, name: String, value: Value) -> usize {
        let key = name.to_lowercase();
        if let Some(&index) = self.key_map.get(&key) {
            self.columns[index] = name;
            self.values[index] = value;
            return index;
        }
        let index = self.columns.len();
        self.columns.push(name);
        self.values.push(value);
        self.key_map.insert(key, index);
        index
    }

    /// Sorted `name<TAB>"value"` pairs, `nil` for nulls.
    fn compute_signature(&self) -> String {
        let mut keys: Vec<(&String, usize)> = self.key_map.iter().map(|(k, &i)| (k, i)).collect();
        keys.sort();
        keys.iter()
            .map(|(key, index)| match &self.values[*index] {
                Value::Null => format!("{key}\tnil"),
                value => format!("{key}\t\"{}\"", value.render()),
            })
            .collect::<Vec<_>>()
            .join("\t")
    }
}

impl Accessor for Record {
    fn has_key(&self, name: &str) -> bool {
        self.key_map.contains_key(&name.to_lowercase())
    }

    fn value(&self, name: &str) -> Option<&Value> {
        self.column_index(name).map(|i| &self.values[i])
    }

    /// Any applied assignment marks the record dirty, even one that stores
    /// the value already present.
    fn put(&mut self, name: &str, value: Value) -> bool {
        let existing = self.column_index(name);
        if existing.is_none() && !self.allow_new_keys {
            tracing::trace!(column = name, "set ignored: unknown column");
            return false;
        }

        let column = match existing {
            Some(index) => self.columns[index].clone(),
            None => name.to_string(),
        };

        if let Some(hooks) = self.hooks.as_mut() {
            if !hooks.before_change(&column, &value) {
                tracing::debug!(column = %column, "set vetoed by change hook");
                return false;
            }
        }

        let index = match existing {
            Some(index) => {
                self.values[index] = value;
                index
            }
            None => self.insert_column(column.clone(), value),
        };
        self.dirty = true;

        if let Some(hooks) = self.hooks.as_mut() {
            hooks.after_change(&column, &self.values[index]);
        }
        true
    }

    /// Columns are never removed: unsetting stores null.
    fn unset(&mut self, name: &str) -> bool {
        self.put(name, Value::Null)
    }
}

/// Helpers over a batch of records from one result set.
pub trait RecordSliceExt {
    /// Columns of the first record, empty for an empty batch.
    fn columns(&self) -> Vec<String>;

    /// `{"rows":[...]}` with one object per record.
    fn to_json_string(&self) -> String;
}

impl RecordSliceExt for [Record] {
    fn columns(&self) -> Vec<String> {
        self.first().map(|r| r.columns(&[])).unwrap_or_default()
    }

    fn to_json_string(&self) -> String {
        let rows: Vec<serde_json::Value> = self.iter().map(Record::to_json).collect();
        serde_json::json!({ "rows": rows }).to_string()
    }
}
