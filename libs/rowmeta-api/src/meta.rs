use crate::accessor::Accessor;
use crate::config::MetaConfig;
use crate::crypto::Crypto;
use crate::error::RowMetaError;
use crate::value::Value;

/// Written by [`MetaNode::pairs_to_json`] for a missing value.
pub const NULL_MARKER: &str = "{NULL}";

/// A slot of a [`MetaNode`]: a scalar or a nested tree.
#[derive(Debug, Clone)]
pub enum MetaEntry {
    Value(Value),
    Node(MetaNode),
}

/// Case-insensitive key/value tree with JSON import/export and baseline
/// change detection.
///
/// Keys resolve case-insensitively to the first matching stored key; a new key
/// is stored lowercased. The baseline is the canonical (sorted-key, compact)
/// JSON of the tree, captured at construction, load and
/// [`reset_signature`](MetaNode::reset_signature).
#[derive(Debug, Clone)]
pub struct MetaNode {
    entries: Vec<(String, MetaEntry)>,
    baseline: String,
}

impl Default for MetaNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaNode {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            baseline: "{}".to_string(),
        }
    }

    /// Build from JSON text. Malformed input is logged and yields an empty tree.
    pub fn from_json(json: &str) -> Self {
        let mut node = Self::new();
        node.load(json, true);
        node
    }

    /// Load a JSON object, replacing (`clear = true`) or merging into the
    /// current content.
    ///
    /// - Objects become nested nodes.
    /// - Arrays become one nested node into which every object/array element is
    ///   merged; scalar elements are dropped.
    /// - Integers, booleans, strings and nulls are stored typed; any other
    ///   scalar is stored as its JSON text.
    ///
    /// Parse failures are logged, not returned: the tree keeps whatever state it
    /// reached and the baseline is recaptured regardless.
    pub fn load(&mut self, json: &str, clear: bool) {
        if let Err(e) = self.try_load(json, clear) {
            tracing::warn!(error = %e, "meta json not loaded");
        }
    }

    /// [`load`](MetaNode::load) that also reports the failure.
    pub fn try_load(&mut self, json: &str, clear: bool) -> Result<(), RowMetaError> {
        if clear {
            self.clear();
        }
        let result = match serde_json::from_str::<serde_json::Value>(json) {
            Ok(serde_json::Value::Object(map)) => {
                self.merge_object(&map);
                Ok(())
            }
            Ok(other) => Err(RowMetaError::format(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(e.into()),
        };
        self.reset_signature();
        result
    }

    fn merge_object(&mut self, map: &serde_json::Map<String, serde_json::Value>) {
        for (key, value) in map {
            match value {
                serde_json::Value::Object(inner) => {
                    let mut sub = MetaNode::new();
                    sub.merge_object(inner);
                    self.insert(key, MetaEntry::Node(sub));
                }
                serde_json::Value::Array(items) => {
                    let mut sub = MetaNode::new();
                    sub.merge_items(items);
                    self.insert(key, MetaEntry::Node(sub));
                }
                scalar => {
                    self.insert(key, MetaEntry::Value(Value::from_json_scalar(scalar)));
                }
            }
        }
    }

    // TODO: keep scalar array elements once a list entry type exists; today they
    // are dropped and the array collapses into a flattened node.
    fn merge_items(&mut self, items: &[serde_json::Value]) {
        for item in items {
            match item {
                serde_json::Value::Object(inner) => self.merge_object(inner),
                serde_json::Value::Array(nested) => self.merge_items(nested),
                _ => tracing::trace!("scalar array element dropped"),
            }
        }
    }

    /// Re-baseline this node and every nested node.
    pub fn reset_signature(&mut self) {
        self.baseline = self.to_json(true);
        for (_, entry) in &mut self.entries {
            if let MetaEntry::Node(node) = entry {
                node.reset_signature();
            }
        }
    }

    /// Canonical JSON captured at the last load / reset.
    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    /// Content comparison against the baseline, independent of how many
    /// mutations happened in between.
    pub fn has_changed(&self) -> bool {
        self.baseline != self.to_json(true)
    }

    /// Canonical signature of the tree.
    ///
    /// With `archive_original` and a tree that differs from its baseline, the
    /// baseline is embedded as a nested node under `archive_key` before
    /// rendering, giving "current state plus previous state" for audit. A
    /// nested node already stored under that key is replaced only in the
    /// rendering; a scalar there suppresses the archive. The tree itself is
    /// not modified. A blank `archive_key` yields an empty string.
    pub fn signature(&self, archive_original: bool, archive_key: &str) -> String {
        if archive_key.trim().is_empty() {
            return String::new();
        }
        let current = self.to_json(true);
        if !archive_original || current == self.baseline {
            return current;
        }
        if let Some(MetaEntry::Value(_)) = self.entry(archive_key) {
            return current;
        }
        let mut snapshot = self.clone();
        snapshot.set_node(archive_key, MetaNode::from_json(&self.baseline));
        snapshot.to_json(true)
    }

    /// [`signature`](MetaNode::signature) with archival under the configured key.
    pub fn archived_signature(&self, config: &MetaConfig) -> String {
        self.signature(true, &config.archive_key)
    }

    /// Serialize the tree. `sorted` sorts the entries before building the
    /// JSON object, so the order holds whatever map backs `serde_json`. With
    /// the default backend the unsorted output comes out key-ordered as well.
    pub fn to_json(&self, sorted: bool) -> String {
        serde_json::to_string(&self.to_value(sorted)).unwrap_or_default()
    }

    pub fn to_value(&self, sorted: bool) -> serde_json::Value {
        let mut entries: Vec<&(String, MetaEntry)> = self.entries.iter().collect();
        if sorted {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
        let map = entries
            .into_iter()
            .map(|(key, entry)| {
                let value = match entry {
                    MetaEntry::Value(v) => v.to_json(),
                    MetaEntry::Node(node) => node.to_value(sorted),
                };
                (key.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&MetaEntry> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn node(&self, key: &str) -> Option<&MetaNode> {
        match self.entry(key) {
            Some(MetaEntry::Node(node)) => Some(node),
            _ => None,
        }
    }

    pub fn node_mut(&mut self, key: &str) -> Option<&mut MetaNode> {
        let index = self.position(key)?;
        match &mut self.entries[index].1 {
            MetaEntry::Node(node) => Some(node),
            MetaEntry::Value(_) => None,
        }
    }

    /// Store a nested tree under `key`, replacing whatever was there.
    pub fn set_node(&mut self, key: &str, node: MetaNode) -> &mut MetaNode {
        let index = self.insert(key, MetaEntry::Node(node));
        match &mut self.entries[index].1 {
            MetaEntry::Node(node) => node,
            MetaEntry::Value(_) => unreachable!("entry was just stored as a node"),
        }
    }

    /// Parse `json` into a new nested tree stored under `key`.
    pub fn add_sub(&mut self, key: &str, json: &str) -> &mut MetaNode {
        self.set_node(key, MetaNode::from_json(json))
    }

    /// Store every pair, through `crypto` when given.
    pub fn add<I, K, V>(&mut self, pairs: I, crypto: Option<&dyn Crypto>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in pairs {
            match crypto {
                Some(c) => self.set_with(key.as_ref(), value, c),
                None => self.set(key.as_ref(), value),
            };
        }
    }

    /// `None` and empty strings remove the key; anything else is stored,
    /// through `crypto` when given.
    pub fn set_or_remove<V: Into<Value>>(
        &mut self,
        key: &str,
        value: Option<V>,
        crypto: Option<&dyn Crypto>,
    ) -> bool {
        let value: Value = match value {
            Some(v) => v.into(),
            None => return self.remove(key),
        };
        if value.as_text().is_some_and(str::is_empty) {
            return self.remove(key);
        }
        match crypto {
            Some(c) => self.set_with(key, value, c),
            None => self.set(key, value),
        }
    }

    /// Returns whether a key was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Flat JSON object from key / optional value pairs. A `None` value is
    /// written as [`NULL_MARKER`].
    pub fn pairs_to_json<I, K>(pairs: I) -> String
    where
        I: IntoIterator<Item = (K, Option<Value>)>,
        K: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Some(v) => v.to_json(),
                    None => serde_json::Value::String(NULL_MARKER.to_string()),
                };
                (key.into(), value)
            })
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    fn position(&self, key: &str) -> Option<usize> {
        let wanted = key.to_lowercase();
        self.entries.iter().position(|(k, _)| k.to_lowercase() == wanted)
    }

    /// Replace in place under the matching key, or append under the
    /// lowercased key. Returns the entry position.
    fn insert(&mut self, key: &str, entry: MetaEntry) -> usize {
        match self.position(key) {
            Some(index) => {
                self.entries[index].1 = entry;
                index
            }
            None => {
                self.entries.push((key.to_lowercase(), entry));
                self.entries.len() - 1
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Accessor for MetaNode {
    fn has_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Nested nodes are not scalars: reading one yields the default.
    fn value(&self, name: &str) -> Option<&Value> {
        match self.entry(name) {
            Some(MetaEntry::Value(v)) => Some(v),
            _ => None,
        }
    }

    fn put(&mut self, name: &str, value: Value) -> bool {
        self.insert(name, MetaEntry::Value(value));
        true
    }

    fn unset(&mut self, name: &str) -> bool {
        self.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Reversible stand-in cipher.
    struct Mirror;

    impl Crypto for Mirror {
        fn encrypt(&self, plain: &str) -> String {
            format!("enc:{}", plain.chars().rev().collect::<String>())
        }

        fn decrypt(&self, cipher: &str) -> String {
            cipher.trim_start_matches("enc:").chars().rev().collect()
        }
    }

    #[test]
    fn arrays_of_scalars_become_empty_nodes() {
        let meta = MetaNode::from_json(r#"{"a":{"b":1},"c":[1,2]}"#);
        assert!(meta.has_key("A"));
        assert!(meta.node("c").is_some_and(MetaNode::is_empty));
        assert_eq!(meta.to_json(true), r#"{"a":{"b":1},"c":{}}"#);
        assert_eq!(meta.node("a").map(|a| a.get("B", 0)), Some(1));
    }

    #[test]
    fn array_elements_flatten_into_one_node() {
        let meta = MetaNode::from_json(r#"{"list":[{"x":1},"drop",{"y":2},[{"z":3},4]]}"#);
        let list = meta.node("list").unwrap();
        assert_eq!(list.to_json(true), r#"{"x":1,"y":2,"z":3}"#);
    }

    #[test]
    fn new_keys_are_lowercased() {
        let mut meta = MetaNode::from_json(r#"{"Name":"x","Nested":{"Deep":true}}"#);
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["name", "nested"]);
        meta.set("NAME", "y");
        meta.set("Added", 3);
        assert_eq!(meta.to_json(true), r#"{"added":3,"name":"y","nested":{"deep":true}}"#);
    }

    #[test]
    fn canonical_round_trip() {
        let source = r#"{"z":1,"a":{"y":"s","b":[{"k":false}]},"f":2.5,"n":null}"#;
        let first = MetaNode::from_json(source);
        let second = MetaNode::from_json(&first.to_json(true));
        assert_eq!(first.signature(false, "previous"), second.signature(false, "previous"));
        assert_eq!(first.to_json(true), r#"{"a":{"b":{"k":false},"y":"s"},"f":"2.5","n":null,"z":1}"#);
    }

    #[test]
    fn soft_typed_reads() {
        let meta = MetaNode::from_json(r#"{"port":"8080","debug":"true","n":5,"ratio":0.5,"sub":{}}"#);
        assert_eq!(meta.get("PORT", 0), 8080);
        assert!(meta.get("debug", false));
        assert_eq!(meta.get("n", String::new()), "5");
        assert_eq!(meta.get("ratio", 0.0), 0.5);
        assert!(!meta.get("n", false));
        assert_eq!(meta.get("sub", 7), 7);
        assert_eq!(meta.get("absent", String::from("fallback")), "fallback");
    }

    #[test]
    fn has_changed_tracks_content() {
        let mut meta = MetaNode::from_json(r#"{"name":"a","count":1}"#);
        assert!(!meta.has_changed());
        meta.set("name", "b");
        assert!(meta.has_changed());
        meta.set("name", "a");
        assert!(!meta.has_changed());
        meta.set("extra", true);
        meta.reset_signature();
        assert!(!meta.has_changed());
    }

    #[test]
    fn fresh_node_is_unchanged() {
        assert!(!MetaNode::new().has_changed());
    }

    #[test]
    fn reset_signature_reaches_nested_nodes() {
        let mut meta = MetaNode::from_json(r#"{"db":{"host":"localhost"}}"#);
        assert!(!meta.node("db").unwrap().has_changed());

        meta.node_mut("DB").unwrap().set("host", "remote");
        assert!(meta.node("db").unwrap().has_changed());
        assert!(meta.has_changed());

        meta.reset_signature();
        assert!(!meta.node("db").unwrap().has_changed());
        assert!(!meta.has_changed());
    }

    #[test]
    fn encryption_round_trip() {
        let mut meta = MetaNode::new();
        meta.set_with("password", "hunter2", &Mirror);
        assert_eq!(meta.get_with("Password", String::new(), &Mirror), "hunter2");
        assert_eq!(meta.get("password", String::new()), "enc:2retnuh");

        // Non-text values bypass the transform.
        meta.set_with("pin", 42, &Mirror);
        assert_eq!(meta.get_with("pin", 0, &Mirror), 42);
    }

    #[test]
    fn unchanged_tree_signature_has_no_archive() {
        let meta = MetaNode::from_json(r#"{"v":1}"#);
        assert_eq!(meta.signature(true, "previous"), r#"{"v":1}"#);
    }

    #[test]
    fn changed_tree_embeds_previous_state() {
        let mut meta = MetaNode::from_json(r#"{"v":1}"#);
        meta.set("v", 2);
        assert_eq!(meta.signature(true, "previous"), r#"{"previous":{"v":1},"v":2}"#);
        assert_eq!(meta.signature(false, "previous"), r#"{"v":2}"#);
        assert!(!meta.has_key("previous"));
    }

    #[test]
    fn archive_preserves_existing_node() {
        let mut meta = MetaNode::from_json(r#"{"v":1,"previous":{"v":0}}"#);
        meta.set("v", 2);
        assert_eq!(
            meta.signature(true, "Previous"),
            r#"{"previous":{"previous":{"v":0},"v":1},"v":2}"#
        );
        assert_eq!(meta.node("previous").unwrap().to_json(true), r#"{"v":0}"#);
    }

    #[test]
    fn scalar_under_archive_key_suppresses_archive() {
        let mut meta = MetaNode::from_json(r#"{"v":1,"previous":"keep"}"#);
        meta.set("v", 2);
        assert_eq!(meta.signature(true, "previous"), r#"{"previous":"keep","v":2}"#);
    }

    #[test]
    fn blank_archive_key_suppresses_signature() {
        let mut meta = MetaNode::from_json(r#"{"v":1}"#);
        meta.set("v", 2);
        assert_eq!(meta.signature(true, "   "), "");
        assert_eq!(meta.signature(false, ""), "");
    }

    #[test]
    fn archived_signature_uses_configured_key() {
        let mut meta = MetaNode::from_json(r#"{"v":1}"#);
        meta.set("v", 2);
        let config = MetaConfig { archive_key: "audit".to_string() };
        assert_eq!(meta.archived_signature(&config), r#"{"audit":{"v":1},"v":2}"#);
    }

    #[test]
    fn malformed_json_is_logged_not_raised() {
        let mut meta = MetaNode::from_json(r#"{"keep":1}"#);
        meta.load(r#"{"broken":"#, true);
        assert!(meta.is_empty());
        assert!(!meta.has_changed());

        let mut merged = MetaNode::from_json(r#"{"keep":1}"#);
        merged.load("not json", false);
        assert_eq!(merged.get("keep", 0), 1);
    }

    #[test]
    fn try_load_reports_errors() {
        let mut meta = MetaNode::new();
        let err = meta.try_load("[1,2]", true).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Format);
        assert!(err.message.contains("array"));
        assert!(meta.try_load(r#"{"a":1}"#, true).is_ok());
    }

    #[test]
    fn merge_load_keeps_existing_keys() {
        let mut meta = MetaNode::from_json(r#"{"a":1,"b":2}"#);
        meta.load(r#"{"B":3,"c":4}"#, false);
        assert_eq!(meta.to_json(true), r#"{"a":1,"b":3,"c":4}"#);
        assert!(!meta.has_changed());
    }

    #[test]
    fn set_or_remove_drops_empty_values() {
        let mut meta = MetaNode::from_json(r#"{"a":"x","b":"y","c":"z"}"#);
        assert!(meta.set_or_remove::<String>("A", None, None));
        assert!(meta.set_or_remove("b", Some(""), None));
        assert!(meta.set_or_remove("c", Some("secret"), Some(&Mirror)));
        assert_eq!(meta.to_json(true), r#"{"c":"enc:terces"}"#);
    }

    #[test]
    fn setting_null_removes() {
        let mut meta = MetaNode::from_json(r#"{"a":1}"#);
        assert!(meta.set("A", None::<i64>));
        assert!(!meta.has_key("a"));
        assert!(!meta.remove("a"));
    }

    #[test]
    fn add_and_add_sub() {
        let mut meta = MetaNode::new();
        meta.add([("host", "db"), ("user", "root")], None);
        meta.add([("token", "abc")], Some(&Mirror));
        let sub = meta.add_sub("Limits", r#"{"max":10}"#);
        sub.set("min", 1);
        assert_eq!(
            meta.to_value(true),
            json!({"host":"db","limits":{"max":10,"min":1},"token":"enc:cba","user":"root"})
        );
    }

    #[test]
    fn unsorted_export_keeps_content() {
        let meta = MetaNode::from_json(r#"{"b":1,"a":{"c":true}}"#);
        let parsed: serde_json::Value = serde_json::from_str(&meta.to_json(false)).unwrap();
        assert_eq!(parsed, json!({"a":{"c":true},"b":1}));
    }

    #[test]
    fn unsorted_export_follows_map_order() {
        let mut meta = MetaNode::new();
        meta.set("zeta", 1);
        meta.set("alpha", 2);
        assert_eq!(meta.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(meta.to_json(false), meta.to_json(true));
        assert_eq!(meta.to_json(true), r#"{"alpha":2,"zeta":1}"#);
    }

    #[test]
    fn pairs_to_json_marks_missing_values() {
        let json = MetaNode::pairs_to_json([
            ("id", Some(Value::Int64(3))),
            ("note", None),
            ("ok", Some(Value::Bool(true))),
        ]);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, json!({"id":3,"note":"{NULL}","ok":true}));
    }
}
