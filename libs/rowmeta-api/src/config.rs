use serde::Deserialize;

use crate::error::RowMetaError;

/// Root configuration, parsed from TOML.
///
/// ```toml
/// [record]
/// allow_new_keys = true
///
/// [meta]
/// archive_key = "previous"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowMetaConfig {
    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default)]
    pub meta: MetaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordConfig {
    /// Setting an unknown column creates it instead of being ignored.
    #[serde(default)]
    pub allow_new_keys: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaConfig {
    /// Key the previous state is archived under in archived signatures.
    #[serde(default = "default_archive_key")]
    pub archive_key: String,
}

fn default_archive_key() -> String {
    "previous".to_string()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            archive_key: default_archive_key(),
        }
    }
}

impl RowMetaConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, RowMetaError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RowMetaError::from(e).with_context(path))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, RowMetaError> {
        Ok(toml::from_str(toml_str)?)
    }
}
