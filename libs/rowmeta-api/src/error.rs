use std::fmt;

/// Which fallible edge failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// TOML settings that do not parse or do not fit [`RowMetaConfig`](crate::config::RowMetaConfig).
    Config,
    /// A settings file that could not be read.
    Io,
    /// Meta text that is not a JSON object.
    Format,
}

/// Failure of `RowMetaConfig::load` / `parse` or `MetaNode::try_load`.
///
/// Accessor reads and writes never return one; they fall back to defaults
/// or become no-ops.
#[derive(Debug)]
pub struct RowMetaError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RowMetaError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg)
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, msg)
    }

    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    /// Prefix the message with where it happened, e.g. the settings path.
    pub fn with_context(mut self, ctx: impl fmt::Display) -> Self {
        self.message = format!("{ctx}: {}", self.message);
        self
    }
}

impl fmt::Display for RowMetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RowMetaError {}

impl From<std::io::Error> for RowMetaError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

/// Malformed meta JSON.
impl From<serde_json::Error> for RowMetaError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}

/// Malformed settings TOML.
impl From<toml::de::Error> for RowMetaError {
    fn from(e: toml::de::Error) -> Self {
        Self::config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_kind() {
        let err = RowMetaError::format("unexpected end").with_context("meta 'settings'");
        assert_eq!(err.kind, ErrorKind::Format);
        assert_eq!(err.message, "meta 'settings': unexpected end");
        assert_eq!(err.to_string(), "Format: meta 'settings': unexpected end");
    }

    #[test]
    fn json_errors_are_format_errors() {
        let err: RowMetaError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Format);
    }

    #[test]
    fn toml_errors_are_config_errors() {
        let err: RowMetaError = toml::from_str::<toml::Value>("a = ").unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Config);
    }
}
