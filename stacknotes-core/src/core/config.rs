//! Editor configuration supplied by the host.
//!
//! The host owns the settings file; the editor only parses the JSON it is
//! handed. Every field is optional and falls back to its default.

use crate::{EditorError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for one [`Editor`](crate::Editor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Number of transactions kept for undo. Zero disables history.
    pub history_depth: usize,
    /// How far back (in characters) a slash command looks for its `/` when
    /// the text before the caret no longer matches the filter.
    pub slash_lookback: usize,
    /// Hint shown by the view in an empty document.
    pub placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            slash_lookback: 20,
            placeholder: "Press '/' for commands...".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parses configuration JSON. Empty input yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Json`] for malformed JSON and
    /// [`EditorError::InvalidConfig`] for out-of-range values.
    pub fn from_json(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration JSON, logging and falling back to the defaults on error.
    #[must_use]
    pub fn from_json_or_default(input: &str) -> Self {
        Self::from_json(input).unwrap_or_else(|e| {
            log::warn!("invalid editor config, using defaults: {e}");
            Self::default()
        })
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.slash_lookback == 0 {
            return Err(EditorError::InvalidConfig("slashLookback must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::from_json("").unwrap();
        assert_eq!(config.history_depth, 100);
        assert_eq!(config.slash_lookback, 20);
        assert_eq!(config.placeholder, "Press '/' for commands...");
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = EditorConfig::from_json(r#"{"historyDepth": 5}"#).unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.slash_lookback, 20);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = EditorConfig::from_json(r#"{"slashLookback": 0}"#).unwrap_err();
        assert!(matches!(err, EditorError::InvalidConfig(_)));
        assert!(matches!(EditorConfig::from_json("{"), Err(EditorError::Json(_))));
    }

    #[test]
    fn test_fallback_to_defaults() {
        assert_eq!(EditorConfig::from_json_or_default("nope"), EditorConfig::default());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(EditorConfig::default()).unwrap();
        assert_eq!(json["historyDepth"], 100);
        assert_eq!(json["slashLookback"], 20);
    }
}
