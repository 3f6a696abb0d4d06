//! Parser configuration.

use serde::{Deserialize, Serialize};

use crate::grammar::keyword::SuffixRules;

/// How the command tree is derived after a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionalNodes {
    /// Tree ends before the last keyword actually matched, so optional
    /// nodes that were present stay in scope.
    #[default]
    Tracked,
    /// Tree is the pattern up to its last `:`, whatever was matched.
    Legacy,
}

/// Settings for a [`ParserSession`](crate::ParserSession).
///
/// Every field has a default, so a config file only names what it changes:
///
/// ```json
/// { "suffixMax": 16, "optionalNodes": "legacy" }
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    /// Smallest numeric suffix accepted.
    pub suffix_min: u32,
    /// Largest numeric suffix accepted.
    pub suffix_max: u32,
    /// Suffix assumed when a `#` node carries none.
    pub suffix_default: u32,
    /// Command-tree rule.
    pub optional_nodes: OptionalNodes,
    /// Accept module channels and path names in channel lists.
    pub advanced_channel_lists: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let rules = SuffixRules::default();
        Self {
            suffix_min: rules.min,
            suffix_max: rules.max,
            suffix_default: rules.default,
            optional_nodes: OptionalNodes::default(),
            advanced_channel_lists: true,
        }
    }
}

impl ParserConfig {
    /// Parse a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed input or unknown enum values.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Numeric-suffix rules for the keyword matcher.
    pub fn suffix_rules(&self) -> SuffixRules {
        SuffixRules {
            min: self.suffix_min,
            max: self.suffix_max,
            default: self.suffix_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ParserConfig::default();
        assert_eq!(c.suffix_rules(), SuffixRules::default());
        assert_eq!(c.optional_nodes, OptionalNodes::Tracked);
        assert!(c.advanced_channel_lists);
    }

    #[test]
    fn partial_json() {
        let c = ParserConfig::from_json(r#"{"suffixMax": 16, "optionalNodes": "legacy"}"#)
            .expect("valid config");
        assert_eq!(c.suffix_max, 16);
        assert_eq!(c.suffix_min, 1);
        assert_eq!(c.optional_nodes, OptionalNodes::Legacy);
        assert!(ParserConfig::from_json(r#"{"optionalNodes": "sometimes"}"#).is_err());
    }
}
