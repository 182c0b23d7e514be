use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::validation::{ConfigIssue, ValidationError};

/// Well-known configuration keys consumed by the runtime's metadata builder.
pub mod keys {
    /// Ordered, delimiter-separated field tokens (marker grammar applies).
    pub const COLUMNS: &str = "columns";
    /// Explicit number of leading rows to skip before data begins.
    pub const SKIP_ROWS: &str = "skip.rows";
    /// Header row selector, 1-based range grammar.
    pub const HEADER_ROWS: &str = "header.rows";
    /// Singular alias of [`HEADER_ROWS`].
    pub const HEADER_ROW: &str = "header.row";
    /// Footer row selector, 1-based range grammar.
    pub const FOOTER_ROWS: &str = "footer.rows";
    /// Singular alias of [`FOOTER_ROWS`].
    pub const FOOTER_ROW: &str = "footer.row";
    /// Sheet index selector (0-based).
    pub const SHEET_INDEX: &str = "sheet.index";
    /// Sheet name selector.
    pub const SHEET_NAME: &str = "sheet.name";
    /// Field that receives the current sheet's name on every imported row.
    pub const SHEET_NAME_FILL_TO: &str = "sheet.name.fill.to";
    /// Prefix for per-field date-format rules (`rule.date.<field>`).
    pub const RULE_DATE_PREFIX: &str = "rule.date.";
    /// Prefix for per-field categorical-mapping rules (`rule.map.<field>`).
    pub const RULE_MAP_PREFIX: &str = "rule.map.";
}

/// A configuration value: plain text for most keys, a string table for
/// `rule.map.<field>` entries (canonical code → delimited synonym list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    Table(BTreeMap<String, String>),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<BTreeMap<String, String>> for ConfigValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        ConfigValue::Table(value)
    }
}

/// Flat key/value configuration for one import or export job.
///
/// Deserializes from a flat YAML mapping (dotted keys are plain map keys, not
/// nesting) or is assembled programmatically from pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindConfig {
    entries: BTreeMap<String, ConfigValue>,
}

impl BindConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a config by reading YAML from any reader.
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    /// Construct a config from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize this config to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Assemble a config from key/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut config = Self::new();
        for (key, value) in pairs {
            config.set(key, value);
        }
        config
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Text value for `key`, if present and text-typed.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ConfigValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Table value for `key`, if present and table-typed.
    pub fn table(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        match self.entries.get(key) {
            Some(ConfigValue::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// First text value found among `candidates`, in order.
    pub fn first_text(&self, candidates: &[&str]) -> Option<&str> {
        candidates.iter().find_map(|key| self.text(key))
    }

    /// Numeric text value for `key`. A non-numeric value is logged and
    /// treated as absent.
    pub fn number(&self, key: &str) -> Option<u32> {
        let raw = self.text(key)?;
        match raw.trim().parse::<u32>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key, value = raw, "non-numeric configuration value; ignored");
                None
            }
        }
    }

    /// Entries whose key starts with `prefix`, yielding the remainder of the
    /// key (the field name for `rule.*` namespaces) and the value.
    pub fn entries_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ConfigValue)> {
        self.entries
            .iter()
            .filter_map(move |(key, value)| Some((key.strip_prefix(prefix)?, value)))
    }

    /// Structural validation: rule namespaces must be known and rule values
    /// must have the right shape. Selector and column token problems are not
    /// reported here; those are skipped token-by-token at parse time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (key, value) in &self.entries {
            if let Some(rest) = key.strip_prefix("rule.") {
                let known = rest
                    .split_once('.')
                    .map(|(kind, field)| {
                        matches!(kind, "date" | "map") && !field.trim().is_empty()
                    })
                    .unwrap_or(false);
                if !known {
                    issues.push(ConfigIssue::new(
                        key,
                        "unknown rule namespace; expected rule.date.<field> or rule.map.<field>",
                    ));
                    continue;
                }
            }

            if key.starts_with(keys::RULE_DATE_PREFIX) {
                if !matches!(value, ConfigValue::Text(_)) {
                    issues.push(ConfigIssue::new(key, "date rule value must be a format string"));
                }
            } else if key.starts_with(keys::RULE_MAP_PREFIX) {
                if !matches!(value, ConfigValue::Table(_)) {
                    issues.push(ConfigIssue::new(
                        key,
                        "map rule value must be a table of canonical code to synonym list",
                    ));
                }
            }
        }

        if let Some(ConfigValue::Table(_)) = self.entries.get(keys::COLUMNS) {
            issues.push(ConfigIssue::new(keys::COLUMNS, "columns must be a token list"));
        }
        if let Some(raw) = self.text(keys::SKIP_ROWS)
            && raw.trim().parse::<u32>().is_err()
        {
            issues.push(ConfigIssue::new(keys::SKIP_ROWS, "must be a non-negative integer"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}
