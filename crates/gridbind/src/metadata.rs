use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use gridbind_spec::{
    BindConfig, ColumnSpec, ConfigValue, IndexSelector, NameSelector, keys, parse_column_list,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::BindError;
use crate::rules::{ConversionRule, DateRule, MapRule, RuleBinding};

/// Auto-generated sheet names (`Sheet1`, `Sheet007`, ...) carry no meaning
/// and are never written into a sheet-name fill field.
static DEFAULT_SHEET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Sheet[0-9]+$").expect("literal pattern"));

/// Immutable binding metadata for one spreadsheet layout, built once from a
/// [`BindConfig`] and shared by import and export traversals.
#[derive(Debug, Clone)]
pub struct Metadata {
    columns: Vec<Option<ColumnSpec>>,
    skip_rows: u32,
    header_rows: IndexSelector,
    footer_rows: IndexSelector,
    sheet_index: IndexSelector,
    sheet_names: NameSelector,
    sheet_name_fill_to: Option<String>,
    rules: BTreeMap<String, RuleBinding>,
}

impl Metadata {
    /// Build metadata from a parsed configuration.
    ///
    /// Structural config issues are logged and tolerated; only an
    /// uncompilable date pattern is fatal, so a broken format string
    /// surfaces before any row is touched.
    pub fn from_config(config: &BindConfig) -> Result<Self, BindError> {
        if let Err(err) = config.validate() {
            for issue in err.issues() {
                warn!(path = %issue.path, message = %issue.message, "configuration issue");
            }
        }

        let columns = config
            .text(keys::COLUMNS)
            .map(parse_column_list)
            .unwrap_or_default();

        let header_rows = config
            .first_text(&[keys::HEADER_ROWS, keys::HEADER_ROW])
            .map(|raw| IndexSelector::parse(raw, 1))
            .unwrap_or_else(IndexSelector::none);
        let footer_rows = config
            .first_text(&[keys::FOOTER_ROWS, keys::FOOTER_ROW])
            .map(|raw| IndexSelector::parse(raw, 1))
            .unwrap_or_else(IndexSelector::none);

        // Data begins after the declared skip band, or right below the last
        // header row when no skip count is given.
        let skip_rows = config
            .number(keys::SKIP_ROWS)
            .or_else(|| header_rows.max().map(|last| last + 1))
            .unwrap_or(0);

        let sheet_index = match config.text(keys::SHEET_INDEX) {
            Some(raw) => IndexSelector::parse(raw, 0),
            None if config.contains(keys::SHEET_NAME) => IndexSelector::all(),
            None => IndexSelector::of([0]),
        };
        let sheet_names = config
            .text(keys::SHEET_NAME)
            .map(NameSelector::parse)
            .unwrap_or_else(NameSelector::all);

        let mut metadata = Self {
            columns,
            skip_rows,
            header_rows,
            footer_rows,
            sheet_index,
            sheet_names,
            sheet_name_fill_to: None,
            rules: BTreeMap::new(),
        };

        for (field, value) in config.entries_with_prefix(keys::RULE_DATE_PREFIX) {
            let ConfigValue::Text(pattern) = value else {
                continue;
            };
            let rule = DateRule::new(pattern.clone()).map_err(|err| {
                BindError::InvalidDatePattern {
                    field: field.to_string(),
                    pattern: err.pattern,
                }
            })?;
            metadata.bind_rule(field, RuleBinding::Date(rule));
        }
        for (field, value) in config.entries_with_prefix(keys::RULE_MAP_PREFIX) {
            let ConfigValue::Table(table) = value else {
                continue;
            };
            metadata.bind_rule(field, RuleBinding::Map(MapRule::from_table(table)));
        }

        if let Some(target) = config.text(keys::SHEET_NAME_FILL_TO) {
            if metadata.is_declared(target) {
                metadata.sheet_name_fill_to = Some(target.to_string());
            } else {
                warn!(field = target, "sheet-name fill target is not a declared field; ignored");
            }
        }

        Ok(metadata)
    }

    fn bind_rule(&mut self, field: &str, rule: RuleBinding) {
        if !self.is_declared(field) {
            warn!(field, "rule bound to undeclared field; ignored");
            return;
        }
        match self.rules.entry(field.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(rule);
            }
            Entry::Occupied(_) => {
                warn!(field, "field already has a rule; extra rule ignored");
            }
        }
    }

    /// Attach a programmatic rule to a declared field, replacing any
    /// config-derived rule for it.
    pub fn with_rule(mut self, field: &str, rule: Arc<dyn ConversionRule>) -> Self {
        if self.is_declared(field) {
            self.rules
                .insert(field.to_string(), RuleBinding::Custom(rule));
        } else {
            warn!(field, "rule bound to undeclared field; ignored");
        }
        self
    }

    /// Declared columns in spreadsheet position order; `None` marks a
    /// placeholder position.
    pub fn columns(&self) -> &[Option<ColumnSpec>] {
        &self.columns
    }

    /// Declared columns only, skipping placeholders.
    pub fn declared_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().flatten()
    }

    /// Width of the declared layout, placeholders included.
    pub fn column_count(&self) -> u32 {
        self.columns.len() as u32
    }

    pub fn is_declared(&self, field: &str) -> bool {
        self.declared_columns().any(|spec| spec.field == field)
    }

    pub fn skip_rows(&self) -> u32 {
        self.skip_rows
    }

    pub fn header_rows(&self) -> &IndexSelector {
        &self.header_rows
    }

    pub fn footer_rows(&self) -> &IndexSelector {
        &self.footer_rows
    }

    pub fn sheet_name_fill_to(&self) -> Option<&str> {
        self.sheet_name_fill_to.as_deref()
    }

    pub fn rule(&self, field: &str) -> Option<&RuleBinding> {
        self.rules.get(field)
    }

    /// Whether the sheet at `index` named `name` participates in a
    /// traversal. Both selectors must agree.
    pub fn sheet_enabled(&self, index: u32, name: &str) -> bool {
        self.sheet_index.is_enabled(index) && self.sheet_names.is_enabled(name)
    }

    /// Whether `name` looks auto-generated rather than user-chosen.
    pub fn is_default_sheet_name(name: &str) -> bool {
        DEFAULT_SHEET_NAME.is_match(name)
    }
}
