use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use gridbind_doc::CellValue;
use thiserror::Error;

use crate::slots::RowSlots;

/// Literal marker written into a cell when an export-side conversion cannot
/// produce a value. Export never aborts a batch for one bad cell.
pub const ERROR_MARKER: &str = "#ERROR!";

/// Failure raised by the import side of a rule.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The raw value is invalid for this field. Recorded as one failure for
    /// the current row; the batch continues.
    #[error("{0}")]
    Violation(String),

    /// Internal rule fault. The row is abandoned and the fault logged; the
    /// batch continues.
    #[error("rule failure: {0}")]
    Unexpected(String),
}

/// A date-format pattern that did not compile. Fatal for metadata
/// construction.
#[derive(Debug, Error)]
#[error("invalid date pattern `{pattern}`")]
pub struct InvalidPattern {
    pub pattern: String,
}

/// Bidirectional transform between a raw cell value and a domain field
/// value.
///
/// Both directions receive the whole row pool so a rule can consult sibling
/// fields; they rewrite `pool[field]` in place. Export must not fail — it
/// renders [`ERROR_MARKER`] instead.
pub trait ConversionRule: Send + Sync {
    fn import(&self, pool: &mut RowSlots, field: &str) -> Result<(), RuleError>;
    fn export(&self, pool: &mut RowSlots, field: &str);
}

/// The rule bound to one field, selected once at metadata construction.
#[derive(Clone)]
pub enum RuleBinding {
    Date(DateRule),
    Map(MapRule),
    Custom(Arc<dyn ConversionRule>),
}

impl RuleBinding {
    pub fn import(&self, pool: &mut RowSlots, field: &str) -> Result<(), RuleError> {
        match self {
            RuleBinding::Date(rule) => rule.import(pool, field),
            RuleBinding::Map(rule) => rule.import(pool, field),
            RuleBinding::Custom(rule) => rule.import(pool, field),
        }
    }

    pub fn export(&self, pool: &mut RowSlots, field: &str) {
        match self {
            RuleBinding::Date(rule) => rule.export(pool, field),
            RuleBinding::Map(rule) => rule.export(pool, field),
            RuleBinding::Custom(rule) => rule.export(pool, field),
        }
    }
}

impl fmt::Debug for RuleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleBinding::Date(rule) => f.debug_tuple("Date").field(rule).finish(),
            RuleBinding::Map(rule) => f.debug_tuple("Map").field(rule).finish(),
            RuleBinding::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Date formatting rule built from a strftime pattern.
///
/// Import parses text into a typed date; export formats a typed date back
/// into text.
#[derive(Debug, Clone)]
pub struct DateRule {
    pattern: String,
    has_time: bool,
}

impl DateRule {
    /// Validate the pattern eagerly; a bad pattern is a configuration error
    /// and must surface before any row is processed.
    pub fn new(pattern: impl Into<String>) -> Result<Self, InvalidPattern> {
        let pattern = pattern.into();
        if pattern.trim().is_empty()
            || StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error))
        {
            return Err(InvalidPattern { pattern });
        }
        // Formatting a bare date with time specifiers needs a midnight
        // timestamp, so remember whether the pattern asks for time.
        let has_time = ["%H", "%I", "%M", "%S", "%T", "%R", "%X", "%r", "%p", "%P", "%s"]
            .iter()
            .any(|spec| pattern.contains(spec));
        Ok(Self { pattern, has_time })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn parse_text(&self, text: &str) -> Option<CellValue> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, &self.pattern) {
            return Some(CellValue::DateTime(dt));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, &self.pattern) {
            return Some(CellValue::Date(date));
        }
        None
    }

    fn format_date(&self, date: NaiveDate) -> String {
        if self.has_time {
            let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
            midnight.format(&self.pattern).to_string()
        } else {
            date.format(&self.pattern).to_string()
        }
    }

    fn format_datetime(&self, datetime: NaiveDateTime) -> String {
        datetime.format(&self.pattern).to_string()
    }
}

impl ConversionRule for DateRule {
    fn import(&self, pool: &mut RowSlots, field: &str) -> Result<(), RuleError> {
        let Some(slot) = pool.get(field) else {
            return Ok(());
        };
        let parsed = match &slot.value {
            CellValue::Empty | CellValue::Date(_) | CellValue::DateTime(_) => return Ok(()),
            other => {
                let text = other.to_string();
                self.parse_text(text.trim()).ok_or_else(|| {
                    RuleError::Violation(format!(
                        "value does not match date pattern `{}`",
                        self.pattern
                    ))
                })?
            }
        };
        pool.set_value(field, parsed);
        Ok(())
    }

    fn export(&self, pool: &mut RowSlots, field: &str) {
        let Some(slot) = pool.get(field) else {
            return;
        };
        let formatted = match &slot.value {
            CellValue::Empty => return,
            CellValue::Date(date) => self.format_date(*date),
            CellValue::DateTime(datetime) => self.format_datetime(*datetime),
            // Best-effort coercion through the same pattern; anything else
            // becomes the literal marker.
            other => match self.parse_text(other.to_string().trim()) {
                Some(CellValue::Date(date)) => self.format_date(date),
                Some(CellValue::DateTime(datetime)) => self.format_datetime(datetime),
                _ => {
                    pool.set_value(field, CellValue::Error(ERROR_MARKER.to_string()));
                    return;
                }
            },
        };
        pool.set_value(field, CellValue::Text(formatted));
    }
}

/// Categorical mapping rule: canonical code ↔ ordered synonym list.
#[derive(Debug, Clone, Default)]
pub struct MapRule {
    /// canonical code → first synonym (display form).
    display: BTreeMap<String, String>,
    /// any synonym, and the code itself → canonical code.
    canonical: BTreeMap<String, String>,
}

impl MapRule {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut rule = MapRule::default();
        for (code, synonyms) in entries {
            let code = code.into();
            let synonyms: Vec<String> = synonyms.into_iter().map(Into::into).collect();
            rule.display.insert(
                code.clone(),
                synonyms.first().cloned().unwrap_or_else(|| code.clone()),
            );
            rule.canonical.insert(code.clone(), code.clone());
            for synonym in synonyms {
                rule.canonical.entry(synonym).or_insert_with(|| code.clone());
            }
        }
        rule
    }

    /// Build from the `rule.map.<field>` config table: canonical code →
    /// `,`/`|`-delimited synonym list.
    pub fn from_table(table: &BTreeMap<String, String>) -> Self {
        Self::new(table.iter().map(|(code, synonyms)| {
            (
                code.clone(),
                synonyms
                    .split([',', '|'])
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
            )
        }))
    }
}

impl ConversionRule for MapRule {
    fn import(&self, pool: &mut RowSlots, field: &str) -> Result<(), RuleError> {
        let Some(slot) = pool.get(field) else {
            return Ok(());
        };
        if slot.value.is_blank() {
            return Ok(());
        }
        let token = slot.value.to_string();
        let token = token.trim();
        match self.canonical.get(token) {
            Some(code) => {
                let code = code.clone();
                pool.set_value(field, CellValue::Text(code));
                Ok(())
            }
            None => Err(RuleError::Violation(
                "unrecognized value for mapped field".to_string(),
            )),
        }
    }

    fn export(&self, pool: &mut RowSlots, field: &str) {
        let Some(slot) = pool.get(field) else {
            return;
        };
        if slot.value.is_blank() {
            return;
        }
        let code = slot.value.to_string();
        let rendered = match self.display.get(code.trim()) {
            Some(display) => CellValue::Text(display.clone()),
            None => CellValue::Error(ERROR_MARKER.to_string()),
        };
        pool.set_value(field, rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::FieldSlot;

    fn pool_with(field: &str, value: CellValue) -> RowSlots {
        RowSlots::new(vec![FieldSlot {
            field: field.to_string(),
            column: 0,
            required: false,
            title: field.to_string(),
            row: 0,
            value,
        }])
    }

    #[test]
    fn date_rule_rejects_bad_pattern_eagerly() {
        assert!(DateRule::new("%Y-%m-%d").is_ok());
        assert!(DateRule::new("%Y-%m-%q").is_err());
        assert!(DateRule::new("").is_err());
    }

    #[test]
    fn date_rule_round_trip() {
        let rule = DateRule::new("%Y-%m-%d").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let mut pool = pool_with("joined", CellValue::Date(date));
        rule.export(&mut pool, "joined");
        assert_eq!(
            pool.value("joined"),
            Some(&CellValue::Text("2024-03-09".to_string()))
        );

        rule.import(&mut pool, "joined").unwrap();
        assert_eq!(pool.value("joined"), Some(&CellValue::Date(date)));
    }

    #[test]
    fn date_rule_import_rejects_mismatched_text() {
        let rule = DateRule::new("%Y-%m-%d").unwrap();
        let mut pool = pool_with("joined", CellValue::from("09/03/2024"));
        match rule.import(&mut pool, "joined") {
            Err(RuleError::Violation(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn date_rule_export_never_raises() {
        let rule = DateRule::new("%Y-%m-%d").unwrap();
        let mut pool = pool_with("joined", CellValue::from("not a date"));
        rule.export(&mut pool, "joined");
        assert_eq!(
            pool.value("joined"),
            Some(&CellValue::Error(ERROR_MARKER.to_string()))
        );

        // Blank values pass through untouched.
        let mut blank = pool_with("joined", CellValue::Empty);
        rule.export(&mut blank, "joined");
        assert_eq!(blank.value("joined"), Some(&CellValue::Empty));
    }

    #[test]
    fn date_rule_export_coerces_parseable_text() {
        let rule = DateRule::new("%Y-%m-%d").unwrap();
        let mut pool = pool_with("joined", CellValue::from(" 2024-03-09 "));
        rule.export(&mut pool, "joined");
        assert_eq!(
            pool.value("joined"),
            Some(&CellValue::Text("2024-03-09".to_string()))
        );
    }

    #[test]
    fn datetime_pattern_handles_bare_dates() {
        let rule = DateRule::new("%Y-%m-%d %H:%M:%S").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let mut pool = pool_with("at", CellValue::Date(date));
        rule.export(&mut pool, "at");
        assert_eq!(
            pool.value("at"),
            Some(&CellValue::Text("2024-03-09 00:00:00".to_string()))
        );
    }

    fn grade_rule() -> MapRule {
        MapRule::new([
            ("A", vec!["Excellent", "Outstanding"]),
            ("B", vec!["Good"]),
        ])
    }

    #[test]
    fn map_rule_round_trip() {
        let rule = grade_rule();
        for token in ["Excellent", "Outstanding", "A"] {
            let mut pool = pool_with("grade", CellValue::from(token));
            rule.import(&mut pool, "grade").unwrap();
            assert_eq!(pool.value("grade"), Some(&CellValue::Text("A".to_string())));
        }

        let mut pool = pool_with("grade", CellValue::from("A"));
        rule.export(&mut pool, "grade");
        assert_eq!(
            pool.value("grade"),
            Some(&CellValue::Text("Excellent".to_string()))
        );
    }

    #[test]
    fn map_rule_rejects_unknown_token_on_import() {
        let rule = grade_rule();
        let mut pool = pool_with("grade", CellValue::from("Mediocre"));
        match rule.import(&mut pool, "grade") {
            Err(RuleError::Violation(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn map_rule_export_marks_unknown_code() {
        let rule = grade_rule();
        let mut pool = pool_with("grade", CellValue::from("Z"));
        rule.export(&mut pool, "grade");
        assert_eq!(
            pool.value("grade"),
            Some(&CellValue::Error(ERROR_MARKER.to_string()))
        );
    }

    #[test]
    fn map_rule_from_config_table() {
        let mut table = BTreeMap::new();
        table.insert("A".to_string(), "Excellent,Outstanding".to_string());
        table.insert("B".to_string(), "Good".to_string());
        let rule = MapRule::from_table(&table);

        let mut pool = pool_with("grade", CellValue::from("Outstanding"));
        rule.import(&mut pool, "grade").unwrap();
        assert_eq!(pool.value("grade"), Some(&CellValue::Text("A".to_string())));
    }
}
