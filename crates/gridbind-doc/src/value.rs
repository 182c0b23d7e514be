use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Raw value carried by one spreadsheet cell.
///
/// This is the interchange type between documents and the binding engine:
/// readers produce it, conversion rules rewrite it, writers persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Empty,
    /// Literal error marker rendered into a cell (e.g. a failed export
    /// conversion). Displayed verbatim.
    Error(String),
}

impl CellValue {
    /// Blank test used by the import traversal: empty cells and
    /// whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Normalize text variants by trimming surrounding whitespace; other
    /// variants pass through unchanged. Trimmed-to-empty text becomes
    /// [`CellValue::Empty`].
    pub fn trimmed(self) -> CellValue {
        match self {
            CellValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else if trimmed.len() == text.len() {
                    CellValue::Text(text)
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            }
            other => other,
        }
    }

    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Whether the value is a scalar primitive whose literal rendering is
    /// useful in diagnostics (numbers, text, booleans).
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            CellValue::Int(_) | CellValue::Number(_) | CellValue::Text(_) | CellValue::Boolean(_)
        )
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
            CellValue::Empty => Ok(()),
            CellValue::Error(marker) => write!(f, "{marker}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Text("x".to_string()).is_blank());
        assert!(!CellValue::Int(0).is_blank());
    }

    #[test]
    fn trimming_normalizes_text() {
        assert_eq!(
            CellValue::Text("  hi  ".to_string()).trimmed(),
            CellValue::Text("hi".to_string())
        );
        assert_eq!(CellValue::Text("  ".to_string()).trimmed(), CellValue::Empty);
        assert_eq!(CellValue::Int(7).trimmed(), CellValue::Int(7));
    }

    #[test]
    fn serde_round_trip() {
        let values = vec![
            CellValue::Int(42),
            CellValue::Number(1.5),
            CellValue::Text("x".to_string()),
            CellValue::Boolean(true),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            CellValue::Empty,
            CellValue::Error("#ERROR!".to_string()),
        ];
        let json = serde_json::to_string(&values).expect("serializes");
        let back: Vec<CellValue> = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, values);
    }
}
