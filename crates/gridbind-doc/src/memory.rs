use std::collections::BTreeMap;
use std::io::{Read, Write};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::DocError;
use crate::traits::{SheetReader, SheetWriter};
use crate::value::CellValue;

/// One stored cell: a cached value, an optional formula, an optional style id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct MemRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<u32>,
    #[serde(default)]
    cells: BTreeMap<u32, MemCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemSheet {
    name: String,
    #[serde(default)]
    rows: BTreeMap<u32, MemRow>,
}

/// In-memory workbook implementing the full document contract.
///
/// Serializes to and from JSON, which doubles as the fixture format for
/// template documents in tests. Sheets keep document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryAdapter {
    sheets: Vec<MemSheet>,
}

/// Candidate A1 cell reference. Whether a match really is one is decided by
/// `is_cell_reference`; qualified cross-sheet references are out of contract
/// for row shifting.
static A1_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?[A-Za-z]{1,3}\$?)([1-9][0-9]*)").expect("a1 regex compiles"));

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from any reader.
    pub fn open_reader<R: Read>(mut reader: R) -> Result<Self, DocError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DocError> {
        serde_json::from_str(json).map_err(|err| DocError::format(err.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, DocError> {
        serde_json::to_string_pretty(self).map_err(|err| DocError::format(err.to_string()))
    }

    /// Append an empty sheet. Re-adding an existing name is a no-op.
    pub fn add_sheet(&mut self, name: &str) -> &mut Self {
        if !self.sheets.iter().any(|sheet| sheet.name == name) {
            self.sheets.push(MemSheet {
                name: name.to_string(),
                rows: BTreeMap::new(),
            });
        }
        self
    }

    fn sheet(&self, name: &str) -> Result<&MemSheet, DocError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| DocError::missing_sheet(name))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut MemSheet, DocError> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| DocError::missing_sheet(name))
    }

    /// Fixture helper: store a formula (with an optional cached value).
    pub fn set_formula(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        formula: &str,
    ) -> Result<(), DocError> {
        let cell = self.cell_mut(sheet, row, col)?;
        cell.formula = Some(formula.to_string());
        Ok(())
    }

    pub fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), DocError> {
        self.sheet_mut(sheet)?.rows.entry(row).or_default().height = Some(height);
        Ok(())
    }

    pub fn set_row_style(&mut self, sheet: &str, row: u32, style: u32) -> Result<(), DocError> {
        self.sheet_mut(sheet)?.rows.entry(row).or_default().style = Some(style);
        Ok(())
    }

    pub fn set_cell_style(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        style: u32,
    ) -> Result<(), DocError> {
        self.cell_mut(sheet, row, col)?.style = Some(style);
        Ok(())
    }

    pub fn row_height(&self, sheet: &str, row: u32) -> Result<Option<f64>, DocError> {
        Ok(self.sheet(sheet)?.rows.get(&row).and_then(|r| r.height))
    }

    pub fn row_style(&self, sheet: &str, row: u32) -> Result<Option<u32>, DocError> {
        Ok(self.sheet(sheet)?.rows.get(&row).and_then(|r| r.style))
    }

    pub fn cell_formula(&self, sheet: &str, row: u32, col: u32) -> Result<Option<String>, DocError> {
        Ok(self
            .sheet(sheet)?
            .rows
            .get(&row)
            .and_then(|r| r.cells.get(&col))
            .and_then(|c| c.formula.clone()))
    }

    pub fn cell_style(&self, sheet: &str, row: u32, col: u32) -> Result<Option<u32>, DocError> {
        Ok(self
            .sheet(sheet)?
            .rows
            .get(&row)
            .and_then(|r| r.cells.get(&col))
            .and_then(|c| c.style))
    }

    fn cell_mut(&mut self, sheet: &str, row: u32, col: u32) -> Result<&mut MemCell, DocError> {
        Ok(self
            .sheet_mut(sheet)?
            .rows
            .entry(row)
            .or_default()
            .cells
            .entry(col)
            .or_default())
    }
}

impl SheetReader for MemoryAdapter {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheets.iter().any(|s| s.name == sheet)
    }

    fn row_count(&self, sheet: &str) -> Result<u32, DocError> {
        Ok(self
            .sheet(sheet)?
            .rows
            .keys()
            .next_back()
            .map(|last| last + 1)
            .unwrap_or(0))
    }

    fn row_cell_count(&self, sheet: &str, row: u32) -> Result<u32, DocError> {
        Ok(self
            .sheet(sheet)?
            .rows
            .get(&row)
            .and_then(|r| r.cells.keys().next_back().map(|last| last + 1))
            .unwrap_or(0))
    }

    fn cell_value(&self, sheet: &str, row: u32, col: u32) -> Result<CellValue, DocError> {
        Ok(self
            .sheet(sheet)?
            .rows
            .get(&row)
            .and_then(|r| r.cells.get(&col))
            .and_then(|c| c.value.clone())
            .unwrap_or(CellValue::Empty))
    }
}

impl SheetWriter for MemoryAdapter {
    fn set_cell_value(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Result<(), DocError> {
        self.cell_mut(sheet, row, col)?.value = Some(value);
        Ok(())
    }

    fn clear_cell(&mut self, sheet: &str, row: u32, col: u32) -> Result<(), DocError> {
        if let Some(cell) = self
            .sheet_mut(sheet)?
            .rows
            .get_mut(&row)
            .and_then(|r| r.cells.get_mut(&col))
        {
            cell.value = None;
            cell.formula = None;
        }
        Ok(())
    }

    fn ensure_row(&mut self, sheet: &str, row: u32) -> Result<(), DocError> {
        self.sheet_mut(sheet)?.rows.entry(row).or_default();
        Ok(())
    }

    fn insert_rows(&mut self, sheet: &str, at: u32, count: u32) -> Result<(), DocError> {
        if count == 0 {
            return Ok(());
        }
        let sheet_data = self.sheet_mut(sheet)?;

        let shifted = sheet_data.rows.split_off(&at);
        for (row, data) in shifted {
            sheet_data.rows.insert(row + count, data);
        }

        for row in sheet_data.rows.values_mut() {
            for cell in row.cells.values_mut() {
                if let Some(formula) = cell.formula.take() {
                    cell.formula = Some(shift_formula_rows(&formula, at, count));
                }
            }
        }
        Ok(())
    }

    fn copy_row_format(&mut self, sheet: &str, from: u32, to: u32) -> Result<(), DocError> {
        let sheet_data = self.sheet_mut(sheet)?;
        let Some(template) = sheet_data.rows.get(&from) else {
            return Err(DocError::template(format!(
                "row {from} does not exist in sheet `{sheet}`"
            )));
        };
        let height = template.height;
        let style = template.style;
        let cell_styles: Vec<(u32, u32)> = template
            .cells
            .iter()
            .filter_map(|(col, cell)| cell.style.map(|style| (*col, style)))
            .collect();

        let target = sheet_data.rows.entry(to).or_default();
        target.height = height;
        target.style = style;
        for (col, cell_style) in cell_styles {
            target.cells.entry(col).or_default().style = Some(cell_style);
        }
        Ok(())
    }

    fn recalculate(&mut self) -> Result<(), DocError> {
        // The contract only asks that stale cached values never survive a
        // save; an attached evaluation engine repopulates them.
        for sheet in &mut self.sheets {
            for row in sheet.rows.values_mut() {
                for cell in row.cells.values_mut() {
                    if cell.formula.is_some() {
                        cell.value = None;
                    }
                }
            }
        }
        Ok(())
    }

    fn save_writer<W: Write>(&self, writer: W) -> Result<(), DocError> {
        serde_json::to_writer_pretty(writer, self).map_err(|err| DocError::format(err.to_string()))
    }
}

/// Rewrite bare A1 references so rows at or after `at` (0-based) move down by
/// `count`. Matches that turn out to be function names or defined names are
/// left untouched.
fn shift_formula_rows(formula: &str, at: u32, count: u32) -> String {
    let bytes = formula.as_bytes();
    A1_REF
        .replace_all(formula, |caps: &Captures<'_>| {
            let whole = caps.get(0).expect("group 0 always present");
            if !is_cell_reference(bytes, whole.start(), whole.end(), &caps[1]) {
                return whole.as_str().to_string();
            }
            let row_1based: u64 = caps[2].parse().unwrap_or(0);
            if row_1based > 0 && row_1based - 1 >= u64::from(at) {
                format!("{}{}", &caps[1], row_1based + u64::from(count))
            } else {
                whole.as_str().to_string()
            }
        })
        .into_owned()
}

/// Decide whether a candidate match is a standalone A1 reference.
///
/// Stored formulas carry normalized uppercase column letters, so a lowercase
/// letter run is a defined name. A match glued to surrounding identifier
/// text, or followed by a call's opening paren, is part of a function name
/// or a longer identifier (`LOG10(`, `tax2024`).
fn is_cell_reference(bytes: &[u8], start: usize, end: usize, column: &str) -> bool {
    if !column.chars().all(|c| c == '$' || c.is_ascii_uppercase()) {
        return false;
    }
    let ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'.';
    if start > 0 && ident(bytes[start - 1]) {
        return false;
    }
    !matches!(bytes.get(end), Some(&b) if ident(b) || b == b'(')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter_with_rows() -> MemoryAdapter {
        let mut doc = MemoryAdapter::new();
        doc.add_sheet("Data");
        doc.set_cell_value("Data", 0, 0, CellValue::from("header")).unwrap();
        doc.set_cell_value("Data", 1, 0, CellValue::Int(10)).unwrap();
        doc.set_cell_value("Data", 2, 0, CellValue::Int(20)).unwrap();
        doc.set_cell_value("Data", 3, 0, CellValue::from("total")).unwrap();
        doc.set_formula("Data", 3, 1, "SUM(A2:A3)").unwrap();
        doc
    }

    #[test]
    fn row_and_cell_counts() {
        let doc = adapter_with_rows();
        assert_eq!(doc.row_count("Data").unwrap(), 4);
        assert_eq!(doc.row_cell_count("Data", 3).unwrap(), 2);
        assert_eq!(doc.row_cell_count("Data", 7).unwrap(), 0);
        assert_eq!(doc.cell_value("Data", 9, 9).unwrap(), CellValue::Empty);
        assert!(doc.row_count("Nope").is_err());
    }

    #[test]
    fn insert_rows_shifts_rows_and_patches_formulas() {
        let mut doc = adapter_with_rows();
        doc.insert_rows("Data", 3, 2).unwrap();

        // The footer row moved from index 3 to 5, formula intact but shifted.
        assert_eq!(doc.cell_value("Data", 5, 0).unwrap(), CellValue::from("total"));
        assert_eq!(doc.cell_value("Data", 3, 0).unwrap(), CellValue::Empty);
        assert_eq!(
            doc.cell_formula("Data", 5, 1).unwrap().as_deref(),
            // A2:A3 sits above the insertion point and must not move.
            Some("SUM(A2:A3)")
        );
    }

    #[test]
    fn formula_references_into_shifted_region_move() {
        let mut doc = MemoryAdapter::new();
        doc.add_sheet("Data");
        doc.set_formula("Data", 0, 0, "SUM(B4:B6)+$C$5").unwrap();
        doc.insert_rows("Data", 3, 2).unwrap();
        assert_eq!(
            doc.cell_formula("Data", 0, 0).unwrap().as_deref(),
            Some("SUM(B6:B8)+$C$7")
        );
    }

    #[test]
    fn function_names_are_not_rewritten_as_references() {
        let mut doc = MemoryAdapter::new();
        doc.add_sheet("Data");
        doc.set_formula("Data", 0, 0, "LOG10(A1)+SUM(B4:B6)").unwrap();
        doc.insert_rows("Data", 3, 2).unwrap();
        // LOG10 stays a function name; the real references still move.
        assert_eq!(
            doc.cell_formula("Data", 0, 0).unwrap().as_deref(),
            Some("LOG10(A1)+SUM(B6:B8)")
        );
    }

    #[test]
    fn defined_names_survive_row_shift() {
        let mut doc = MemoryAdapter::new();
        doc.add_sheet("Data");
        doc.set_formula("Data", 0, 0, "SUM(tax2024)*rates.q4").unwrap();
        doc.insert_rows("Data", 3, 2).unwrap();
        assert_eq!(
            doc.cell_formula("Data", 0, 0).unwrap().as_deref(),
            Some("SUM(tax2024)*rates.q4")
        );
    }

    #[test]
    fn clear_cell_keeps_style() {
        let mut doc = adapter_with_rows();
        doc.set_cell_style("Data", 1, 0, 7).unwrap();
        doc.clear_cell("Data", 1, 0).unwrap();
        assert_eq!(doc.cell_value("Data", 1, 0).unwrap(), CellValue::Empty);
        assert_eq!(doc.cell_style("Data", 1, 0).unwrap(), Some(7));
    }

    #[test]
    fn copy_row_format_copies_height_style_not_values() {
        let mut doc = adapter_with_rows();
        doc.set_row_height("Data", 1, 18.5).unwrap();
        doc.set_row_style("Data", 1, 3).unwrap();
        doc.set_cell_style("Data", 1, 0, 9).unwrap();

        doc.copy_row_format("Data", 1, 2).unwrap();
        assert_eq!(doc.row_height("Data", 2).unwrap(), Some(18.5));
        assert_eq!(doc.row_style("Data", 2).unwrap(), Some(3));
        assert_eq!(doc.cell_style("Data", 2, 0).unwrap(), Some(9));
        // Target value untouched.
        assert_eq!(doc.cell_value("Data", 2, 0).unwrap(), CellValue::Int(20));
    }

    #[test]
    fn copy_row_format_from_missing_row_is_template_error() {
        let mut doc = adapter_with_rows();
        match doc.copy_row_format("Data", 9, 2) {
            Err(DocError::Template { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn recalculate_drops_cached_formula_values() {
        let mut doc = adapter_with_rows();
        doc.set_cell_value("Data", 3, 1, CellValue::Int(30)).unwrap();
        doc.recalculate().unwrap();
        assert_eq!(doc.cell_value("Data", 3, 1).unwrap(), CellValue::Empty);
        assert!(doc.cell_formula("Data", 3, 1).unwrap().is_some());
        // Non-formula cells keep their values.
        assert_eq!(doc.cell_value("Data", 1, 0).unwrap(), CellValue::Int(10));
    }

    #[test]
    fn json_round_trip() {
        let doc = adapter_with_rows();
        let json = doc.to_json_string().unwrap();
        let back = MemoryAdapter::from_json_str(&json).unwrap();
        assert_eq!(back.sheet_names(), vec!["Data".to_string()]);
        assert_eq!(back.cell_value("Data", 2, 0).unwrap(), CellValue::Int(20));
        assert_eq!(
            back.cell_formula("Data", 3, 1).unwrap().as_deref(),
            Some("SUM(A2:A3)")
        );
    }
}
