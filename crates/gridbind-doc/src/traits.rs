use crate::error::DocError;
use crate::value::CellValue;

/// Read side of the document contract.
///
/// Rows and columns are 0-based. Reading past the populated region is not an
/// error: absent cells read as [`CellValue::Empty`].
pub trait SheetReader {
    /// Sheet names in document order.
    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|name| name == sheet)
    }

    /// Number of physical rows in the sheet (one past the last populated
    /// row index).
    fn row_count(&self, sheet: &str) -> Result<u32, DocError>;

    /// Number of physical cells in one row (one past the last populated
    /// column index; 0 for an absent row).
    fn row_cell_count(&self, sheet: &str, row: u32) -> Result<u32, DocError>;

    /// Raw value of one cell.
    fn cell_value(&self, sheet: &str, row: u32, col: u32) -> Result<CellValue, DocError>;
}

/// Write side of the document contract, layered on top of reading.
pub trait SheetWriter: SheetReader {
    /// Write a value into a cell, creating the row/cell as needed.
    fn set_cell_value(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
    ) -> Result<(), DocError>;

    /// Reset a cell to the blank type: value and formula are dropped,
    /// styling stays.
    fn clear_cell(&mut self, sheet: &str, row: u32, col: u32) -> Result<(), DocError>;

    /// Make sure a physical row exists at `row`.
    fn ensure_row(&mut self, sheet: &str, row: u32) -> Result<(), DocError>;

    /// Shift every row at or after `at` down by `count`, preserving formula
    /// references that point into the shifted region. Patching references
    /// that live on a different sheet is out of contract.
    fn insert_rows(&mut self, sheet: &str, at: u32, count: u32) -> Result<(), DocError>;

    /// Copy row height and styling from one row to another. Cell values and
    /// formulas of the target row are untouched.
    fn copy_row_format(&mut self, sheet: &str, from: u32, to: u32) -> Result<(), DocError>;

    /// Trigger one full-document formula recalculation pass.
    fn recalculate(&mut self) -> Result<(), DocError>;

    /// Serialize the document to a writer.
    fn save_writer<W: std::io::Write>(&self, writer: W) -> Result<(), DocError>;
}
