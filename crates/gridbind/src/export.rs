use std::collections::BTreeMap;

use gridbind_doc::{CellValue, SheetWriter};
use tracing::{debug, warn};

use crate::error::BindError;
use crate::header::resolve_headers;
use crate::import::Flow;
use crate::metadata::Metadata;
use crate::slots::{RowInfo, RowSlots};

/// Caller-side callbacks for one export run over records of type `T`.
///
/// `convert` is the only mandatory method: it turns one record into field
/// values. Undeclared fields in the returned map are ignored; declared
/// fields missing from it are written as blanks.
pub trait ExportHooks<T> {
    fn begin(&mut self) {}

    /// Called before a sheet is filled. [`Flow::Stop`] skips this sheet.
    fn on_sheet_start(&mut self, _sheet: &str, _records: &[T]) -> Flow {
        Flow::Continue
    }

    fn convert(&mut self, record: &T) -> BTreeMap<String, CellValue>;

    /// Called after a record's values are loaded but before any cell is
    /// written.
    fn on_row_start(&mut self, _info: &RowInfo, _row: &RowSlots) {}

    /// Called after a record's cells are written; the pool holds the final
    /// rule-converted values.
    fn on_row_finished(&mut self, _info: &RowInfo, _row: &RowSlots) {}

    /// Called after a sheet is filled. [`Flow::Stop`] ends the whole run.
    fn on_sheet_finished(&mut self, _sheet: &str) -> Flow {
        Flow::Continue
    }

    fn finish(&mut self) {}
}

/// Export traversal: fills every enabled sheet of a template document with
/// converted records, growing the data region without overwriting footers.
pub struct Exporter<'m> {
    metadata: &'m Metadata,
}

impl<'m> Exporter<'m> {
    pub fn new(metadata: &'m Metadata) -> Self {
        Self { metadata }
    }

    pub fn run<W, T, H>(&self, writer: &mut W, records: &[T], hooks: &mut H) -> Result<(), BindError>
    where
        W: SheetWriter + ?Sized,
        H: ExportHooks<T>,
    {
        hooks.begin();
        for (index, sheet) in writer.sheet_names().iter().enumerate() {
            if !self.metadata.sheet_enabled(index as u32, sheet) {
                continue;
            }
            if hooks.on_sheet_start(sheet, records) == Flow::Stop {
                debug!(sheet, "sheet skipped by hook");
                continue;
            }
            self.export_sheet(writer, sheet, records, hooks)?;
            if hooks.on_sheet_finished(sheet) == Flow::Stop {
                debug!(sheet, "run stopped by hook");
                break;
            }
        }
        writer.recalculate()?;
        hooks.finish();
        Ok(())
    }

    fn export_sheet<W, T, H>(
        &self,
        writer: &mut W,
        sheet: &str,
        records: &[T],
        hooks: &mut H,
    ) -> Result<(), BindError>
    where
        W: SheetWriter + ?Sized,
        H: ExportHooks<T>,
    {
        let mut slots = resolve_headers(writer, sheet, self.metadata)?;
        let begin = self.metadata.skip_rows();

        // Footer handling needs at least one full data row between the data
        // start and the footer; anything tighter is a layout mistake.
        let footer_row = match self.metadata.footer_rows().min() {
            Some(min) if min > begin + 1 => Some(min),
            Some(min) => {
                warn!(sheet, footer = min, data = begin, "footer too close to data region; ignored");
                None
            }
            None => None,
        };

        if let Some(footer) = footer_row {
            let template_rows = footer - begin;
            let needed = records.len() as u32;
            if needed > template_rows {
                writer.insert_rows(sheet, footer, needed - template_rows)?;
            }
        }

        for (i, record) in records.iter().enumerate() {
            let row = begin + i as u32;
            writer.ensure_row(sheet, row)?;
            if i > 0 {
                // The first data row is the formatting template for the rest.
                writer.copy_row_format(sheet, begin, row)?;
            }

            let mut values = hooks.convert(record);
            for j in 0..slots.len() {
                let slot = slots.slot_at_mut(j);
                slot.row = row;
                slot.value = values.remove(&slot.field).unwrap_or(CellValue::Empty);
            }

            let info = RowInfo {
                sheet: sheet.to_string(),
                row_number: row + 1,
            };
            hooks.on_row_start(&info, &slots);

            for j in 0..slots.len() {
                let field = slots.slot_at(j).field.clone();
                if let Some(rule) = self.metadata.rule(&field) {
                    rule.export(&mut slots, &field);
                }
                let slot = slots.slot_at(j);
                if slot.value == CellValue::Empty {
                    writer.clear_cell(sheet, row, slot.column)?;
                } else {
                    writer.set_cell_value(sheet, row, slot.column, slot.value.clone())?;
                }
            }

            // Stale template cells beyond the declared layout would leak into
            // the output; blank them, styling stays.
            let width = self.metadata.column_count();
            for col in width..writer.row_cell_count(sheet, row)? {
                writer.clear_cell(sheet, row, col)?;
            }

            hooks.on_row_finished(&info, &slots);
        }
        Ok(())
    }
}
