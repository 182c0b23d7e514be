use gridbind_doc::{CellValue, SheetReader};
use tracing::{debug, error};

use crate::error::BindError;
use crate::header::resolve_headers;
use crate::metadata::Metadata;
use crate::rules::RuleError;
use crate::slots::{FailCode, FailedInfo, RowInfo, RowSlots};

/// Hook verdict controlling whether a traversal continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    Stop,
}

/// Caller-side callbacks for one import run.
///
/// Every method has a default so a consumer implements only what it needs.
/// `on_row` receives each fully validated and converted row; `on_failed`
/// receives each recorded failure while the batch keeps going.
pub trait ImportHooks {
    fn begin(&mut self) {}

    /// Called before a sheet is traversed. [`Flow::Stop`] skips this sheet
    /// and moves on to the next enabled one.
    fn on_sheet_start(&mut self, _sheet: &str) -> Flow {
        Flow::Continue
    }

    fn on_row(&mut self, _info: &RowInfo, _row: &RowSlots) {}

    fn on_failed(&mut self, _failure: FailedInfo) {}

    /// Called once per non-blank data row, before validation.
    fn add_total(&mut self, _rows: u32) {}

    /// Called after a sheet finishes. [`Flow::Stop`] ends the whole run.
    fn on_sheet_finished(&mut self, _sheet: &str) -> Flow {
        Flow::Continue
    }

    fn finish(&mut self) {}
}

/// Import traversal: walks every enabled sheet of a document and hands
/// validated rows to the caller's hooks.
pub struct Importer<'m> {
    metadata: &'m Metadata,
}

impl<'m> Importer<'m> {
    pub fn new(metadata: &'m Metadata) -> Self {
        Self { metadata }
    }

    pub fn run<R, H>(&self, reader: &R, hooks: &mut H) -> Result<(), BindError>
    where
        R: SheetReader + ?Sized,
        H: ImportHooks,
    {
        hooks.begin();
        for (index, sheet) in reader.sheet_names().iter().enumerate() {
            if !self.metadata.sheet_enabled(index as u32, sheet) {
                continue;
            }
            if hooks.on_sheet_start(sheet) == Flow::Stop {
                debug!(sheet, "sheet skipped by hook");
                continue;
            }
            self.import_sheet(reader, sheet, hooks)?;
            if hooks.on_sheet_finished(sheet) == Flow::Stop {
                debug!(sheet, "run stopped by hook");
                break;
            }
        }
        hooks.finish();
        Ok(())
    }

    fn import_sheet<R, H>(&self, reader: &R, sheet: &str, hooks: &mut H) -> Result<(), BindError>
    where
        R: SheetReader + ?Sized,
        H: ImportHooks,
    {
        let mut slots = resolve_headers(reader, sheet, self.metadata)?;
        let row_count = reader.row_count(sheet)?;

        for row in self.metadata.skip_rows()..row_count {
            if self.metadata.header_rows().is_enabled(row)
                || self.metadata.footer_rows().is_enabled(row)
            {
                continue;
            }

            for i in 0..slots.len() {
                let slot = slots.slot_at_mut(i);
                let column = slot.column;
                slot.row = row;
                slot.value = reader.cell_value(sheet, row, column)?.trimmed();
            }
            if slots.iter().all(|slot| slot.value.is_blank()) {
                continue;
            }
            hooks.add_total(1);

            if let Some(target) = self.metadata.sheet_name_fill_to()
                && !Metadata::is_default_sheet_name(sheet)
            {
                slots.set_value(target, CellValue::from(sheet));
            }

            if self.convert_row(sheet, row, &mut slots, hooks) {
                let info = RowInfo {
                    sheet: sheet.to_string(),
                    row_number: row + 1,
                };
                hooks.on_row(&info, &slots);
            }
        }
        Ok(())
    }

    /// Validate and convert one loaded row. The first failing field stops
    /// the row and records one failure; later fields are not evaluated.
    fn convert_row<H: ImportHooks>(
        &self,
        sheet: &str,
        row: u32,
        slots: &mut RowSlots,
        hooks: &mut H,
    ) -> bool {
        for i in 0..slots.len() {
            let slot = slots.slot_at(i);
            let field = slot.field.clone();

            if slot.required && slot.value.is_blank() {
                hooks.on_failed(FailedInfo {
                    sheet: sheet.to_string(),
                    row_number: row + 1,
                    field: Some(field.clone()),
                    code: FailCode::Required,
                    message: format!("`{}` must not be blank", slot.title),
                });
                return false;
            }

            let Some(rule) = self.metadata.rule(&field) else {
                continue;
            };
            let raw = slots.slot_at(i).value.clone();
            match rule.import(slots, &field) {
                Ok(()) => {}
                Err(RuleError::Violation(message)) => {
                    let message = if raw.is_primitive() {
                        format!("{message} (value: `{raw}`)")
                    } else {
                        message
                    };
                    hooks.on_failed(FailedInfo {
                        sheet: sheet.to_string(),
                        row_number: row + 1,
                        field: Some(field),
                        code: FailCode::RuleRejected,
                        message,
                    });
                    return false;
                }
                Err(RuleError::Unexpected(message)) => {
                    error!(sheet, row = row + 1, field, %message, "rule failed unexpectedly");
                    hooks.on_failed(FailedInfo {
                        sheet: sheet.to_string(),
                        row_number: row + 1,
                        field: Some(field),
                        code: FailCode::Unexpected,
                        message,
                    });
                    return false;
                }
            }
        }
        true
    }
}
