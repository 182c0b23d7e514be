use std::collections::BTreeMap;
use std::fmt;

use gridbind_doc::CellValue;

/// Per-field, per-sheet value holder.
///
/// One slot per declared column, built once per sheet traversal by the
/// header resolver and rewritten in place for every row (`row` and `value`
/// change; the rest is fixed after header resolution). Callers receiving the
/// pool in a callback must not retain slot values past the current row.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlot {
    pub field: String,
    /// 0-based spreadsheet column; source of truth for cell lookup.
    pub column: u32,
    pub required: bool,
    /// Header text resolved for this field, or the positional placeholder.
    pub title: String,
    /// 0-based row currently loaded into the slot.
    pub row: u32,
    pub value: CellValue,
}

/// Row-scoped value pool: the full set of field slots for one sheet
/// traversal, in declaration order.
///
/// Passed `&mut` into rule dispatch (rules may read sibling fields) and `&`
/// into the success callback.
#[derive(Debug, Clone)]
pub struct RowSlots {
    slots: Vec<FieldSlot>,
    index: BTreeMap<String, usize>,
}

impl RowSlots {
    pub(crate) fn new(slots: Vec<FieldSlot>) -> Self {
        let index = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.field.clone(), i))
            .collect();
        Self { slots, index }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSlot> {
        self.slots.iter()
    }

    pub fn get(&self, field: &str) -> Option<&FieldSlot> {
        self.index.get(field).map(|&i| &self.slots[i])
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldSlot> {
        let i = *self.index.get(field)?;
        Some(&mut self.slots[i])
    }

    /// Current value of one field, if declared.
    pub fn value(&self, field: &str) -> Option<&CellValue> {
        self.get(field).map(|slot| &slot.value)
    }

    /// Overwrite one field's value. Returns false for undeclared fields.
    pub fn set_value(&mut self, field: &str, value: CellValue) -> bool {
        match self.get_mut(field) {
            Some(slot) => {
                slot.value = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn slot_at(&self, index: usize) -> &FieldSlot {
        &self.slots[index]
    }

    pub(crate) fn slot_at_mut(&mut self, index: usize) -> &mut FieldSlot {
        &mut self.slots[index]
    }
}

/// Identity of one successfully processed row, handed to the success
/// callback together with the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInfo {
    pub sheet: String,
    /// 1-based, as a human would read it off the spreadsheet.
    pub row_number: u32,
}

/// Classification of one recorded row failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailCode {
    /// A required field was blank.
    Required,
    /// A conversion rule rejected the raw value.
    RuleRejected,
    /// An internal fault during conversion; logged with full detail.
    Unexpected,
}

impl FailCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailCode::Required => "required",
            FailCode::RuleRejected => "rule_rejected",
            FailCode::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation/conversion failure. The batch aggregate lives with the
/// caller; the engine only produces these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedInfo {
    pub sheet: String,
    /// 1-based row number.
    pub row_number: u32,
    pub field: Option<String>,
    pub code: FailCode,
    pub message: String,
}
