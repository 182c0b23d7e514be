use gridbind_doc::{CellValue, DocError, SheetReader};
use gridbind_spec::parse_marker;

use crate::metadata::Metadata;
use crate::slots::{FieldSlot, RowSlots};

/// Resolve header titles for every declared column of one sheet.
///
/// Each enabled header row is read for each declared column; when several
/// header rows carry text for the same column the last one wins. A
/// required marker found in a header upgrades the column to required; it
/// never downgrades a declaration-level requirement. Columns with no header
/// text fall back to a positional title.
pub fn resolve_headers<R: SheetReader + ?Sized>(
    reader: &R,
    sheet: &str,
    metadata: &Metadata,
) -> Result<RowSlots, DocError> {
    let row_count = reader.row_count(sheet)?;
    let mut slots = Vec::new();

    for spec in metadata.declared_columns() {
        let mut title: Option<String> = None;
        let mut header_required: Option<bool> = None;

        // Only explicit header indices are scanned; `*` has no enumerable
        // membership and yields positional titles.
        for row in metadata.header_rows().iter().filter(|&row| row < row_count) {
            let cell = reader.cell_value(sheet, row, spec.column)?;
            if cell.is_blank() {
                continue;
            }
            if let Some((name, required)) = parse_marker(&cell.to_string()) {
                title = Some(name);
                header_required = Some(required);
            }
        }

        slots.push(FieldSlot {
            field: spec.field.clone(),
            column: spec.column,
            required: spec.required || header_required.unwrap_or(false),
            title: title.unwrap_or_else(|| format!("column {}", spec.column)),
            row: 0,
            value: CellValue::Empty,
        });
    }

    Ok(RowSlots::new(slots))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbind_doc::{MemoryAdapter, SheetWriter};
    use gridbind_spec::BindConfig;

    fn metadata(yaml: &str) -> Metadata {
        let config = BindConfig::from_yaml_str(yaml).expect("yaml parses");
        Metadata::from_config(&config).expect("metadata builds")
    }

    #[test]
    fn later_header_row_wins_and_required_upgrades() {
        let mut doc = MemoryAdapter::default();
        doc.add_sheet("Roster");
        doc.set_cell_value("Roster", 0, 0, CellValue::from("Identifier")).unwrap();
        doc.set_cell_value("Roster", 0, 1, CellValue::from("Name")).unwrap();
        doc.set_cell_value("Roster", 1, 1, CellValue::from("*Full Name")).unwrap();

        let meta = metadata("columns: \"id,name,joined\"\nheader.rows: \"1-2\"\n");
        let slots = resolve_headers(&doc, "Roster", &meta).unwrap();

        let id = slots.get("id").unwrap();
        assert_eq!(id.title, "Identifier");
        assert!(!id.required);

        let name = slots.get("name").unwrap();
        assert_eq!(name.title, "Full Name");
        assert!(name.required);

        // No header text at all: positional fallback.
        let joined = slots.get("joined").unwrap();
        assert_eq!(joined.title, "column 2");
    }

    #[test]
    fn declaration_required_survives_unmarked_header() {
        let mut doc = MemoryAdapter::default();
        doc.add_sheet("Roster");
        doc.set_cell_value("Roster", 0, 0, CellValue::from("Name")).unwrap();

        let meta = metadata("columns: \"*name\"\nheader.row: \"1\"\n");
        let slots = resolve_headers(&doc, "Roster", &meta).unwrap();
        let name = slots.get("name").unwrap();
        assert!(name.required);
        assert_eq!(name.title, "Name");
    }

    #[test]
    fn no_header_rows_means_positional_titles() {
        let mut doc = MemoryAdapter::default();
        doc.add_sheet("Roster");

        let meta = metadata("columns: \"id,-,amount\"\n");
        let slots = resolve_headers(&doc, "Roster", &meta).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get("amount").unwrap().title, "column 2");
    }
}
