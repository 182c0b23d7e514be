use std::collections::BTreeSet;

use tracing::warn;

use crate::marker::parse_marker;

/// Token that skips one spreadsheet column without binding a field to it.
pub const COLUMN_PLACEHOLDER: &str = "-";

/// One declared column from the ordered `columns` configuration token list.
///
/// `column` is the 0-based spreadsheet column position and is the source of
/// truth for cell lookup; `field` is unique within one parsed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: String,
    pub column: u32,
    pub required: bool,
}

/// Parse an ordered token iterator into column specs indexed by spreadsheet
/// column position.
///
/// A token is a bare field name, a required-marked field name (marker
/// grammar), or a placeholder (`-` or empty) that leaves the column unbound.
/// A duplicate field name is logged and its column left unbound; parsing
/// continues.
pub fn parse_columns<'a, I>(tokens: I) -> Vec<Option<ColumnSpec>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut specs = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for (index, raw) in tokens.into_iter().enumerate() {
        let token = raw.trim();
        if token.is_empty() || token == COLUMN_PLACEHOLDER {
            specs.push(None);
            continue;
        }

        let Some((field, required)) = parse_marker(token) else {
            warn!(token, column = index, "unparsable column token; column left unbound");
            specs.push(None);
            continue;
        };

        if !seen.insert(field.clone()) {
            warn!(field, column = index, "duplicate field in column list; column left unbound");
            specs.push(None);
            continue;
        }

        specs.push(Some(ColumnSpec {
            field,
            column: index as u32,
            required,
        }));
    }

    specs
}

/// Parse a delimiter-separated `columns` configuration value.
pub fn parse_column_list(value: &str) -> Vec<Option<ColumnSpec>> {
    parse_columns(crate::split_list(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_parse_with_placeholders() {
        let specs = parse_column_list("id,*name,-,amount(*),note");
        assert_eq!(specs.len(), 5);
        assert_eq!(
            specs[0],
            Some(ColumnSpec {
                field: "id".to_string(),
                column: 0,
                required: false,
            })
        );
        assert_eq!(
            specs[1],
            Some(ColumnSpec {
                field: "name".to_string(),
                column: 1,
                required: true,
            })
        );
        assert_eq!(specs[2], None);
        assert_eq!(
            specs[3],
            Some(ColumnSpec {
                field: "amount".to_string(),
                column: 3,
                required: true,
            })
        );
        assert_eq!(specs[4].as_ref().map(|s| s.column), Some(4));
    }

    #[test]
    fn duplicate_field_leaves_later_column_unbound() {
        let specs = parse_column_list("id,name,id");
        assert!(specs[0].is_some());
        assert!(specs[1].is_some());
        assert_eq!(specs[2], None);
    }

    #[test]
    fn empty_token_is_a_placeholder() {
        let specs = parse_column_list("id,,note");
        assert!(specs[0].is_some());
        assert_eq!(specs[1], None);
        assert_eq!(specs[2].as_ref().map(|s| s.column), Some(2));
    }
}
