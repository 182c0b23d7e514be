//! GridBind specification model.
//!
//! This crate holds the declarative half of the GridBind engine: the flat
//! key/value configuration consumed by the runtime, the compact selector
//! grammar used to pick rows and sheets, the required-marker grammar applied
//! to header text, and the ordered column-token list. It deliberately knows
//! nothing about concrete spreadsheets; the `gridbind` crate binds this model
//! to documents at runtime.

mod columns;
mod config;
mod marker;
mod selector;
mod validation;

pub use columns::{COLUMN_PLACEHOLDER, ColumnSpec, parse_column_list, parse_columns};
pub use config::{BindConfig, ConfigValue, keys};
pub use marker::parse_marker;
pub use selector::{IndexSelector, NameSelector, SelectorMode};
pub use validation::{ConfigIssue, ValidationError};

/// Split a delimiter-separated token list on `,` or `|`, trimming each token.
///
/// Empty tokens are preserved so positional grammars (the column list) can
/// treat them as placeholders.
pub(crate) fn split_list(input: &str) -> impl Iterator<Item = &str> {
    input.split([',', '|']).map(str::trim)
}
