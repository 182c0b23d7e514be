//! GridBind: configuration-driven binding between spreadsheets and records.
//!
//! A [`Metadata`] value, built once from a [`BindConfig`], describes a
//! spreadsheet layout: which columns carry which fields, where headers and
//! footers sit, which sheets participate, and how raw cell values convert to
//! and from field values. [`Importer`] walks a document and hands validated
//! rows to caller hooks; [`Exporter`] fills a template document from records
//! while preserving formatting, formulas, and footer rows.
//!
//! Documents are abstracted behind the `gridbind-doc` traits, so any backend
//! implementing [`SheetReader`]/[`SheetWriter`] plugs in.

mod error;
mod export;
mod header;
mod import;
mod metadata;
mod rules;
mod slots;

pub use error::BindError;
pub use export::{ExportHooks, Exporter};
pub use header::resolve_headers;
pub use import::{Flow, ImportHooks, Importer};
pub use metadata::Metadata;
pub use rules::{ConversionRule, DateRule, ERROR_MARKER, InvalidPattern, MapRule, RuleBinding, RuleError};
pub use slots::{FailCode, FailedInfo, FieldSlot, RowInfo, RowSlots};

pub use gridbind_doc::{CellValue, DocError, MemoryAdapter, SheetReader, SheetWriter};
pub use gridbind_spec::{BindConfig, ColumnSpec, ConfigValue, IndexSelector, NameSelector};
