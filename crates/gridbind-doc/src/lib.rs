//! GridBind document contract.
//!
//! The binding engine never touches a spreadsheet file format directly; it
//! speaks to documents through the [`SheetReader`] / [`SheetWriter`] traits
//! defined here. [`MemoryAdapter`] is the reference backend: a JSON-
//! serializable in-memory workbook that implements the full contract,
//! including template-preserving row insertion. Real file-format adapters
//! implement the same pair of traits.
//!
//! Rows and columns are 0-based throughout.

pub mod error;
pub mod memory;
pub mod traits;
pub mod value;

pub use error::DocError;
pub use memory::{MemCell, MemoryAdapter};
pub use traits::{SheetReader, SheetWriter};
pub use value::CellValue;
