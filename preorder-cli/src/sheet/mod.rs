//! Spreadsheet input: the identifier/SKU rows to reconcile

mod reader;

pub use reader::{ColumnSchema, load_rows};
