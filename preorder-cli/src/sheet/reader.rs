//! Read identifier/SKU rows from spreadsheet exports
//!
//! Supports Excel/OpenDocument workbooks (first worksheet) and CSV files.
//! The first row is the header; only the identifier and SKU columns are kept.

use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, warn};
use std::path::Path;

use crate::api::models::{Identifier, Row, sku_from_float};
use crate::error::{Result, SyncError};

/// Header names of the two columns the loader needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub id_column: String,
    pub sku_column: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            sku_column: "sku".to_string(),
        }
    }
}

/// Source-neutral cell value
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    fn header_name(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Empty => String::new(),
            other => other.as_sku(),
        }
    }

    fn as_identifier(&self) -> Option<Identifier> {
        match self {
            Cell::Empty => None,
            Cell::Int(i) => Some(Identifier::Int(*i)),
            Cell::Float(f) => Some(Identifier::from_float(*f)),
            Cell::Text(s) => Identifier::from_text(s),
            Cell::Bool(b) => Some(Identifier::Text(b.to_string())),
        }
    }

    fn as_sku(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => sku_from_float(*f),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

/// Convert a calamine cell
fn from_calamine(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(format!("{}", dt)),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn from_csv_field(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Load `(identifier, sku)` rows in sheet order
///
/// Fails with `FileAccess` when the file cannot be opened or parsed and with
/// `Schema` when either required header is missing. Rows with a blank
/// identifier are skipped.
pub fn load_rows<P: AsRef<Path>>(path: P, schema: &ColumnSchema) -> Result<Vec<Row>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SyncError::file_access(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
        ));
    }

    let table = if is_csv(path) {
        read_csv_table(path)?
    } else {
        read_workbook_table(path)?
    };

    let rows = extract_rows(path, table, schema)?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_workbook_table(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SyncError::file_access(path, e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| SyncError::file_access(path, e))?,
        None => {
            return Err(SyncError::file_access(path, "workbook contains no worksheets"));
        }
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(from_calamine).collect())
        .collect())
}

fn read_csv_table(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SyncError::file_access(path, e))?;

    let mut table = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SyncError::file_access(path, e))?;
        table.push(record.iter().map(from_csv_field).collect());
    }
    Ok(table)
}

/// Locate the required columns in the header row and pull them out of every data row
fn extract_rows(path: &Path, table: Vec<Vec<Cell>>, schema: &ColumnSchema) -> Result<Vec<Row>> {
    let mut lines = table.into_iter();
    let headers: Vec<String> = lines
        .next()
        .map(|row| row.iter().map(Cell::header_name).collect())
        .unwrap_or_default();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name.trim()))
    };
    let id_col = find(schema.id_column.as_str());
    let sku_col = find(schema.sku_column.as_str());

    let (id_col, sku_col) = match (id_col, sku_col) {
        (Some(id), Some(sku)) => (id, sku),
        (id, sku) => {
            let mut missing = Vec::new();
            if id.is_none() {
                missing.push(schema.id_column.clone());
            }
            if sku.is_none() {
                missing.push(schema.sku_column.clone());
            }
            return Err(SyncError::Schema {
                path: path.to_path_buf(),
                missing,
            });
        }
    };

    let mut rows = Vec::new();
    for (offset, line) in lines.enumerate() {
        let cell = |col: usize| line.get(col).cloned().unwrap_or(Cell::Empty);

        let Some(identifier) = cell(id_col).as_identifier() else {
            if line.iter().any(|c| *c != Cell::Empty) {
                // +2: header row plus 1-based numbering
                warn!("Skipping line {} of {}: empty identifier", offset + 2, path.display());
            }
            continue;
        };

        rows.push(Row {
            identifier,
            sku: cell(sku_col).as_sku(),
        });
    }

    Ok(rows)
}
