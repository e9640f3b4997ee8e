//! Spreadsheet export with cosmetic formatting.
//!
//! Writes a [`Table`] to a single-sheet `.xlsx` file, turns on the header
//! filter and sizes every column to its longest cell plus a padding constant.
//! Independent of [`PersistentMap`](crate::PersistentMap); the two only share
//! `serde_json::Value` as the cell type.

use crate::error::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Default number of characters added to each column's longest cell.
pub const DEFAULT_COLUMN_PADDING: usize = 5;

/// Default worksheet name.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Excel's hard cap on a column width, in characters.
const MAX_COLUMN_WIDTH: usize = 255;

/// A header row plus data rows.
///
/// Rows shorter than the header are padded with blank cells; cells past the
/// last header column are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names, written as the first row.
    pub headers: Vec<String>,
    /// Data rows.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Table with the given headers and no rows.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a data row.
    pub fn push_row<I, V>(&mut self, row: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Number of columns (the header width).
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Cell at (`row`, `col`) of the data rows, `None` when blank or missing.
    fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .filter(|v| !v.is_null())
    }
}

/// Options for [`write_excel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelOptions {
    /// Turn on the autofilter over the used range.
    pub filter: bool,
    /// Characters added to each column's longest cell.
    pub padding: usize,
    /// Name of the single worksheet.
    pub sheet_name: String,
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            filter: true,
            padding: DEFAULT_COLUMN_PADDING,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

/// Text a cell displays as. Null is blank; arrays and objects are compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Display width per column: the longest cell text (header included), in
/// characters, plus `padding`.
///
/// Text comes from [`cell_text`], so blank (null or missing) cells count as
/// zero characters rather than as a placeholder word. A column whose cells
/// are all blank is as wide as its header plus `padding`.
pub fn column_widths(table: &Table, padding: usize) -> Vec<usize> {
    (0..table.width())
        .map(|col| {
            let longest_body = (0..table.rows.len())
                .filter_map(|row| table.cell(row, col))
                .map(|v| cell_text(v).chars().count())
                .max()
                .unwrap_or(0);
            usize::max(table.headers[col].chars().count(), longest_body) + padding
        })
        .collect()
}

/// Write `table` to `path` as a formatted spreadsheet.
///
/// Any existing file at `path` is overwritten. I/O failures come back as
/// [`Error::Io`] without retry.
pub fn write_excel(path: impl AsRef<Path>, table: &Table, options: &ExcelOptions) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name)?;

    write_header(worksheet, table)?;
    for row in 0..table.rows.len() {
        let n_row = cast_row_num(row + 1)?;
        for col in 0..table.width() {
            if let Some(value) = table.cell(row, col) {
                write_cell(worksheet, n_row, cast_col_num(col)?, value)?;
            }
        }
    }

    if options.filter && table.width() > 0 {
        worksheet.autofilter(
            0,
            0,
            cast_row_num(table.rows.len())?,
            cast_col_num(table.width() - 1)?,
        )?;
    }

    for (col, width) in column_widths(table, options.padding).into_iter().enumerate() {
        let width = usize::min(width, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(cast_col_num(col)?, width as f64)?;
    }

    workbook.save(path)?;
    debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.width(),
        filter = options.filter,
        "wrote spreadsheet"
    );
    Ok(())
}

fn write_header(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    let fmt_header = Format::new().set_bold();
    for (col, name) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, cast_col_num(col)?, name, &fmt_header)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                worksheet.write_number(row, col, f)?;
            }
            None => {
                worksheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}

fn cast_row_num(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Xlsx(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::Xlsx(format!("column index overflow: {value}")))
}
