use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, warn};

use super::{RawCell, RawRow, Sheet};
use crate::error::Result;

/// Read all sheets of a workbook, in workbook order.
pub fn read_sheets(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let sheet = sheet_from_rows(&name, range.rows());
        debug!(
            "Read workbook sheet '{}' with {} columns, {} rows",
            sheet.name,
            sheet.headers.len(),
            sheet.rows.len()
        );
        sheets.push(sheet);
    }

    Ok(sheets)
}

/// Build a sheet from raw cell rows; the first row is the header row.
pub fn sheet_from_rows<'a, I>(name: &str, mut rows: I) -> Sheet
where
    I: Iterator<Item = &'a [Data]>,
{
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => {
            warn!("Sheet '{}' is empty", name);
            Vec::new()
        }
    };

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let cell = row.get(col).map(convert_cell).unwrap_or(RawCell::Empty);
                (header.clone(), cell)
            })
            .collect();
        let row = RawRow::new(i + 1, cells);
        if !row.is_blank() {
            out.push(row);
        }
    }

    Sheet {
        name: name.to_string(),
        headers,
        rows: out,
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => convert_cell(other).describe(),
    }
}

/// Map a workbook cell onto the source-neutral cell type. Error cells
/// (`#N/A`, `#DIV/0!`, ...) become empty.
pub fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::text(s.clone()),
        Data::Int(v) => RawCell::Int(*v),
        Data::Float(v) => RawCell::Float(*v),
        Data::Bool(v) => RawCell::Bool(*v),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => RawCell::Date(ndt.date()),
            None => RawCell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::text(s.clone()),
        Data::Error(_) => RawCell::Empty,
    }
}
