use std::io::Read;
use tracing::debug;

use super::{RawCell, RawRow, Sheet};
use crate::error::Result;

/// Read a flat CSV source into one sheet. All cells come back as text; a
/// UTF-8 byte-order mark on the first header is dropped.
pub fn read_sheet<R: Read>(name: &str, reader: R) -> Result<Sheet> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let cells = headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let cell = record.get(col).map(RawCell::text).unwrap_or(RawCell::Empty);
                (header.clone(), cell)
            })
            .collect();
        let row = RawRow::new(i + 1, cells);
        if !row.is_blank() {
            rows.push(row);
        }
    }

    debug!("Read CSV sheet '{}' with {} columns, {} rows", name, headers.len(), rows.len());
    Ok(Sheet {
        name: name.to_string(),
        headers,
        rows,
    })
}
