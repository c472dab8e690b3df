// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::app::*;

fn read_cell(cell: &DataType) -> RawCount {
    match cell {
        DataType::Float(f) => RawCount::Number(*f),
        DataType::Int(i) => RawCount::Number(*i as f64),
        DataType::String(s) if s.trim().is_empty() => RawCount::Missing,
        DataType::String(s) => RawCount::Text(s.clone()),
        DataType::Empty => RawCount::Missing,
        x => RawCount::Text(format!("{:?}", x)),
    }
}

/// Reads all the rows of a worksheet (by default, the first one).
pub fn read_excel_rows(path: &str, worksheet_name: Option<&str>) -> AppResult<Vec<Vec<RawCount>>> {
    debug!(
        "read_excel_rows: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let rows: Vec<Vec<RawCount>> = wrange
        .rows()
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    debug!("read_excel_rows: {} rows", rows.len());
    Ok(rows)
}
