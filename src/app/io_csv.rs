// Primitives for reading CSV files.

use crate::app::*;

/// Reads all the lines of a CSV file as raw cells.
///
/// The lines may have different lengths. Blank fields are missing cells.
pub fn read_csv_rows(path: &str) -> AppResult<Vec<Vec<RawCount>>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut res: Vec<Vec<RawCount>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: Vec<RawCount> = line
            .iter()
            .map(|s| {
                if s.trim().is_empty() {
                    RawCount::Missing
                } else {
                    RawCount::Text(s.to_string())
                }
            })
            .collect();
        res.push(row);
    }
    debug!("read_csv_rows: {:?}: {} lines", path, res.len());
    Ok(res)
}
