// Turns the rows of a population table into municipality records.

use crate::app::io_csv::read_csv_rows;
use crate::app::io_excel::read_excel_rows;
use crate::app::*;
use voting_influence::builder::RecordBuilder;

/// How the columns of the table are located.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ColumnLayoutMode {
    /// The columns are found by their names in the header row.
    Header,
    /// Code, prefecture, municipality, gender, total, then the 21 age brackets.
    Positional,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct ColumnLayout {
    code: usize,
    prefecture: usize,
    municipality: usize,
    stratum: usize,
    total: Option<usize>,
    brackets: Vec<(AgeBracket, usize)>,
}

const CODE_HEADERS: [&str; 2] = ["団体コード", "code"];
const PREFECTURE_HEADERS: [&str; 2] = ["都道府県名", "prefecture"];
const MUNICIPALITY_HEADERS: [&str; 2] = ["市区町村名", "municipality"];
const STRATUM_HEADERS: [&str; 2] = ["性別", "gender"];
const TOTAL_HEADERS: [&str; 2] = ["総数", "total"];

const FIRST_BRACKET_COLUMN: usize = 5;

pub fn cell_text(cell: &RawCount) -> String {
    match cell {
        RawCount::Number(x) => x.to_string(),
        RawCount::Text(s) => s.trim().to_string(),
        RawCount::Missing => "".to_string(),
    }
}

fn find_column(header: &[String], names: &[&str]) -> Option<usize> {
    header.iter().position(|h| names.contains(&h.as_str()))
}

fn required_column(header: &[String], names: &[&str]) -> AppResult<usize> {
    find_column(header, names).context(MissingColumnSnafu {
        column: names[0].to_string(),
    })
}

impl ColumnLayout {
    fn positional() -> ColumnLayout {
        ColumnLayout {
            code: 0,
            prefecture: 1,
            municipality: 2,
            stratum: 3,
            total: Some(4),
            brackets: AgeBracket::ALL
                .iter()
                .enumerate()
                .map(|(idx, b)| (*b, FIRST_BRACKET_COLUMN + idx))
                .collect(),
        }
    }

    fn from_header(row: &[RawCount]) -> AppResult<ColumnLayout> {
        let header: Vec<String> = row.iter().map(cell_text).collect();
        debug!("from_header: header: {:?}", header);
        let mut brackets: Vec<(AgeBracket, usize)> = Vec::new();
        for (idx, h) in header.iter().enumerate() {
            if let Some(b) = AgeBracket::from_label(h) {
                if brackets.iter().any(|(b2, _)| *b2 == b) {
                    warn!("from_header: column {} repeats the age bracket {}", idx, b);
                } else {
                    brackets.push((b, idx));
                }
            }
        }
        let missing: Vec<String> = AgeBracket::ALL
            .iter()
            .filter(|b| !brackets.iter().any(|(b2, _)| b2 == *b))
            .map(|b| b.label())
            .collect();
        if !missing.is_empty() {
            warn!("from_header: no column for the age brackets {:?}", missing);
        }
        Ok(ColumnLayout {
            code: required_column(&header, &CODE_HEADERS)?,
            prefecture: required_column(&header, &PREFECTURE_HEADERS)?,
            municipality: required_column(&header, &MUNICIPALITY_HEADERS)?,
            stratum: required_column(&header, &STRATUM_HEADERS)?,
            total: find_column(&header, &TOTAL_HEADERS),
            brackets,
        })
    }

    fn record(&self, row: &[RawCount]) -> Option<RawMunicipalityRecord> {
        let text = |idx: usize| row.get(idx).map(cell_text).unwrap_or_default();
        let code = text(self.code);
        let name = text(self.municipality);
        if code.is_empty() || name.is_empty() {
            return None;
        }
        let mut builder = RecordBuilder::new(&code, &name)
            .prefecture(&text(self.prefecture))
            .stratum(&text(self.stratum));
        if let Some(idx) = self.total {
            builder = builder.reported_total(row.get(idx).cloned().unwrap_or(RawCount::Missing));
        }
        for (b, idx) in self.brackets.iter() {
            builder = builder.cell(*b, row.get(*idx).cloned().unwrap_or(RawCount::Missing));
        }
        Some(builder.build())
    }
}

/// Reads all the records of a population table.
///
/// The rows before the header are ignored, as well as the rows without a
/// code or a municipality name (notes, blank lines, prefecture subtotals).
pub fn read_population_table(source: &DataSource) -> AppResult<Vec<RawMunicipalityRecord>> {
    let rows: Vec<Vec<RawCount>> = match source.provider()? {
        Provider::Csv => read_csv_rows(&source.file_path)?,
        Provider::Xlsx => {
            read_excel_rows(&source.file_path, source.excel_worksheet_name.as_deref())?
        }
    };
    let header_idx = source.header_row_index()?;
    let layout = match source.column_layout()? {
        ColumnLayoutMode::Header => {
            let header = rows.get(header_idx).context(MissingHeaderSnafu {
                lineno: header_idx + 1,
            })?;
            ColumnLayout::from_header(header)?
        }
        ColumnLayoutMode::Positional => ColumnLayout::positional(),
    };
    debug!("read_population_table: layout: {:?}", layout);

    let mut res: Vec<RawMunicipalityRecord> = Vec::new();
    for (idx, row) in rows.iter().enumerate().skip(header_idx + 1) {
        match layout.record(row) {
            Some(r) => res.push(r),
            None => debug!("read_population_table: skipping row {}", idx + 1),
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<RawCount> {
        cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    RawCount::Missing
                } else {
                    RawCount::Text(s.to_string())
                }
            })
            .collect()
    }

    fn owned_row(cells: &[String]) -> Vec<RawCount> {
        let refs: Vec<&str> = cells.iter().map(|s| s.as_str()).collect();
        text_row(&refs)
    }

    #[test]
    fn header_layout() {
        let mut header = vec!["団体コード", "都道府県名", "市区町村名", "性別", "総数"];
        let labels: Vec<String> = AgeBracket::ALL.iter().map(|b| b.label()).collect();
        header.extend(labels.iter().map(|s| s.as_str()));
        let layout = ColumnLayout::from_header(&text_row(&header)).unwrap();
        assert_eq!(layout, ColumnLayout::positional());
    }

    #[test]
    fn column_order_does_not_change_results() {
        let counts: Vec<String> = (0..21).map(|i| ((i + 1) * 37).to_string()).collect();
        let identifiers = ["242021", "三重県", "四日市市"];

        let mut header: Vec<String> = vec!["団体コード", "都道府県名", "市区町村名", "性別", "総数"]
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(AgeBracket::ALL.iter().map(|b| b.label()));
        let mut row: Vec<String> = identifiers.iter().map(|s| s.to_string()).collect();
        row.extend(["計".to_string(), "8547".to_string()]);
        row.extend(counts.iter().cloned());

        // Total before gender, oldest bracket first, compact labels.
        let mut permuted_header: Vec<String> = vec!["団体コード", "都道府県名", "市区町村名", "総数", "性別"]
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        permuted_header.extend(AgeBracket::ALL.iter().rev().map(|b| b.short_label()));
        let mut permuted_row: Vec<String> = identifiers.iter().map(|s| s.to_string()).collect();
        permuted_row.extend(["8547".to_string(), "計".to_string()]);
        permuted_row.extend(counts.iter().rev().cloned());

        let layout = ColumnLayout::from_header(&owned_row(&header)).unwrap();
        let permuted = ColumnLayout::from_header(&owned_row(&permuted_header)).unwrap();
        assert_ne!(layout, permuted);
        assert_eq!(permuted.brackets[0], (AgeBracket::Over100, 5));

        let record = layout.record(&owned_row(&row)).unwrap();
        let permuted_record = permuted.record(&owned_row(&permuted_row)).unwrap();
        assert_eq!(permuted_record.stratum, "計");
        assert_eq!(
            permuted_record.brackets.get(&AgeBracket::From0To4),
            Some(&RawCount::Text("37".to_string()))
        );

        for scheme in [
            PartitionScheme::eligible_voters(),
            PartitionScheme::youth_and_adults(),
        ] {
            let expected = run_batch(&[record.clone()], &scheme).unwrap();
            let out = run_batch(&[permuted_record.clone()], &scheme).unwrap();
            let cohorts: Vec<&str> = out.table.rows().iter().map(|r| r.cohort.as_str()).collect();
            assert_eq!(
                cohorts,
                scheme.cohort_names().iter().map(|s| s.as_str()).collect::<Vec<&str>>()
            );
            assert_eq!(out, expected);
            assert!(out.diagnostics.is_empty());
        }
        // 20代 of the eligible voters: 5 * 37 + 6 * 37.
        let out = run_batch(&[permuted_record], &PartitionScheme::eligible_voters()).unwrap();
        assert_eq!(out.table.rows()[0].population, 407.0);
    }

    #[test]
    fn header_without_code() {
        let res = ColumnLayout::from_header(&text_row(&["prefecture", "municipality", "gender"]));
        assert!(matches!(res, Err(AppError::MissingColumn { .. })));
    }

    #[test]
    fn rows_to_records() {
        let layout = ColumnLayout {
            code: 0,
            prefecture: 1,
            municipality: 2,
            stratum: 3,
            total: None,
            brackets: vec![(AgeBracket::From20To24, 4)],
        };
        let r = layout
            .record(&[
                RawCount::Number(242021.0),
                RawCount::Text("三重県".to_string()),
                RawCount::Text(" 四日市市 ".to_string()),
                RawCount::Text("計".to_string()),
                RawCount::Text("1,200".to_string()),
            ])
            .unwrap();
        assert_eq!(r.code, "242021");
        assert_eq!(r.name, "四日市市");
        assert_eq!(r.reported_total, None);
        assert_eq!(
            r.brackets.get(&AgeBracket::From20To24),
            Some(&RawCount::Text("1,200".to_string()))
        );
        assert_eq!(layout.record(&text_row(&["", "三重県", "", "計", "3"])), None);
    }
}
