use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use voting_influence::chart::{stacked_chart, StackedChart};
use voting_influence::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::app::config_reader::*;
use crate::app::io_common::read_population_table;
use crate::app::io_coordinates::{map_to_json, read_coordinates, MapIndicator};
use crate::args::Args;

mod config_reader;
mod io_common;
mod io_coordinates;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The file {path} contains no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The worksheet {name} could not be found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("The table has no header at row {lineno}"))]
    MissingHeader { lineno: usize },
    #[snafu(display("The column {column} could not be found in the header"))]
    MissingColumn { column: String },
    #[snafu(display("Unknown input type {input_type:?} for file {path}"))]
    UnknownInputType { input_type: String, path: String },
    #[snafu(display("No population table: use --input or a configuration file with a dataSource"))]
    MissingDataSource {},
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("{source}"))]
    Analysis { source: InfluenceError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

fn format_percent(x: f64) -> String {
    format!("{:.4}", x)
}

fn format_count(x: f64) -> String {
    format!("{}", x)
}

fn result_table_to_json(table: &ResultTable) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for code in table.municipality_codes() {
        let rows = table.municipality(code);
        let name = rows
            .first()
            .map(|r| r.municipality_name.clone())
            .unwrap_or_default();
        let cohorts: Vec<JSValue> = rows
            .iter()
            .map(|r| {
                json!({
                    "cohort": r.cohort,
                    "population": format_count(r.population),
                    "populationShare": format_percent(r.population_share),
                    "votingInfluence": format_percent(r.voting_influence)
                })
            })
            .collect();
        l.push(json!({"code": code, "municipality": name, "cohorts": cohorts}));
    }
    l
}

fn chart_to_json(chart: &StackedChart) -> JSValue {
    let labels: Vec<String> = chart
        .municipalities
        .iter()
        .map(|(_, name)| name.clone())
        .collect();
    let series: Vec<JSValue> = chart
        .series
        .iter()
        .map(|s| {
            let shares: Vec<String> = s.population_share.iter().map(|x| format_percent(*x)).collect();
            let influence: Vec<String> =
                s.voting_influence.iter().map(|x| format_percent(*x)).collect();
            json!({"cohort": s.cohort, "populationShare": shares, "votingInfluence": influence})
        })
        .collect();
    json!({"labels": labels, "series": series})
}

fn build_summary_js(
    title: Option<String>,
    selection: &Selection,
    scheme: &PartitionScheme,
    out: &BatchOutput,
    map_js: Option<JSValue>,
) -> JSValue {
    let c = OutputConfig {
        title,
        prefecture: selection.prefecture.clone(),
        stratum: selection.stratum.clone(),
        scheme: out.table.scheme().to_string(),
        cohorts: scheme
            .cohorts()
            .iter()
            .map(|cohort| OutputCohort {
                name: cohort.name.clone(),
                brackets: cohort.brackets.iter().map(|b| b.short_label()).collect(),
                voting_rate: cohort.voting_rate.to_string(),
            })
            .collect(),
    };
    let diagnostics: Vec<String> = out.diagnostics.iter().map(|d| d.to_string()).collect();
    let mut js = json!({
        "config": c,
        "results": result_table_to_json(&out.table),
        "chart": chart_to_json(&stacked_chart(&out.table)),
        "diagnostics": diagnostics
    });
    if let Some(m) = map_js {
        js["map"] = m;
    }
    js
}

/// Resolves a path of the configuration file against its directory.
fn resolve(root: &Path, p: &str) -> String {
    root.join(p).display().to_string()
}

fn effective_data_source(
    args: &Args,
    config: &AnalysisConfig,
    root: &Path,
) -> AppResult<DataSource> {
    let mut source = match (&args.input, config.data_source.clone()) {
        (Some(input), Some(ds)) => ds.with_file_path(input),
        (Some(input), None) => DataSource::from_path(input),
        (None, Some(ds)) => {
            let p = resolve(root, &ds.file_path);
            let coordinates = ds.coordinates_path.as_ref().map(|c| resolve(root, c));
            let mut ds = ds.with_file_path(&p);
            ds.coordinates_path = coordinates;
            ds
        }
        (None, None) => return MissingDataSourceSnafu {}.fail(),
    };
    if let Some(t) = &args.input_type {
        source.provider = Some(t.clone());
    }
    if let Some(w) = &args.excel_worksheet_name {
        source.excel_worksheet_name = Some(w.clone());
    }
    if let Some(c) = &args.coordinates {
        source.coordinates_path = Some(c.clone());
    }
    Ok(source)
}

fn print_listing(records: &[RawMunicipalityRecord], prefecture: Option<&str>, stratum: &str) {
    match prefecture {
        None => {
            for p in prefectures(records) {
                println!("{}", p);
            }
        }
        Some(p) => {
            for (code, name) in municipalities_in(records, p, stratum) {
                println!("{}\t{}", code, name);
            }
        }
    }
}

pub fn run_analysis(args: &Args) -> AppResult<()> {
    let (config, root): (AnalysisConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?
                .to_path_buf();
            (config, root)
        }
        None => (AnalysisConfig::default(), PathBuf::from(".")),
    };
    info!("config: {:?}", config);

    let source = effective_data_source(args, &config, &root)?;
    let records = read_population_table(&source)?;
    info!(
        "Read {} records from {:?}",
        records.len(),
        source.file_path
    );

    let selection_settings = config.selection.clone().unwrap_or_default();
    let stratum = selection_settings
        .gender_stratum
        .clone()
        .unwrap_or_else(|| TOTAL_STRATUM.to_string());
    let prefecture: Option<String> = match args
        .prefecture
        .clone()
        .or_else(|| selection_settings.prefecture.clone())
    {
        Some(p) => Some(p),
        None => match prefectures(&records).as_slice() {
            [single] => Some(single.clone()),
            _ => None,
        },
    };

    if args.list {
        print_listing(&records, prefecture.as_deref(), &stratum);
        return Ok(());
    }

    let prefecture = match prefecture {
        Some(p) => p,
        None => {
            whatever!(
                "A prefecture must be selected among: {}",
                prefectures(&records).join(", ")
            )
        }
    };

    let scheme = match (&args.scheme, &config.scheme) {
        (Some(name), _) => SchemeSettings::from_preset(name).build()?,
        (None, Some(s)) => s.build()?,
        (None, None) => PartitionScheme::eligible_voters(),
    };
    info!("scheme: {:?}", scheme);

    let codes = args
        .codes
        .clone()
        .or_else(|| selection_settings.municipality_codes.clone());
    let selection = Selection {
        prefecture,
        municipality_codes: codes,
        stratum,
    };

    let selected = select_records(&records, &selection);
    if selected.is_empty() {
        warn!("No municipality matches the selection {:?}", selection);
    }
    if let Some(codes) = &selection.municipality_codes {
        for c in codes {
            let code = normalize_municipality_code(c);
            if !selected.iter().any(|r| r.code == code) {
                warn!("Municipality {} not found in {}", code, selection.prefecture);
            }
        }
    }

    let out = run_batch(selected.iter().copied(), &scheme).context(AnalysisSnafu {})?;
    debug!("table: {:?}", out.table);

    let output_settings = config.output_settings.clone().unwrap_or_default();
    let indicator = match args
        .map_indicator
        .as_ref()
        .or(output_settings.map_indicator.as_ref())
    {
        Some(name) => MapIndicator::parse(name)?,
        None => MapIndicator::TotalPopulation,
    };
    let map_js = match &source.coordinates_path {
        Some(p) => {
            let coordinates = read_coordinates(p)?;
            Some(map_to_json(
                &coordinates,
                &selection.prefecture,
                &out.table,
                &selected,
                indicator,
            ))
        }
        None => None,
    };

    let result_js = build_summary_js(output_settings.title.clone(), &selection, &scheme, &out, map_js);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_path: Option<String> = match (&args.out, &output_settings.output_path) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) => Some(resolve(&root, p)),
        (None, None) => None,
    };
    match out_path.as_deref() {
        Some(p) if p != "stdout" => {
            info!("Writing summary to {:?}", p);
            fs::write(p, &pretty_js_stats).context(WritingSummarySnafu { path: p })?;
        }
        _ => println!("{}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
fn test_args(config: String, reference: Option<String>) -> Args {
    Args {
        config: Some(config),
        reference,
        out: Some("stdout".to_string()),
        input: None,
        input_type: None,
        excel_worksheet_name: None,
        prefecture: None,
        codes: None,
        scheme: None,
        coordinates: None,
        map_indicator: None,
        list: false,
        verbose: true,
    }
}

#[cfg(test)]
fn run_analysis_test(test_name: &str, check_summary: bool) -> AppResult<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = format!("{}/tests/data", env!("CARGO_MANIFEST_DIR"));
    info!("Running test {}", test_name);
    let config = format!("{}/{}/{}_config.json", test_dir, test_name, test_name);
    let reference = if check_summary {
        Some(format!(
            "{}/{}/{}_expected_summary.json",
            test_dir, test_name, test_name
        ))
    } else {
        None
    };
    run_analysis(&test_args(config, reference))
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    if let Err(e) = run_analysis_test(test_name, true) {
        panic!("test {} failed: {}", test_name, e);
    }
}
