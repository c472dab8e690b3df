use crate::app::io_common::ColumnLayoutMode;
use crate::app::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::BTreeMap;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    /// The indicator of the map markers, 総人口 by default.
    #[serde(rename = "mapIndicator")]
    pub map_indicator: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputCohort {
    pub name: String,
    pub brackets: Vec<String>,
    #[serde(rename = "votingRate")]
    pub voting_rate: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub title: Option<String>,
    pub prefecture: String,
    pub stratum: String,
    pub scheme: String,
    pub cohorts: Vec<OutputCohort>,
}

/// The supported input formats.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Xlsx,
    Csv,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// Guessed from the extension of the file when not provided.
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "headerRowIndex")]
    _header_row_index: Option<JSValue>,
    #[serde(rename = "columnLayout")]
    pub column_layout: Option<String>,
    #[serde(rename = "coordinatesPath")]
    pub coordinates_path: Option<String>,
}

impl DataSource {
    pub fn from_path(path: &str) -> DataSource {
        DataSource {
            provider: None,
            file_path: path.to_string(),
            excel_worksheet_name: None,
            _header_row_index: None,
            column_layout: None,
            coordinates_path: None,
        }
    }

    pub fn with_file_path(self, path: &str) -> DataSource {
        DataSource {
            file_path: path.to_string(),
            ..self
        }
    }

    pub fn provider(&self) -> AppResult<Provider> {
        let extension = Path::new(self.file_path.as_str())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let input_type = self.provider.clone().or(extension).unwrap_or_default();
        match input_type.as_str() {
            "xlsx" | "excel" => Ok(Provider::Xlsx),
            "csv" => Ok(Provider::Csv),
            _ => UnknownInputTypeSnafu {
                input_type,
                path: self.file_path.clone(),
            }
            .fail(),
        }
    }

    /// The position of the header row, starting at 0 (the configuration starts at 1).
    pub fn header_row_index(&self) -> AppResult<usize> {
        if self._header_row_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self._header_row_index)?;
        ensure!(x >= 1, ParsingJsonNumberSnafu {});
        Ok(x - 1)
    }

    pub fn column_layout(&self) -> AppResult<ColumnLayoutMode> {
        match self.column_layout.as_deref() {
            None | Some("header") => Ok(ColumnLayoutMode::Header),
            Some("positional") => Ok(ColumnLayoutMode::Positional),
            Some(x) => whatever!("unknown column layout: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSettings {
    pub prefecture: Option<String>,
    #[serde(rename = "municipalityCodes")]
    pub municipality_codes: Option<Vec<String>>,
    #[serde(rename = "genderStratum")]
    pub gender_stratum: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CohortSetting {
    pub name: String,
    pub brackets: Vec<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemeSettings {
    pub preset: Option<String>,
    pub name: Option<String>,
    pub cohorts: Option<Vec<CohortSetting>>,
    #[serde(rename = "votingRates")]
    pub voting_rates: Option<BTreeMap<String, f64>>,
}

impl SchemeSettings {
    pub fn from_preset(name: &str) -> SchemeSettings {
        SchemeSettings {
            preset: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn build(&self) -> AppResult<PartitionScheme> {
        match (&self.preset, &self.cohorts) {
            (Some(_), Some(_)) => {
                whatever!("a scheme is either a preset or a list of cohorts, not both")
            }
            (Some(preset), None) => PartitionScheme::preset(preset)
                .map_err(InfluenceError::from)
                .context(AnalysisSnafu {}),
            (None, Some(cohorts)) => {
                let mut mapping: Vec<(String, Vec<AgeBracket>)> = Vec::new();
                for c in cohorts.iter() {
                    let mut brackets: Vec<AgeBracket> = Vec::new();
                    for label in c.brackets.iter() {
                        let b = match AgeBracket::from_label(label) {
                            Some(b) => b,
                            None => {
                                whatever!("unknown age bracket {:?} in cohort {}", label, c.name)
                            }
                        };
                        brackets.push(b);
                    }
                    mapping.push((c.name.clone(), brackets));
                }
                let rates: Vec<(String, f64)> = self
                    .voting_rates
                    .clone()
                    .unwrap_or_default()
                    .into_iter()
                    .collect();
                let name = self.name.clone().unwrap_or_else(|| "custom".to_string());
                PartitionScheme::from_parts(&name, &mapping, &rates)
                    .map_err(InfluenceError::from)
                    .context(AnalysisSnafu {})
            }
            (None, None) => Ok(PartitionScheme::eligible_voters()),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "dataSource")]
    pub data_source: Option<DataSource>,
    pub selection: Option<SelectionSettings>,
    pub scheme: Option<SchemeSettings>,
}

pub fn read_config(path: &str) -> AppResult<AnalysisConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AnalysisConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> AppResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {} top-level entries", js.as_object().map_or(0, |o| o.len()));
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> AppResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}
