//! The tables behind the stacked bar charts.
//!
//! A chart has one bar per municipality for the population shares and one for
//! the voting influence, each stacked by cohort. The values of every series
//! are aligned with `municipalities`.

use crate::config::*;

#[derive(PartialEq, Debug, Clone)]
pub struct CohortSeries {
    pub cohort: String,
    pub population_share: Vec<f64>,
    pub voting_influence: Vec<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StackedChart {
    /// (code, name) of each bar, in table order.
    pub municipalities: Vec<(String, String)>,
    /// One series per cohort, youngest first.
    pub series: Vec<CohortSeries>,
}

/// Pivots a result table into chart series.
///
/// A municipality without a row for some cohort gets 0 in that series, so
/// that all the series keep the same length.
pub fn stacked_chart(table: &ResultTable) -> StackedChart {
    let municipalities: Vec<(String, String)> = table
        .municipality_codes()
        .into_iter()
        .map(|code| {
            let name = table
                .municipality(code)
                .first()
                .map(|r| r.municipality_name.clone())
                .unwrap_or_default();
            (code.to_string(), name)
        })
        .collect();

    let series = table
        .cohort_names()
        .iter()
        .map(|cohort| {
            let rows: Vec<Option<&CohortResult>> = municipalities
                .iter()
                .map(|(code, _)| table.get(code, cohort))
                .collect();
            CohortSeries {
                cohort: cohort.clone(),
                population_share: rows
                    .iter()
                    .map(|r| r.map_or(0.0, |r| r.population_share))
                    .collect(),
                voting_influence: rows
                    .iter()
                    .map(|r| r.map_or(0.0, |r| r.voting_influence))
                    .collect(),
            }
        })
        .collect();

    StackedChart {
        municipalities,
        series,
    }
}
