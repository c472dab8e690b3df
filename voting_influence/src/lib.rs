mod config;
use log::{debug, info, warn};

use std::collections::{BTreeSet, HashSet};

pub mod builder;
pub mod chart;
pub mod manual;

pub use crate::config::*;

/// Relative tolerance when checking the brackets against the reported total.
const TOTAL_MISMATCH_TOLERANCE: f64 = 0.01;

/// Outcome of reading one population cell.
#[derive(PartialEq, Debug, Clone)]
pub enum Coerced {
    Value(f64),
    /// The cell could not be used. It will be counted as 0.
    Recovered(CoercionFailure),
}

/// Reads a population count out of a raw cell.
///
/// Text is trimmed and thousands separators are dropped. Anything that is not
/// a finite, non-negative number is reported as a failure rather than
/// propagated as NaN.
pub fn safe_parse(cell: &RawCount) -> Coerced {
    let x = match cell {
        RawCount::Number(x) => *x,
        RawCount::Missing => return Coerced::Recovered(CoercionFailure::Missing),
        RawCount::Text(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Coerced::Recovered(CoercionFailure::Missing);
            }
            match cleaned.parse::<f64>() {
                Ok(x) => x,
                Err(_) => return Coerced::Recovered(CoercionFailure::NotANumber(s.clone())),
            }
        }
    };
    if !x.is_finite() {
        Coerced::Recovered(CoercionFailure::NonFinite)
    } else if x < 0.0 {
        Coerced::Recovered(CoercionFailure::Negative(x))
    } else {
        Coerced::Value(x)
    }
}

fn coerce_or_zero(
    record: &RawMunicipalityRecord,
    bracket: AgeBracket,
    cell: &RawCount,
    diagnostics: &mut Vec<Diagnostic>,
) -> f64 {
    match safe_parse(cell) {
        Coerced::Value(x) => x,
        Coerced::Recovered(failure) => {
            let d = Diagnostic::CoercedToZero {
                code: record.code.clone(),
                column: bracket.label(),
                failure,
            };
            warn!("{}", d);
            diagnostics.push(d);
            0.0
        }
    }
}

/// Sums the brackets of each cohort of the scheme, for one municipality.
///
/// The values follow the order of `scheme.cohorts()`. Every bracket the
/// scheme references must be present in the record; cells that cannot be
/// read are counted as 0 and reported in the diagnostics.
pub fn aggregate_cohorts(
    record: &RawMunicipalityRecord,
    scheme: &PartitionScheme,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<f64>, DataShapeError> {
    let mut populations: Vec<f64> = Vec::with_capacity(scheme.cohorts().len());
    for cohort in scheme.cohorts() {
        let mut pop = 0.0;
        for bracket in cohort.brackets.iter() {
            let cell = record
                .brackets
                .get(bracket)
                .ok_or_else(|| DataShapeError::MissingBracket {
                    code: record.code.clone(),
                    bracket: *bracket,
                })?;
            pop += coerce_or_zero(record, *bracket, cell, diagnostics);
        }
        populations.push(pop);
    }
    Ok(populations)
}

/// The share of each cohort in the total of all the cohorts, in percent.
///
/// All the shares are 0 when the total is 0.
pub fn population_shares(populations: &[f64]) -> Vec<f64> {
    let total: f64 = populations.iter().sum();
    populations
        .iter()
        .map(|pop| if total > 0.0 { pop / total * 100.0 } else { 0.0 })
        .collect()
}

/// Weights the population shares by the turnout of each cohort and
/// renormalizes the result to 100.
///
/// The shares must be given in the order of the cohorts of the scheme.
/// All the values are 0 when the weighted total is 0.
pub fn voting_influence(
    scheme: &PartitionScheme,
    shares: &[f64],
) -> Result<Vec<f64>, ConfigurationError> {
    if shares.len() != scheme.cohorts().len() {
        return Err(ConfigurationError::CohortCountMismatch {
            expected: scheme.cohorts().len(),
            found: shares.len(),
        });
    }
    let raw: Vec<f64> = scheme
        .cohorts()
        .iter()
        .zip(shares.iter())
        .map(|(cohort, share)| share * cohort.voting_rate)
        .collect();
    let total_raw: f64 = raw.iter().sum();
    Ok(raw
        .iter()
        .map(|r| {
            if total_raw > 0.0 {
                r / total_raw * 100.0
            } else {
                0.0
            }
        })
        .collect())
}

/// Sum of all the brackets, when the record has all of them.
fn full_bracket_sum(record: &RawMunicipalityRecord) -> Option<f64> {
    if record.brackets.len() != AgeBracket::ALL.len() {
        return None;
    }
    Some(
        AgeBracket::ALL
            .iter()
            .filter_map(|b| record.brackets.get(b))
            .map(|cell| match safe_parse(cell) {
                Coerced::Value(x) => x,
                Coerced::Recovered(_) => 0.0,
            })
            .sum(),
    )
}

fn check_reported_total(record: &RawMunicipalityRecord, diagnostics: &mut Vec<Diagnostic>) {
    let reported = match record.reported_total.as_ref().map(safe_parse) {
        Some(Coerced::Value(x)) => x,
        _ => return,
    };
    if let Some(summed) = full_bracket_sum(record) {
        if (summed - reported).abs() > reported * TOTAL_MISMATCH_TOLERANCE {
            let d = Diagnostic::TotalMismatch {
                code: record.code.clone(),
                reported,
                summed,
            };
            warn!("{}", d);
            diagnostics.push(d);
        }
    }
}

/// Computes the population shares and the voting influence of every cohort
/// of the scheme, for every municipality.
///
/// Municipalities are ordered by ascending code. A code seen more than once
/// is only processed for its first record. Municipalities without population
/// are kept, with all their values at 0.
pub fn run_batch<'a, I>(records: I, scheme: &PartitionScheme) -> Result<BatchOutput, InfluenceError>
where
    I: IntoIterator<Item = &'a RawMunicipalityRecord>,
{
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique: Vec<&RawMunicipalityRecord> = Vec::new();
    for r in records {
        if seen.insert(r.code.as_str()) {
            unique.push(r);
        } else {
            let d = Diagnostic::DuplicateMunicipality {
                code: r.code.clone(),
            };
            warn!("{}", d);
            diagnostics.push(d);
        }
    }
    // Stable: the order only depends on the codes.
    unique.sort_by(|a, b| a.code.cmp(&b.code));

    info!(
        "run_batch: processing {} municipalities with scheme {} ({} cohorts)",
        unique.len(),
        scheme.name(),
        scheme.cohorts().len()
    );

    let mut rows: Vec<CohortResult> = Vec::with_capacity(unique.len() * scheme.cohorts().len());
    for record in unique {
        check_reported_total(record, &mut diagnostics);
        let populations = aggregate_cohorts(record, scheme, &mut diagnostics)?;
        let shares = population_shares(&populations);
        let influences = voting_influence(scheme, &shares)?;
        debug!(
            "run_batch: {} ({}): populations {:?} shares {:?} influence {:?}",
            record.name, record.code, populations, shares, influences
        );
        if populations.iter().all(|p| *p == 0.0) {
            warn!(
                "run_batch: {} ({}) has no population in scope",
                record.name, record.code
            );
        }
        for (((cohort, population), share), influence) in scheme
            .cohorts()
            .iter()
            .zip(populations)
            .zip(shares)
            .zip(influences)
        {
            rows.push(CohortResult {
                municipality_code: record.code.clone(),
                municipality_name: record.name.clone(),
                cohort: cohort.name.clone(),
                population,
                population_share: share,
                voting_influence: influence,
            });
        }
    }

    Ok(BatchOutput {
        table: ResultTable {
            scheme: scheme.name().to_string(),
            cohorts: scheme.cohort_names(),
            rows,
        },
        diagnostics,
    })
}

/// Removes the dashes and left-pads with zeros, so that codes read as numbers
/// (`1100`) or with a check digit separator (`01100-2`) compare equal to the
/// published 6-character codes.
pub fn normalize_municipality_code(raw: &str) -> String {
    let s: String = raw.trim().chars().filter(|c| *c != '-').collect();
    format!("{:0>6}", s)
}

/// All the prefectures of the table, sorted.
pub fn prefectures(records: &[RawMunicipalityRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = records.iter().map(|r| r.prefecture.as_str()).collect();
    names.into_iter().map(|s| s.to_string()).collect()
}

/// The (code, name) of the municipalities of a prefecture, by ascending code.
pub fn municipalities_in(
    records: &[RawMunicipalityRecord],
    prefecture: &str,
    stratum: &str,
) -> Vec<(String, String)> {
    let mut res: Vec<(String, String)> = records
        .iter()
        .filter(|r| r.prefecture == prefecture && r.stratum == stratum)
        .map(|r| (r.code.clone(), r.name.clone()))
        .collect();
    res.sort();
    res.dedup_by(|a, b| a.0 == b.0);
    res
}

/// The records matching the selection, in input order.
pub fn select_records<'a>(
    records: &'a [RawMunicipalityRecord],
    selection: &Selection,
) -> Vec<&'a RawMunicipalityRecord> {
    let codes: Option<HashSet<String>> = selection.municipality_codes.as_ref().map(|cs| {
        cs.iter()
            .map(|c| normalize_municipality_code(c))
            .collect()
    });
    let res: Vec<&RawMunicipalityRecord> = records
        .iter()
        .filter(|r| r.prefecture == selection.prefecture && r.stratum == selection.stratum)
        .filter(|r| codes.as_ref().map_or(true, |cs| cs.contains(&r.code)))
        .collect();
    debug!(
        "select_records: {} of {} records selected for {:?}",
        res.len(),
        records.len(),
        selection
    );
    res
}

#[cfg(test)]
mod tests {
    use super::builder::RecordBuilder;
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A record with the same count in every bracket.
    fn uniform(code: &str, count: f64) -> RawMunicipalityRecord {
        let mut b = RecordBuilder::new(code, &format!("市{}", code)).prefecture("三重県");
        for bracket in AgeBracket::ALL {
            b = b.count(bracket, count);
        }
        b.build()
    }

    fn three_cohorts() -> PartitionScheme {
        use AgeBracket::*;
        PartitionScheme::new(
            "three",
            vec![
                Cohort::new("30代", &[From30To34, From35To39], 0.44),
                Cohort::new("40代", &[From40To44, From45To49], 0.53),
                Cohort::new("70歳以上", &[From70To74, From75To79], 0.60),
            ],
        )
        .unwrap()
    }

    fn municipality_x() -> RawMunicipalityRecord {
        use AgeBracket::*;
        RecordBuilder::new("24201", "津市")
            .prefecture("三重県")
            .count(From30To34, 600.0)
            .count(From35To39, 400.0)
            .count(From40To44, 500.0)
            .count(From45To49, 500.0)
            .count(From70To74, 1200.0)
            .count(From75To79, 800.0)
            .build()
    }

    #[test]
    fn presets_are_valid() {
        for scheme in [
            PartitionScheme::youth_and_adults(),
            PartitionScheme::eligible_voters(),
        ] {
            let rebuilt = PartitionScheme::new(scheme.name(), scheme.cohorts().to_vec());
            assert_eq!(rebuilt, Ok(scheme));
        }
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(
            PartitionScheme::preset("eligibleVoters"),
            Ok(PartitionScheme::eligible_voters())
        );
        assert!(matches!(
            PartitionScheme::preset("teenagers"),
            Err(ConfigurationError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn scenario_municipality_x() {
        init();
        let scheme = three_cohorts();
        let out = run_batch(&[municipality_x()], &scheme).unwrap();
        let t = &out.table;
        assert_eq!(t.len(), 3);
        let expected_shares = [25.0, 25.0, 50.0];
        let expected_influence = [
            11.0 / 54.25 * 100.0,
            13.25 / 54.25 * 100.0,
            30.0 / 54.25 * 100.0,
        ];
        for (idx, row) in t.rows().iter().enumerate() {
            assert!((row.population_share - expected_shares[idx]).abs() < TOLERANCE);
            assert!((row.voting_influence - expected_influence[idx]).abs() < TOLERANCE);
        }
        assert!((t.get("024201", "30代").unwrap().voting_influence - 20.28).abs() < 0.01);
        assert!((t.get("024201", "40代").unwrap().voting_influence - 24.42).abs() < 0.01);
        assert!((t.get("024201", "70歳以上").unwrap().voting_influence - 55.30).abs() < 0.01);
        assert_eq!(t.get("024201", "70歳以上").unwrap().population, 2000.0);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn shares_and_influence_sum_to_100() {
        let scheme = PartitionScheme::eligible_voters();
        let mut records = Vec::new();
        for (idx, count) in [1.0, 17.0, 2345.5, 98765.0].iter().enumerate() {
            let mut b = RecordBuilder::new(&format!("2420{}", idx), "町").prefecture("三重県");
            for (j, bracket) in AgeBracket::ALL.iter().enumerate() {
                b = b.count(*bracket, count * (j as f64 + 1.0));
            }
            records.push(b.build());
        }
        let out = run_batch(&records, &scheme).unwrap();
        for code in out.table.municipality_codes() {
            let rows = out.table.municipality(code);
            let shares: f64 = rows.iter().map(|r| r.population_share).sum();
            let influence: f64 = rows.iter().map(|r| r.voting_influence).sum();
            assert!((shares - 100.0).abs() < TOLERANCE, "{} {}", code, shares);
            assert!((influence - 100.0).abs() < TOLERANCE, "{} {}", code, influence);
        }
    }

    #[test]
    fn zero_population_keeps_rows() {
        init();
        let scheme = PartitionScheme::eligible_voters();
        let out = run_batch(&[uniform("24999", 0.0)], &scheme).unwrap();
        assert_eq!(out.table.len(), scheme.cohorts().len());
        for row in out.table.rows() {
            assert_eq!(row.population_share, 0.0);
            assert_eq!(row.voting_influence, 0.0);
        }
    }

    #[test]
    fn zero_turnout_everywhere() {
        // Only the under-20 cohort is populated, and its rate is 0.
        use AgeBracket::*;
        let r = RecordBuilder::new("24001", "村")
            .count(From0To4, 10.0)
            .count(From5To9, 10.0)
            .count(From10To14, 10.0)
            .count(From15To19, 10.0)
            .counts(&AgeBracket::ALL[6..], 0.0)
            .build();
        let out = run_batch(&[r], &PartitionScheme::youth_and_adults()).unwrap();
        let rows = out.table.rows();
        assert!((rows[0].population_share - 100.0).abs() < TOLERANCE);
        assert!(rows.iter().all(|r| r.voting_influence == 0.0));
    }

    #[test]
    fn cohort_order_follows_scheme() {
        use AgeBracket::*;
        let scheme = three_cohorts();
        let reversed = RecordBuilder::new("24201", "津市")
            .count(From75To79, 800.0)
            .count(From70To74, 1200.0)
            .count(From45To49, 500.0)
            .count(From40To44, 500.0)
            .count(From35To39, 400.0)
            .count(From30To34, 600.0)
            .build();
        let a = run_batch(&[municipality_x()], &scheme).unwrap();
        let b = run_batch(&[reversed], &scheme).unwrap();
        let names: Vec<&str> = b.table.rows().iter().map(|r| r.cohort.as_str()).collect();
        assert_eq!(names, vec!["30代", "40代", "70歳以上"]);
        assert_eq!(a.table.rows()[0].population, b.table.rows()[0].population);
        assert_eq!(b.table.cohort_names(), scheme.cohort_names().as_slice());
    }

    #[test]
    fn higher_rate_means_higher_influence() {
        use AgeBracket::*;
        let scheme = PartitionScheme::new(
            "pair",
            vec![
                Cohort::new("low", &[From20To24], 0.3),
                Cohort::new("high", &[From25To29], 0.7),
            ],
        )
        .unwrap();
        let shares = [50.0, 50.0];
        let infl = voting_influence(&scheme, &shares).unwrap();
        assert!(infl[1] > infl[0]);
        assert!((infl[0] - 30.0).abs() < TOLERANCE);
    }

    #[test]
    fn influence_rejects_misaligned_shares() {
        let scheme = PartitionScheme::eligible_voters();
        assert_eq!(
            voting_influence(&scheme, &[50.0, 50.0]),
            Err(ConfigurationError::CohortCountMismatch {
                expected: 6,
                found: 2
            })
        );
    }

    #[test]
    fn batch_of_three_is_stable() {
        let scheme = PartitionScheme::eligible_voters();
        let records = vec![uniform("24203", 7.0), uniform("24201", 0.0), uniform("24202", 3.0)];
        let first = run_batch(&records, &scheme).unwrap();
        assert_eq!(
            first.table.municipality_codes(),
            vec!["024201", "024202", "024203"]
        );
        assert_eq!(first.table.len(), 3 * 6);
        assert_eq!(first.table.scheme(), "eligible_voters");
        for _ in 0..5 {
            assert_eq!(run_batch(&records, &scheme).unwrap(), first);
        }
    }

    #[test]
    fn empty_batch() {
        let records: Vec<RawMunicipalityRecord> = Vec::new();
        let out = run_batch(&records, &PartitionScheme::eligible_voters()).unwrap();
        assert!(out.table.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn duplicates_are_reported() {
        let records = vec![uniform("24201", 5.0), uniform("24201", 9.0)];
        let out = run_batch(&records, &PartitionScheme::eligible_voters()).unwrap();
        assert_eq!(out.table.municipality_codes(), vec!["024201"]);
        assert_eq!(out.table.rows()[0].population, 10.0);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::DuplicateMunicipality {
                code: "024201".to_string()
            }]
        );
    }

    #[test]
    fn missing_bracket_aborts_batch() {
        let mut broken = uniform("24202", 1.0);
        broken.brackets.remove(&AgeBracket::From50To54);
        let records = vec![uniform("24201", 1.0), broken];
        let res = run_batch(&records, &PartitionScheme::eligible_voters());
        assert_eq!(
            res,
            Err(InfluenceError::DataShape(DataShapeError::MissingBracket {
                code: "024202".to_string(),
                bracket: AgeBracket::From50To54
            }))
        );
    }

    #[test]
    fn unused_brackets_may_be_missing() {
        let mut r = uniform("24201", 1.0);
        for b in &AgeBracket::ALL[..4] {
            r.brackets.remove(b);
        }
        assert!(run_batch(&[r], &PartitionScheme::eligible_voters()).is_ok());
    }

    #[test]
    fn bad_cells_count_as_zero() {
        init();
        use AgeBracket::*;
        let scheme = three_cohorts();
        let r = RecordBuilder::new("24201", "津市")
            .count(From30To34, 1000.0)
            .cell(From35To39, RawCount::Text("-".to_string()))
            .cell(From40To44, RawCount::Text(" 1,000 ".to_string()))
            .cell(From45To49, RawCount::Missing)
            .cell(From70To74, RawCount::Number(-3.0))
            .cell(From75To79, RawCount::Number(f64::NAN))
            .build();
        let out = run_batch(&[r], &scheme).unwrap();
        let pops: Vec<f64> = out.table.rows().iter().map(|r| r.population).collect();
        assert_eq!(pops, vec![1000.0, 1000.0, 0.0]);
        assert!(out
            .table
            .rows()
            .iter()
            .all(|r| r.population_share.is_finite() && r.voting_influence.is_finite()));
        let failures: Vec<(String, CoercionFailure)> = out
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::CoercedToZero {
                    column, failure, ..
                } => Some((column.clone(), failure.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            failures,
            vec![
                (
                    "35歳～39歳".to_string(),
                    CoercionFailure::NotANumber("-".to_string())
                ),
                ("45歳～49歳".to_string(), CoercionFailure::Missing),
                ("70歳～74歳".to_string(), CoercionFailure::Negative(-3.0)),
                ("75歳～79歳".to_string(), CoercionFailure::NonFinite),
            ]
        );
    }

    #[test]
    fn safe_parse_cases() {
        assert_eq!(safe_parse(&RawCount::Number(12.0)), Coerced::Value(12.0));
        assert_eq!(
            safe_parse(&RawCount::Text("12,345".to_string())),
            Coerced::Value(12345.0)
        );
        assert_eq!(
            safe_parse(&RawCount::Text("  ".to_string())),
            Coerced::Recovered(CoercionFailure::Missing)
        );
        assert_eq!(
            safe_parse(&RawCount::Text("x".to_string())),
            Coerced::Recovered(CoercionFailure::NotANumber("x".to_string()))
        );
        assert_eq!(
            safe_parse(&RawCount::Number(f64::INFINITY)),
            Coerced::Recovered(CoercionFailure::NonFinite)
        );
    }

    #[test]
    fn reported_total_mismatch() {
        let mut ok = uniform("24201", 10.0);
        ok.reported_total = Some(RawCount::Number(210.0));
        let mut off = uniform("24202", 10.0);
        off.reported_total = Some(RawCount::Text("300".to_string()));
        let out = run_batch(&[ok, off], &PartitionScheme::eligible_voters()).unwrap();
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::TotalMismatch {
                code: "024202".to_string(),
                reported: 300.0,
                summed: 210.0
            }]
        );
    }

    #[test]
    fn scheme_validation() {
        use AgeBracket::*;
        let overlap = PartitionScheme::new(
            "s",
            vec![
                Cohort::new("a", &[From20To24, From25To29], 0.3),
                Cohort::new("b", &[From25To29], 0.3),
            ],
        );
        assert!(matches!(
            overlap,
            Err(ConfigurationError::OverlappingBracket { bracket: From25To29, .. })
        ));
        let unordered = PartitionScheme::new(
            "s",
            vec![
                Cohort::new("old", &[From70To74], 0.6),
                Cohort::new("young", &[From20To24], 0.3),
            ],
        );
        assert!(matches!(
            unordered,
            Err(ConfigurationError::UnorderedCohorts { .. })
        ));
        let rate = PartitionScheme::new("s", vec![Cohort::new("a", &[From20To24], 1.5)]);
        assert!(matches!(
            rate,
            Err(ConfigurationError::InvalidVotingRate { .. })
        ));
        let empty = PartitionScheme::new("s", vec![Cohort::new("a", &[], 0.5)]);
        assert!(matches!(empty, Err(ConfigurationError::EmptyCohort { .. })));
        assert!(matches!(
            PartitionScheme::new("s", vec![]),
            Err(ConfigurationError::EmptyScheme { .. })
        ));
    }

    #[test]
    fn scheme_from_parts_requires_matching_rates() {
        use AgeBracket::*;
        let mapping = vec![
            ("20代".to_string(), vec![From20To24, From25To29]),
            ("30代".to_string(), vec![From30To34, From35To39]),
        ];
        let missing = PartitionScheme::from_parts("s", &mapping, &[("20代".to_string(), 0.35)]);
        assert_eq!(
            missing,
            Err(ConfigurationError::MissingVotingRate {
                cohort: "30代".to_string()
            })
        );
        let extra = PartitionScheme::from_parts(
            "s",
            &mapping,
            &[
                ("20代".to_string(), 0.35),
                ("30代".to_string(), 0.44),
                ("40代".to_string(), 0.53),
            ],
        );
        assert_eq!(
            extra,
            Err(ConfigurationError::UnknownRateCohort {
                cohort: "40代".to_string()
            })
        );
        let ok = PartitionScheme::from_parts(
            "s",
            &mapping,
            &[("30代".to_string(), 0.44), ("20代".to_string(), 0.35)],
        )
        .unwrap();
        assert_eq!(ok.cohort_names(), vec!["20代", "30代"]);
        assert_eq!(ok.cohorts()[1].voting_rate, 0.44);
    }

    #[test]
    fn bracket_labels() {
        for b in AgeBracket::ALL {
            assert_eq!(AgeBracket::from_label(&b.label()), Some(b));
            assert_eq!(AgeBracket::from_label(&b.short_label()), Some(b));
        }
        assert_eq!(AgeBracket::from_label("0～4歳"), Some(AgeBracket::From0To4));
        assert_eq!(AgeBracket::from_label("95–99"), Some(AgeBracket::From95To99));
        assert_eq!(AgeBracket::from_label("総数"), None);
        assert_eq!(AgeBracket::from_label("人.5"), None);
        assert_eq!(AgeBracket::from_label("3-7"), None);
        assert_eq!(AgeBracket::from_label("１００歳以上"), Some(AgeBracket::Over100));
        assert_eq!(AgeBracket::from_label("２０歳～２４歳"), Some(AgeBracket::From20To24));
        assert_eq!(AgeBracket::from_label("１００＋"), Some(AgeBracket::Over100));
    }

    #[test]
    fn municipality_codes() {
        assert_eq!(normalize_municipality_code("1100"), "001100");
        assert_eq!(normalize_municipality_code("01100-2"), "011002");
        assert_eq!(normalize_municipality_code(" 242012 "), "242012");
    }

    #[test]
    fn selection() {
        let mut records = vec![uniform("24202", 1.0), uniform("24201", 1.0), uniform("13101", 1.0)];
        records[2].prefecture = "東京都".to_string();
        let mut female = uniform("24201", 1.0);
        female.stratum = "女".to_string();
        records.push(female);

        assert_eq!(prefectures(&records), vec!["三重県", "東京都"]);
        assert_eq!(
            municipalities_in(&records, "三重県", TOTAL_STRATUM),
            vec![
                ("024201".to_string(), "市24201".to_string()),
                ("024202".to_string(), "市24202".to_string())
            ]
        );
        let all = select_records(&records, &Selection::prefecture("三重県"));
        assert_eq!(all.len(), 2);
        let some = select_records(
            &records,
            &Selection::prefecture("三重県").with_codes(&["24202".to_string()]),
        );
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].code, "024202");
    }
}
