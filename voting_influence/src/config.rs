// ********* Input data structures ***********

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::Display;

/// The raw age brackets of the municipal population tables, in ascending order.
///
/// Every bracket spans five years, except the last one which is open-ended.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum AgeBracket {
    From0To4,
    From5To9,
    From10To14,
    From15To19,
    From20To24,
    From25To29,
    From30To34,
    From35To39,
    From40To44,
    From45To49,
    From50To54,
    From55To59,
    From60To64,
    From65To69,
    From70To74,
    From75To79,
    From80To84,
    From85To89,
    From90To94,
    From95To99,
    Over100,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 21] = [
        AgeBracket::From0To4,
        AgeBracket::From5To9,
        AgeBracket::From10To14,
        AgeBracket::From15To19,
        AgeBracket::From20To24,
        AgeBracket::From25To29,
        AgeBracket::From30To34,
        AgeBracket::From35To39,
        AgeBracket::From40To44,
        AgeBracket::From45To49,
        AgeBracket::From50To54,
        AgeBracket::From55To59,
        AgeBracket::From60To64,
        AgeBracket::From65To69,
        AgeBracket::From70To74,
        AgeBracket::From75To79,
        AgeBracket::From80To84,
        AgeBracket::From85To89,
        AgeBracket::From90To94,
        AgeBracket::From95To99,
        AgeBracket::Over100,
    ];

    /// The youngest age included in this bracket.
    pub fn lower_bound(&self) -> u32 {
        (*self as u32) * 5
    }

    pub fn from_lower_bound(lower: u32) -> Option<AgeBracket> {
        AgeBracket::ALL
            .iter()
            .copied()
            .find(|b| b.lower_bound() == lower)
    }

    /// The column label used in the published spreadsheets (`0歳～4歳`, `100歳以上`).
    pub fn label(&self) -> String {
        match self {
            AgeBracket::Over100 => "100歳以上".to_string(),
            b => format!("{}歳～{}歳", b.lower_bound(), b.lower_bound() + 4),
        }
    }

    /// A compact label (`0-4`, `100+`).
    pub fn short_label(&self) -> String {
        match self {
            AgeBracket::Over100 => "100+".to_string(),
            b => format!("{}-{}", b.lower_bound(), b.lower_bound() + 4),
        }
    }

    /// Recognizes both the spreadsheet labels and the compact labels, with
    /// ASCII or full-width digits.
    ///
    /// Returns None for anything that is not an age bracket (for example
    /// the `総数` column), so that callers can skip unrelated columns.
    pub fn from_label(label: &str) -> Option<AgeBracket> {
        let normalized: String = label.trim().chars().map(to_half_width).collect();
        let s = normalized.as_str();
        let bounds: Vec<u32> = s
            .split(|c: char| !c.is_ascii_digit())
            .filter(|p| !p.is_empty())
            .filter_map(|p| p.parse::<u32>().ok())
            .collect();
        match bounds.as_slice() {
            [100] if s.ends_with('+') || s.ends_with("以上") => Some(AgeBracket::Over100),
            [lo, hi] if *hi == lo + 4 => {
                AgeBracket::from_lower_bound(*lo).filter(|b| *b != AgeBracket::Over100)
            }
            _ => None,
        }
    }
}

/// Full-width digits and plus sign, as typed in some published headers.
fn to_half_width(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        '＋' => '+',
        c => c,
    }
}

impl Display for AgeBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_label())
    }
}

/// A population cell as read from the source, before any numeric coercion.
#[derive(PartialEq, Debug, Clone)]
pub enum RawCount {
    Number(f64),
    Text(String),
    Missing,
}

/// The stratum tag that marks the row aggregating all genders.
pub const TOTAL_STRATUM: &str = "計";

/// One row of the population table.
#[derive(PartialEq, Debug, Clone)]
pub struct RawMunicipalityRecord {
    /// Zero-padded municipality code (6 characters).
    pub code: String,
    pub name: String,
    pub prefecture: String,
    pub stratum: String,
    /// The total population reported by the source, if any.
    pub reported_total: Option<RawCount>,
    pub brackets: HashMap<AgeBracket, RawCount>,
}

// ********* Partition schemes **********

/// A named group of brackets, with the historical turnout of this group.
#[derive(PartialEq, Debug, Clone)]
pub struct Cohort {
    pub name: String,
    pub brackets: Vec<AgeBracket>,
    /// Turnout ratio in [0, 1].
    pub voting_rate: f64,
}

impl Cohort {
    pub fn new(name: &str, brackets: &[AgeBracket], voting_rate: f64) -> Cohort {
        Cohort {
            name: name.to_string(),
            brackets: brackets.to_vec(),
            voting_rate,
        }
    }
}

/// The binding between raw brackets, cohorts and voting rates.
///
/// A scheme can only be obtained through the validating constructors or
/// the presets, so the cohorts it holds never overlap and are always in
/// ascending age order.
#[derive(PartialEq, Debug, Clone)]
pub struct PartitionScheme {
    name: String,
    cohorts: Vec<Cohort>,
}

impl PartitionScheme {
    pub fn new(name: &str, cohorts: Vec<Cohort>) -> Result<PartitionScheme, ConfigurationError> {
        if cohorts.is_empty() {
            return Err(ConfigurationError::EmptyScheme {
                scheme: name.to_string(),
            });
        }
        let mut names: HashSet<&str> = HashSet::new();
        let mut seen: HashMap<AgeBracket, &str> = HashMap::new();
        let mut previous_max: Option<AgeBracket> = None;
        for c in cohorts.iter() {
            if !names.insert(c.name.as_str()) {
                return Err(ConfigurationError::DuplicateCohort {
                    cohort: c.name.clone(),
                });
            }
            if !(c.voting_rate.is_finite() && (0.0..=1.0).contains(&c.voting_rate)) {
                return Err(ConfigurationError::InvalidVotingRate {
                    cohort: c.name.clone(),
                    rate: c.voting_rate,
                });
            }
            for b in c.brackets.iter() {
                if let Some(other) = seen.insert(*b, c.name.as_str()) {
                    return Err(ConfigurationError::OverlappingBracket {
                        bracket: *b,
                        first: other.to_string(),
                        second: c.name.clone(),
                    });
                }
            }
            let (min, max) = match (c.brackets.iter().min(), c.brackets.iter().max()) {
                (Some(min), Some(max)) => (*min, *max),
                _ => {
                    return Err(ConfigurationError::EmptyCohort {
                        cohort: c.name.clone(),
                    });
                }
            };
            if let Some(pm) = previous_max {
                if min < pm {
                    return Err(ConfigurationError::UnorderedCohorts {
                        cohort: c.name.clone(),
                    });
                }
            }
            previous_max = Some(max);
        }
        let cohorts = cohorts
            .into_iter()
            .map(|mut c| {
                c.brackets.sort();
                c
            })
            .collect();
        Ok(PartitionScheme {
            name: name.to_string(),
            cohorts,
        })
    }

    /// Builds a scheme from a bracket mapping and a separate table of rates.
    ///
    /// Both sides must name exactly the same cohorts.
    pub fn from_parts(
        name: &str,
        mapping: &[(String, Vec<AgeBracket>)],
        rates: &[(String, f64)],
    ) -> Result<PartitionScheme, ConfigurationError> {
        let rate_table: HashMap<&str, f64> = rates.iter().map(|(c, r)| (c.as_str(), *r)).collect();
        if let Some((unknown, _)) = rates
            .iter()
            .find(|(c, _)| !mapping.iter().any(|(m, _)| m == c))
        {
            return Err(ConfigurationError::UnknownRateCohort {
                cohort: unknown.clone(),
            });
        }
        let mut cohorts: Vec<Cohort> = Vec::new();
        for (cname, brackets) in mapping.iter() {
            let rate = rate_table.get(cname.as_str()).copied().ok_or_else(|| {
                ConfigurationError::MissingVotingRate {
                    cohort: cname.clone(),
                }
            })?;
            cohorts.push(Cohort::new(cname, brackets, rate));
        }
        PartitionScheme::new(name, cohorts)
    }

    /// The scheme of the population overview: everybody below 20 in one
    /// group (who cannot vote), the 20s left out.
    pub fn youth_and_adults() -> PartitionScheme {
        use AgeBracket::*;
        PartitionScheme {
            name: "youth_and_adults".to_string(),
            cohorts: vec![
                Cohort::new(
                    "20歳未満",
                    &[From0To4, From5To9, From10To14, From15To19],
                    0.0,
                ),
                Cohort::new("30代", &[From30To34, From35To39], 0.44),
                Cohort::new("40代", &[From40To44, From45To49], 0.53),
                Cohort::new("50代", &[From50To54, From55To59], 0.63),
                Cohort::new("60代", &[From60To64, From65To69], 0.72),
                Cohort::new("70歳以上", &SEVENTY_AND_OVER, 0.60),
            ],
        }
    }

    /// The scheme restricted to voters: 20 years old and more.
    pub fn eligible_voters() -> PartitionScheme {
        use AgeBracket::*;
        PartitionScheme {
            name: "eligible_voters".to_string(),
            cohorts: vec![
                Cohort::new("20代", &[From20To24, From25To29], 0.35),
                Cohort::new("30代", &[From30To34, From35To39], 0.44),
                Cohort::new("40代", &[From40To44, From45To49], 0.53),
                Cohort::new("50代", &[From50To54, From55To59], 0.63),
                Cohort::new("60代", &[From60To64, From65To69], 0.72),
                Cohort::new("70歳以上", &SEVENTY_AND_OVER, 0.60),
            ],
        }
    }

    pub fn preset(name: &str) -> Result<PartitionScheme, ConfigurationError> {
        match name {
            "youth_and_adults" | "youthAndAdults" => Ok(PartitionScheme::youth_and_adults()),
            "eligible_voters" | "eligibleVoters" => Ok(PartitionScheme::eligible_voters()),
            x => Err(ConfigurationError::UnknownPreset {
                scheme: x.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cohorts, youngest first.
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn cohort_names(&self) -> Vec<String> {
        self.cohorts.iter().map(|c| c.name.clone()).collect()
    }
}

const SEVENTY_AND_OVER: [AgeBracket; 7] = [
    AgeBracket::From70To74,
    AgeBracket::From75To79,
    AgeBracket::From80To84,
    AgeBracket::From85To89,
    AgeBracket::From90To94,
    AgeBracket::From95To99,
    AgeBracket::Over100,
];

/// The municipalities the user is looking at.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Selection {
    pub prefecture: String,
    /// All the municipalities of the prefecture when not provided.
    pub municipality_codes: Option<Vec<String>>,
    pub stratum: String,
}

impl Selection {
    pub fn prefecture(prefecture: &str) -> Selection {
        Selection {
            prefecture: prefecture.to_string(),
            municipality_codes: None,
            stratum: TOTAL_STRATUM.to_string(),
        }
    }

    pub fn with_codes(self, codes: &[String]) -> Selection {
        Selection {
            municipality_codes: Some(codes.to_vec()),
            ..self
        }
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct CohortResult {
    pub municipality_code: String,
    pub municipality_name: String,
    pub cohort: String,
    pub population: f64,
    /// Percentage of the in-scope population, 0-100.
    pub population_share: f64,
    /// Turnout-weighted share, renormalized to 100 within the municipality.
    pub voting_influence: f64,
}

/// The rows of a batch, grouped by municipality, cohorts in ascending age.
#[derive(PartialEq, Debug, Clone)]
pub struct ResultTable {
    pub(crate) scheme: String,
    pub(crate) cohorts: Vec<String>,
    pub(crate) rows: Vec<CohortResult>,
}

impl ResultTable {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn cohort_names(&self) -> &[String] {
        &self.cohorts
    }

    pub fn rows(&self) -> &[CohortResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The codes of the municipalities, in table order.
    pub fn municipality_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for r in self.rows.iter() {
            if codes.last() != Some(&r.municipality_code.as_str()) {
                codes.push(r.municipality_code.as_str());
            }
        }
        codes
    }

    pub fn municipality(&self, code: &str) -> Vec<&CohortResult> {
        self.rows
            .iter()
            .filter(|r| r.municipality_code == code)
            .collect()
    }

    pub fn get(&self, code: &str, cohort: &str) -> Option<&CohortResult> {
        self.rows
            .iter()
            .find(|r| r.municipality_code == code && r.cohort == cohort)
    }
}

/// Something worth reporting that did not prevent the computation.
#[derive(PartialEq, Debug, Clone)]
pub enum Diagnostic {
    /// A cell could not be read as a population and was counted as 0.
    CoercedToZero {
        code: String,
        column: String,
        failure: CoercionFailure,
    },
    /// The brackets do not add up to the total published for the municipality.
    TotalMismatch {
        code: String,
        reported: f64,
        summed: f64,
    },
    /// A second record with an already processed code was dropped.
    DuplicateMunicipality { code: String },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::CoercedToZero {
                code,
                column,
                failure,
            } => write!(
                f,
                "municipality {}: cell {} counted as 0 ({})",
                code, column, failure
            ),
            Diagnostic::TotalMismatch {
                code,
                reported,
                summed,
            } => write!(
                f,
                "municipality {}: age brackets add up to {} but the reported total is {}",
                code, summed, reported
            ),
            Diagnostic::DuplicateMunicipality { code } => {
                write!(f, "municipality {}: duplicate record ignored", code)
            }
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum CoercionFailure {
    Missing,
    NotANumber(String),
    Negative(f64),
    NonFinite,
}

impl Display for CoercionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoercionFailure::Missing => write!(f, "missing"),
            CoercionFailure::NotANumber(s) => write!(f, "not a number: {:?}", s),
            CoercionFailure::Negative(x) => write!(f, "negative value {}", x),
            CoercionFailure::NonFinite => write!(f, "non-finite value"),
        }
    }
}

/// Result of a batch: the table and everything that was recovered on the way.
#[derive(PartialEq, Debug, Clone)]
pub struct BatchOutput {
    pub table: ResultTable,
    pub diagnostics: Vec<Diagnostic>,
}

// ********* Errors **********

/// Defects in the definition of a partition scheme.
#[derive(PartialEq, Debug, Clone)]
pub enum ConfigurationError {
    EmptyScheme {
        scheme: String,
    },
    EmptyCohort {
        cohort: String,
    },
    DuplicateCohort {
        cohort: String,
    },
    OverlappingBracket {
        bracket: AgeBracket,
        first: String,
        second: String,
    },
    UnorderedCohorts {
        cohort: String,
    },
    InvalidVotingRate {
        cohort: String,
        rate: f64,
    },
    MissingVotingRate {
        cohort: String,
    },
    UnknownRateCohort {
        cohort: String,
    },
    UnknownPreset {
        scheme: String,
    },
    /// Values were provided for a different number of cohorts than the scheme holds.
    CohortCountMismatch {
        expected: usize,
        found: usize,
    },
}

impl Error for ConfigurationError {}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::EmptyScheme { scheme } => {
                write!(f, "scheme {} has no cohort", scheme)
            }
            ConfigurationError::EmptyCohort { cohort } => {
                write!(f, "cohort {} has no age bracket", cohort)
            }
            ConfigurationError::DuplicateCohort { cohort } => {
                write!(f, "cohort {} is defined more than once", cohort)
            }
            ConfigurationError::OverlappingBracket {
                bracket,
                first,
                second,
            } => write!(
                f,
                "age bracket {} belongs to both {} and {}",
                bracket, first, second
            ),
            ConfigurationError::UnorderedCohorts { cohort } => write!(
                f,
                "cohort {} is younger than the cohort listed before it",
                cohort
            ),
            ConfigurationError::InvalidVotingRate { cohort, rate } => write!(
                f,
                "voting rate {} of cohort {} is not between 0 and 1",
                rate, cohort
            ),
            ConfigurationError::MissingVotingRate { cohort } => {
                write!(f, "no voting rate for cohort {}", cohort)
            }
            ConfigurationError::UnknownRateCohort { cohort } => write!(
                f,
                "voting rate given for {}, which is not a cohort of the scheme",
                cohort
            ),
            ConfigurationError::UnknownPreset { scheme } => {
                write!(f, "unknown partition scheme {:?}", scheme)
            }
            ConfigurationError::CohortCountMismatch { expected, found } => write!(
                f,
                "expected values for {} cohorts, got {}",
                expected, found
            ),
        }
    }
}

/// The input table does not have the shape the scheme requires.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DataShapeError {
    MissingBracket { code: String, bracket: AgeBracket },
}

impl Error for DataShapeError {}

impl Display for DataShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataShapeError::MissingBracket { code, bracket } => write!(
                f,
                "municipality {}: the age bracket column {} is missing",
                code,
                bracket.label()
            ),
        }
    }
}

/// Errors that abort a whole batch.
#[derive(PartialEq, Debug, Clone)]
pub enum InfluenceError {
    Configuration(ConfigurationError),
    DataShape(DataShapeError),
}

impl Error for InfluenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InfluenceError::Configuration(e) => Some(e),
            InfluenceError::DataShape(e) => Some(e),
        }
    }
}

impl Display for InfluenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfluenceError::Configuration(e) => write!(f, "configuration error: {}", e),
            InfluenceError::DataShape(e) => write!(f, "invalid input data: {}", e),
        }
    }
}

impl From<ConfigurationError> for InfluenceError {
    fn from(e: ConfigurationError) -> Self {
        InfluenceError::Configuration(e)
    }
}

impl From<DataShapeError> for InfluenceError {
    fn from(e: DataShapeError) -> Self {
        InfluenceError::DataShape(e)
    }
}
