pub use crate::config::*;

use std::collections::HashMap;

/// A builder for population records.
///
/// The readers go through it, so that the municipality codes are always
/// normalized the same way.
///
/// ```
/// use voting_influence::builder::RecordBuilder;
/// use voting_influence::{run_batch, AgeBracket, PartitionScheme};
///
/// let record = RecordBuilder::new("24201", "津市")
///     .prefecture("三重県")
///     .counts(&AgeBracket::ALL, 100.0)
///     .build();
/// assert_eq!(record.code, "024201");
///
/// let out = run_batch(&[record], &PartitionScheme::eligible_voters())?;
/// assert_eq!(out.table.len(), 6);
///
/// # Ok::<(), voting_influence::InfluenceError>(())
/// ```
pub struct RecordBuilder {
    _code: String,
    _name: String,
    _prefecture: String,
    _stratum: String,
    _reported_total: Option<RawCount>,
    _brackets: HashMap<AgeBracket, RawCount>,
}

impl RecordBuilder {
    pub fn new(code: &str, name: &str) -> RecordBuilder {
        RecordBuilder {
            _code: crate::normalize_municipality_code(code),
            _name: name.trim().to_string(),
            _prefecture: String::new(),
            _stratum: TOTAL_STRATUM.to_string(),
            _reported_total: None,
            _brackets: HashMap::new(),
        }
    }

    pub fn prefecture(self, prefecture: &str) -> RecordBuilder {
        RecordBuilder {
            _prefecture: prefecture.trim().to_string(),
            ..self
        }
    }

    /// The gender stratum of the row. Defaults to the all-genders total.
    pub fn stratum(self, stratum: &str) -> RecordBuilder {
        RecordBuilder {
            _stratum: stratum.trim().to_string(),
            ..self
        }
    }

    pub fn reported_total(self, total: RawCount) -> RecordBuilder {
        RecordBuilder {
            _reported_total: Some(total),
            ..self
        }
    }

    /// Sets the cell of a bracket, as read from the source.
    ///
    /// A bracket set twice keeps the last value.
    pub fn cell(mut self, bracket: AgeBracket, cell: RawCount) -> RecordBuilder {
        self._brackets.insert(bracket, cell);
        self
    }

    pub fn count(self, bracket: AgeBracket, count: f64) -> RecordBuilder {
        self.cell(bracket, RawCount::Number(count))
    }

    /// Sets the same count for all the given brackets.
    pub fn counts(self, brackets: &[AgeBracket], count: f64) -> RecordBuilder {
        brackets.iter().fold(self, |b, bracket| b.count(*bracket, count))
    }

    pub fn build(self) -> RawMunicipalityRecord {
        RawMunicipalityRecord {
            code: self._code,
            name: self._name,
            prefecture: self._prefecture,
            stratum: self._stratum,
            reported_total: self._reported_total,
            brackets: self._brackets,
        }
    }
}
