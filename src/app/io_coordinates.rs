// The lookup table of the municipality locations, and the map section of the summary.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::app::*;

const DEFAULT_CENTER: (f64, f64) = (36.0, 136.0);
const DEFAULT_ZOOM: u32 = 5;
const PREFECTURE_ZOOM: u32 = 8;
const MIN_RADIUS: f64 = 5.0;
const RADIUS_RANGE: f64 = 15.0;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CityCoordinate {
    pub prefecture: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
}

/// Reads the coordinates, keyed by normalized municipality code.
pub fn read_coordinates(path: &str) -> AppResult<BTreeMap<String, CityCoordinate>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let raw: BTreeMap<String, CityCoordinate> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let res: BTreeMap<String, CityCoordinate> = raw
        .into_iter()
        .map(|(code, c)| (normalize_municipality_code(&code), c))
        .collect();
    info!("read_coordinates: {} locations in {:?}", res.len(), path);
    Ok(res)
}

/// The mean location of the municipalities of a prefecture.
fn prefecture_center(
    coordinates: &BTreeMap<String, CityCoordinate>,
    prefecture: &str,
) -> Option<(f64, f64)> {
    let mut lat = 0.0;
    let mut lng = 0.0;
    let mut count = 0;
    for c in coordinates.values().filter(|c| c.prefecture == prefecture) {
        lat += c.lat;
        lng += c.lng;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some((lat / count as f64, lng / count as f64))
    }
}

/// What the size of the markers shows.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MapIndicator {
    /// The reported total (`総数`), or the sum of all the brackets when it is absent.
    TotalPopulation,
    Under20,
    From30To69,
    Over70,
}

impl MapIndicator {
    pub fn parse(name: &str) -> AppResult<MapIndicator> {
        match name.trim() {
            "総人口" | "total" => Ok(MapIndicator::TotalPopulation),
            "20歳未満" | "under20" => Ok(MapIndicator::Under20),
            "30-60代" | "30to69" => Ok(MapIndicator::From30To69),
            "70歳以上" | "over70" => Ok(MapIndicator::Over70),
            x => whatever!(
                "unknown map indicator {:?} (expected 総人口, 20歳未満, 30-60代 or 70歳以上)",
                x
            ),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapIndicator::TotalPopulation => "総人口",
            MapIndicator::Under20 => "20歳未満",
            MapIndicator::From30To69 => "30-60代",
            MapIndicator::Over70 => "70歳以上",
        }
    }

    fn brackets(&self) -> &'static [AgeBracket] {
        let all: &'static [AgeBracket; 21] = &AgeBracket::ALL;
        match self {
            MapIndicator::TotalPopulation => all,
            MapIndicator::Under20 => &all[0..4],
            MapIndicator::From30To69 => &all[6..14],
            MapIndicator::Over70 => &all[14..],
        }
    }

    /// The value of the indicator for one record. Unreadable cells count as 0.
    pub fn value(&self, record: &RawMunicipalityRecord) -> f64 {
        if *self == MapIndicator::TotalPopulation {
            if let Some(Coerced::Value(x)) = record.reported_total.as_ref().map(safe_parse) {
                return x;
            }
        }
        let mut total = 0.0;
        for b in self.brackets() {
            if let Some(Coerced::Value(x)) = record.brackets.get(b).map(safe_parse) {
                total += x;
            }
        }
        total
    }
}

fn format_coordinate(x: f64) -> String {
    format!("{:.6}", x)
}

/// One marker per municipality of the table, sized by the indicator.
///
/// The indicator is read from the first record of each municipality, as the
/// batch does.
pub fn map_to_json(
    coordinates: &BTreeMap<String, CityCoordinate>,
    prefecture: &str,
    table: &ResultTable,
    records: &[&RawMunicipalityRecord],
    indicator: MapIndicator,
) -> JSValue {
    let (center, zoom) = match prefecture_center(coordinates, prefecture) {
        Some(c) => (c, PREFECTURE_ZOOM),
        None => {
            warn!("No coordinates for the prefecture {}", prefecture);
            (DEFAULT_CENTER, DEFAULT_ZOOM)
        }
    };

    let populations: Vec<(&str, String, f64)> = table
        .municipality_codes()
        .into_iter()
        .map(|code| {
            let name = table
                .municipality(code)
                .first()
                .map(|r| r.municipality_name.clone())
                .unwrap_or_default();
            let population = records
                .iter()
                .find(|r| r.code == code)
                .map_or(0.0, |r| indicator.value(r));
            (code, name, population)
        })
        .collect();
    let max_population = populations.iter().fold(0.0, |acc: f64, (_, _, p)| acc.max(*p));

    let mut markers: Vec<JSValue> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    for (code, name, population) in populations.iter() {
        match coordinates.get(*code) {
            Some(c) => {
                let radius = if max_population > 0.0 {
                    MIN_RADIUS + population / max_population * RADIUS_RANGE
                } else {
                    MIN_RADIUS
                };
                markers.push(json!({
                    "code": code,
                    "municipality": name,
                    "lat": format_coordinate(c.lat),
                    "lng": format_coordinate(c.lng),
                    "population": format!("{}", population),
                    "radius": format!("{:.4}", radius)
                }));
            }
            None => {
                warn!("No coordinates for {} (code {})", name, code);
                missing.push(code.to_string());
            }
        }
    }
    debug!(
        "map_to_json: {} markers for {}, missing: {:?}",
        markers.len(),
        indicator.label(),
        missing
    );

    json!({
        "center": {"lat": format_coordinate(center.0), "lng": format_coordinate(center.1)},
        "indicator": indicator.label(),
        "zoom": zoom,
        "markers": markers,
        "missing": missing
    })
}
