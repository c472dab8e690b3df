/*!

This is the long-form manual for `voting_influence` and `vinfl`.

## Input data

The input is the municipal population table by age published for every
prefecture (one `.xlsx` file, or the same content saved as CSV). Each row
is one municipality and one gender stratum:

| 団体コード | 都道府県名 | 市区町村名 | 性別 | 総数 | 0歳～4歳 | ... | 100歳以上 |
|-----------|-----------|-----------|------|------|---------|-----|-----------|
| 242012    | 三重県     | 津市       | 計   | ...  | ...     | ... | ...       |

Only the rows of the `計` (all genders) stratum are used by default.
Municipality codes are normalized: dashes are removed and the code is
left-padded with zeros to 6 characters.

Cells that cannot be read as a population (empty, `-`, text, negative
numbers) are counted as 0. The municipality is kept, and every such cell is
listed in the diagnostics of the output. A column of an age bracket that the
partition scheme needs and that is absent from the file is an error for the
whole run.

### `xlsx`

Excel file. The worksheet can be chosen with `excelWorksheetName`, otherwise
the first worksheet is used.

### `csv`

Comma Separated Values with the same columns.

### Column layout

With the `header` layout (default), columns are found by their name in the
header row (`headerRowIndex`, starting at 1). The English names `code`,
`prefecture`, `municipality`, `gender` and `total` are also accepted, and
the age brackets may be written `0-4`, ..., `100+`.

With the `positional` layout, the columns are expected in the order of the
table above, whatever the content of the header row.

## Partition schemes

A partition scheme groups the age brackets into cohorts and gives the
turnout of each cohort.

* `eligible_voters`: 20代 (35%), 30代 (44%), 40代 (53%), 50代 (63%),
  60代 (72%), 70歳以上 (60%).
* `youth_and_adults`: 20歳未満 (0%), then the same cohorts from 30代. The 20s
  are not part of this scheme.

The share of a cohort is computed against the sum of all the cohorts of the
scheme, not against the published total. The voting influence of a cohort
is its share multiplied by its turnout, renormalized so that the cohorts of
one municipality add up to 100%. It tells which cohorts weigh the most in
the votes of that municipality; it cannot be compared in absolute terms
between municipalities.

## Configuration

```json
{
  "outputSettings": { "title": "三重県", "outputPath": "summary.json" },
  "dataSource": {
    "provider": "xlsx",
    "filePath": "24nsnen.xlsx",
    "headerRowIndex": 2,
    "coordinatesPath": "city_coordinates_with_codes.json"
  },
  "selection": {
    "prefecture": "三重県",
    "municipalityCodes": ["242012", "242021"]
  },
  "scheme": { "preset": "eligible_voters" }
}
```

Custom schemes give the cohorts and the voting rates separately. Both must
name the same cohorts, the cohorts must not share a bracket and must be
listed from the youngest to the oldest:

```json
"scheme": {
  "name": "three decades",
  "cohorts": [
    { "name": "30代", "brackets": ["30-34", "35-39"] },
    { "name": "40代", "brackets": ["40-44", "45-49"] },
    { "name": "50代", "brackets": ["50-54", "55-59"] }
  ],
  "votingRates": { "30代": 0.44, "40代": 0.53, "50代": 0.63 }
}
```

Relative paths are resolved from the directory of the configuration file.
Command line options take precedence over the configuration file.

## Coordinates

The map section of the output needs a lookup table from municipality codes
to locations, in JSON:

```json
{ "242012": { "prefecture": "三重県", "city": "津市", "lat": 34.71, "lng": 136.50 } }
```

The map is centered on the mean location of the municipalities of the
prefecture. There is one marker per municipality, and its size follows an
indicator. The indicator is set with `outputSettings.mapIndicator` or
`--map-indicator`:

| Indicator | Alias | Value |
|---|---|---|
| `総人口` (default) | `total` | the `総数` column, or the sum of all the brackets when it is absent or unreadable |
| `20歳未満` | `under20` | brackets `0-4` to `15-19` |
| `30-60代` | `30to69` | brackets `30-34` to `65-69` |
| `70歳以上` | `over70` | brackets `70-74` to `100+` |

The indicator is read from the population table, not from the cohorts of
the scheme. Unreadable cells count as 0.

 */
