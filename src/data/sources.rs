use super::countries::{iso_to_name, name_to_iso, EPIDEMIC_COUNTRIES};
use super::{parse_numeric, DataError, DatasetId, ObservationRecord, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Anything that can produce the rows of a table
pub trait ObservationSource: Send + Sync {
    fn fetch(&self, id: DatasetId) -> Result<Vec<ObservationRecord>>;
}

/// Tables read from CSV files in one directory
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, id: DatasetId) -> PathBuf {
        self.root.join(id.file_name())
    }
}

impl ObservationSource for CsvDirectory {
    fn fetch(&self, id: DatasetId) -> Result<Vec<ObservationRecord>> {
        let path = self.path_of(id);
        let file = File::open(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        parse_table(id, BufReader::new(file), &path)
    }
}

/// Fixed tables held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: HashMap<DatasetId, Vec<ObservationRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: DatasetId, records: Vec<ObservationRecord>) -> Self {
        self.tables.insert(id, records);
        self
    }
}

impl ObservationSource for InMemorySource {
    fn fetch(&self, id: DatasetId) -> Result<Vec<ObservationRecord>> {
        self.tables.get(&id).cloned().ok_or(DataError::Unavailable(id))
    }
}

/// Parse one source file into normalized records.
/// `path` is only used for error messages.
pub fn parse_table<R: Read>(id: DatasetId, reader: R, path: &Path) -> Result<Vec<ObservationRecord>> {
    let rows = match id {
        DatasetId::GdpGrowth | DatasetId::GdpPerCapita => eurostat_rows(reader, path, parse_year)?,
        DatasetId::Health | DatasetId::LifeExpectancy | DatasetId::Employment => {
            mean_by_iso_year(eurostat_rows(reader, path, parse_year)?)
        }
        DatasetId::EconomicSentiment => mean_by_iso_year(eurostat_rows(reader, path, year_prefix)?),
        DatasetId::Epidemic => epidemic_rows(reader, path)?,
        DatasetId::Tourism => tourism_rows(reader, path)?,
        DatasetId::TourismNights => mean_by_iso_year(tourism_nights_rows(reader, path)?),
    };
    debug!(dataset = %id, rows = rows.len(), "parsed {:?}", path);
    Ok(rows)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> DataError + '_ {
    move |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Calendar year from a numeric cell (`2018`, `2018.0`)
fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    raw.parse::<i32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|y| y.is_finite() && y.fract() == 0.0)
            .map(|y| y as i32)
    })
}

/// Calendar year from the leading four characters (`2018-03`, `2018M03`)
fn year_prefix(raw: &str) -> Option<i32> {
    raw.trim().get(..4).and_then(|y| y.parse().ok())
}

/// Eurostat long-format export
#[derive(Debug, Deserialize)]
struct EurostatRow {
    geo: String,
    #[serde(rename = "TIME_PERIOD")]
    time_period: String,
    #[serde(rename = "OBS_VALUE", default)]
    obs_value: Option<String>,
}

fn eurostat_rows<R: Read>(
    reader: R,
    path: &Path,
    year_of: fn(&str) -> Option<i32>,
) -> Result<Vec<ObservationRecord>> {
    let mut rdr = csv_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize::<EurostatRow>() {
        let row = result.map_err(csv_error(path))?;
        let Some(year) = year_of(&row.time_period) else {
            continue;
        };
        let value = row.obs_value.as_deref().and_then(parse_numeric);
        let iso = name_to_iso(&row.geo);
        rows.push(ObservationRecord::new(row.geo, year, value, iso));
    }
    Ok(rows)
}

/// Average per (iso, year), dropping rows with no ISO code. Absent values
/// are skipped; a group with no values stays absent.
fn mean_by_iso_year(rows: Vec<ObservationRecord>) -> Vec<ObservationRecord> {
    let mut groups: BTreeMap<(String, i32), (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(iso) = row.iso_alpha else {
            continue;
        };
        let slot = groups.entry((iso, row.year)).or_insert((0.0, 0));
        if let Some(v) = row.value {
            slot.0 += v;
            slot.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|((iso, year), (sum, n))| {
            let value = (n > 0).then(|| sum / n as f64);
            ObservationRecord::new(iso_to_name(&iso), year, value, Some(iso.as_str()))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct EpidemicRow {
    #[serde(default)]
    country_extracted: Option<String>,
    #[serde(default)]
    cases_extracted: Option<String>,
    #[serde(default)]
    date_extracted: Option<String>,
}

/// `"Lombardy (Italy)"` -> `"Italy"`
fn clean_country(raw: &str) -> &str {
    match (raw.find('('), raw.find(')')) {
        (Some(start), Some(end)) if start < end => raw[start + 1..end].trim(),
        _ => raw.trim(),
    }
}

/// Year of a report date in any of the formats seen in the feed
fn report_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.year());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.year());
        }
    }
    ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.year())
}

/// Case counts summed per (country, year)
fn epidemic_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<ObservationRecord>> {
    let mut rdr = csv_reader(reader);
    let mut totals: BTreeMap<(String, i32), f64> = BTreeMap::new();
    for result in rdr.deserialize::<EpidemicRow>() {
        let row = result.map_err(csv_error(path))?;
        let Some(raw_country) = row.country_extracted.as_deref() else {
            continue;
        };
        let country = clean_country(raw_country);
        if !EPIDEMIC_COUNTRIES.contains(&country) {
            continue;
        }
        let Some(year) = row.date_extracted.as_deref().and_then(report_year) else {
            continue;
        };
        let cases = row.cases_extracted.as_deref().and_then(parse_numeric).unwrap_or(0.0);
        *totals.entry((country.to_string(), year)).or_insert(0.0) += cases;
    }
    Ok(totals
        .into_iter()
        .filter_map(|((country, year), cases)| {
            let iso = name_to_iso(&country)?;
            Some(ObservationRecord::new(country, year, Some(cases), Some(iso)))
        })
        .collect())
}

/// Wide table: `Country` followed by one column per year
fn tourism_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<ObservationRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(csv_error(path))?.clone();
    let country_col = headers
        .iter()
        .position(|h| h == "Country")
        .ok_or_else(|| DataError::MissingColumn {
            path: path.to_path_buf(),
            column: "Country",
        })?;
    let year_cols: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != country_col)
        .filter_map(|(i, h)| parse_year(h).map(|y| (i, y)))
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error(path))?;
        let Some(country) = record.get(country_col) else {
            continue;
        };
        let Some(iso) = name_to_iso(country) else {
            continue;
        };
        for &(col, year) in &year_cols {
            let value = record.get(col).and_then(parse_numeric);
            rows.push(ObservationRecord::new(country, year, value, Some(iso)));
        }
    }
    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct TourismNightsRow {
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "YEAR")]
    year: String,
    #[serde(rename = "VALUE", default)]
    value: Option<String>,
}

fn tourism_nights_rows<R: Read>(reader: R, path: &Path) -> Result<Vec<ObservationRecord>> {
    let mut rdr = csv_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize::<TourismNightsRow>() {
        let row = result.map_err(csv_error(path))?;
        let Some(year) = parse_year(&row.year) else {
            continue;
        };
        let value = row.value.as_deref().and_then(parse_numeric);
        let iso = name_to_iso(&row.name);
        rows.push(ObservationRecord::new(row.name, year, value, iso));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(id: DatasetId, csv: &str) -> Vec<ObservationRecord> {
        parse_table(id, csv.as_bytes(), Path::new("fixture.csv")).unwrap()
    }

    #[test]
    fn test_gdp_keeps_raw_rows() {
        let rows = parse(
            DatasetId::GdpGrowth,
            "DATAFLOW,geo,TIME_PERIOD,OBS_VALUE\n\
             ESTAT,France,2018,1.9\n\
             ESTAT,Euro area,2018,1.8\n\
             ESTAT,Germany,2018,\n",
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].iso_alpha.as_deref(), Some("FRA"));
        assert_eq!(rows[0].value, Some(1.9));
        assert_eq!(rows[1].iso_alpha, None);
        assert_eq!(rows[2].value, None);
    }

    #[test]
    fn test_health_averages_per_country_year() {
        let rows = parse(
            DatasetId::Health,
            "geo,TIME_PERIOD,OBS_VALUE\n\
             Czech Republic,2018,2000\n\
             Czechia,2018,3000\n\
             Atlantis,2018,10\n\
             Czechia,2019,\n",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].iso_alpha.as_deref(), Some("CZE"));
        assert_eq!(rows[0].country, "Czechia");
        assert_eq!(rows[0].value, Some(2500.0));
        assert_eq!(rows[1].year, 2019);
        assert_eq!(rows[1].value, None);
    }

    #[test]
    fn test_econ_sentiment_monthly_periods() {
        let rows = parse(
            DatasetId::EconomicSentiment,
            "geo,TIME_PERIOD,OBS_VALUE\n\
             Spain,2020-01,100\n\
             Spain,2020-02,80\n\
             Spain,2021-01,110\n",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].year, rows[0].value), (2020, Some(90.0)));
        assert_eq!((rows[1].year, rows[1].value), (2021, Some(110.0)));
    }

    #[test]
    fn test_epidemic_sums_cases() {
        let rows = parse(
            DatasetId::Epidemic,
            "country_extracted,cases_extracted,date_extracted\n\
             Lombardy (Italy),10,2020-03-01\n\
             Italy,5,2020-07-15\n\
             Italy,x,2020-08-01\n\
             Norway,40,2020-01-01\n\
             Brazil,1000,2020-01-01\n\
             Italy,7,not a date\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].iso_alpha.as_deref(), Some("ITA"));
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].value, Some(15.0));
    }

    #[test]
    fn test_tourism_wide_table_is_melted() {
        let rows = parse(
            DatasetId::Tourism,
            "Country,2018,2019\n\
             Portugal,50.5,61\n\
             Narnia,1,2\n",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].year, rows[0].value), (2018, Some(50.5)));
        assert_eq!((rows[1].year, rows[1].value), (2019, Some(61.0)));
        assert!(rows.iter().all(|r| r.iso_alpha.as_deref() == Some("PRT")));
    }

    #[test]
    fn test_tourism_requires_country_column() {
        let err = parse_table(DatasetId::Tourism, "Nation,2018\nMalta,3\n".as_bytes(), Path::new("t.csv"))
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column: "Country", .. }));
    }

    #[test]
    fn test_tourism_nights() {
        let rows = parse(
            DatasetId::TourismNights,
            "NAME,YEAR,VALUE\n\
             UK,2018,1000\n\
             United Kingdom,2018,3000\n",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "United Kingdom");
        assert_eq!(rows[0].value, Some(2000.0));
    }

    #[test]
    fn test_report_year_formats() {
        assert_eq!(report_year("2019-12-31"), Some(2019));
        assert_eq!(report_year("2019-12-31 08:00:00"), Some(2019));
        assert_eq!(report_year("31/12/2019"), Some(2019));
        assert_eq!(report_year("2020-01-01T00:00:00Z"), Some(2020));
        assert_eq!(report_year("soon"), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = CsvDirectory::new("/nonexistent-data-dir");
        assert!(matches!(dir.fetch(DatasetId::Health), Err(DataError::Io { .. })));
    }
}
