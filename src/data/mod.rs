//! Data access layer: the nine indicator tables, loaded from CSV and kept
//! in a TTL cache.

mod cache;
pub mod countries;
mod sources;

pub use cache::TtlCache;
pub use sources::{CsvDirectory, InMemorySource, ObservationSource};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long a loaded table is reused before it is read again
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Years offered when no source provides any
pub const DEFAULT_YEARS: (i32, i32) = (2015, 2024);

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("no table registered for {0}")]
    Unavailable(DatasetId),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// The nine source tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetId {
    GdpGrowth,
    GdpPerCapita,
    Health,
    LifeExpectancy,
    EconomicSentiment,
    Epidemic,
    Employment,
    Tourism,
    TourismNights,
}

impl DatasetId {
    pub const ALL: [DatasetId; 9] = [
        DatasetId::GdpGrowth,
        DatasetId::GdpPerCapita,
        DatasetId::Health,
        DatasetId::LifeExpectancy,
        DatasetId::EconomicSentiment,
        DatasetId::Epidemic,
        DatasetId::Employment,
        DatasetId::Tourism,
        DatasetId::TourismNights,
    ];

    /// File name inside the data directory
    pub fn file_name(self) -> &'static str {
        match self {
            DatasetId::GdpGrowth => "GDPGrowthData.csv",
            DatasetId::GdpPerCapita => "GDPPerCapitaData.csv",
            DatasetId::Health => "HealthcareExpenditureData.csv",
            DatasetId::LifeExpectancy => "LifeExpectancyData(1YO).csv",
            DatasetId::EconomicSentiment => "EconomicSentimentData.csv",
            DatasetId::Epidemic => "EpidemicData.csv",
            DatasetId::Employment => "EmploymentRateData.csv",
            DatasetId::Tourism => "PercentTourismContributing.csv",
            DatasetId::TourismNights => "TourismNights.csv",
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetId::GdpGrowth => "gdp_growth",
            DatasetId::GdpPerCapita => "gdp_per_capita",
            DatasetId::Health => "health",
            DatasetId::LifeExpectancy => "lifeexp",
            DatasetId::EconomicSentiment => "econ",
            DatasetId::Epidemic => "epidemic",
            DatasetId::Employment => "employment",
            DatasetId::Tourism => "tourism",
            DatasetId::TourismNights => "tourism_nights",
        };
        f.write_str(name)
    }
}

/// One (country, year) observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    pub country: String,
    pub year: i32,
    /// Absent when the source cell was empty or not numeric
    pub value: Option<f64>,
    /// Absent when the country name has no ISO mapping
    pub iso_alpha: Option<String>,
}

impl ObservationRecord {
    pub fn new(country: impl Into<String>, year: i32, value: Option<f64>, iso_alpha: Option<&str>) -> Self {
        Self {
            country: country.into(),
            year,
            value,
            iso_alpha: iso_alpha.map(str::to_string),
        }
    }
}

/// A loaded table
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<ObservationRecord>,
}

impl Dataset {
    /// Rows for a single year
    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &ObservationRecord> {
        self.records.iter().filter(move |r| r.year == year)
    }

    pub fn year_span(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Numeric value of a cell, or 0.0 when absent or not finite
pub fn coerce_numeric(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse a raw CSV cell; empty or non-numeric text is absent
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Cached access to the nine tables
pub struct DataAccess {
    source: Box<dyn ObservationSource>,
    cache: TtlCache<DatasetId, Dataset>,
}

impl DataAccess {
    pub fn new(source: impl ObservationSource + 'static, ttl: Duration) -> Self {
        Self {
            source: Box::new(source),
            cache: TtlCache::new(ttl),
        }
    }

    /// Read-through load of one table
    pub fn load(&self, id: DatasetId) -> Result<Arc<Dataset>> {
        if let Some(hit) = self.cache.get(id) {
            debug!(dataset = %id, "cache hit");
            return Ok(hit);
        }
        self.cache.get_or_try_load(id, || {
            let records = self.source.fetch(id)?;
            info!(dataset = %id, rows = records.len(), "loaded dataset");
            Ok(Dataset { records })
        })
    }

    pub fn load_gdp_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::GdpGrowth)
    }

    pub fn load_gdp_per_capita_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::GdpPerCapita)
    }

    pub fn load_health_expenditure_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::Health)
    }

    pub fn load_life_expectancy_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::LifeExpectancy)
    }

    pub fn load_economic_sentiment(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::EconomicSentiment)
    }

    pub fn load_epidemic_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::Epidemic)
    }

    pub fn load_employment_rate_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::Employment)
    }

    pub fn load_tourism_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::Tourism)
    }

    pub fn load_tourism_nights_data(&self) -> Result<Arc<Dataset>> {
        self.load(DatasetId::TourismNights)
    }

    /// Inclusive span of years across every table that loads
    pub fn year_span(&self) -> (i32, i32) {
        let mut span: Option<(i32, i32)> = None;
        for id in DatasetId::ALL {
            match self.load(id) {
                Ok(dataset) => {
                    if let Some((lo, hi)) = dataset.year_span() {
                        span = Some(match span {
                            Some((a, b)) => (a.min(lo), b.max(hi)),
                            None => (lo, hi),
                        });
                    }
                }
                Err(e) => warn!(dataset = %id, "skipping in year span: {}", e),
            }
        }
        span.unwrap_or(DEFAULT_YEARS)
    }
}
