//! Joins a primary and a secondary indicator table for one year and
//! colours every country with the bivariate ramp.

use crate::color::{interpolate, Fill, BIVARIATE_CORNERS};
use crate::data::{coerce_numeric, DataAccess, DatasetId};
use crate::normalize::{normalize_primary, normalize_secondary};
use crate::variables::{PrimaryVariable, SecondaryVariable};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Title used whenever no figure can be built
pub const NO_DATA_TITLE: &str = "No data available.";

/// One shaded country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRow {
    pub iso_alpha: String,
    pub display_name: String,
    pub primary_value: f64,
    /// Absent when the secondary table has no row for this country and year
    pub secondary_value: Option<f64>,
    pub fill: Fill,
}

/// Everything the renderer needs to draw one map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub primary: PrimaryVariable,
    pub secondary: SecondaryVariable,
    pub year: i32,
    pub title: String,
    /// No country had secondary data, every row carries the sentinel fill
    pub degraded: bool,
    pub rows: Vec<MapRow>,
}

impl MapFrame {
    pub fn row(&self, iso_alpha: &str) -> Option<&MapRow> {
        self.rows.iter().find(|r| r.iso_alpha == iso_alpha)
    }

    /// Fill per ISO code
    pub fn fills(&self) -> HashMap<&str, Fill> {
        self.rows.iter().map(|r| (r.iso_alpha.as_str(), r.fill)).collect()
    }

    /// Tooltip for one row: name, primary value, secondary value or `N/A`
    pub fn hover_lines(&self, row: &MapRow) -> [String; 3] {
        let secondary = match row.secondary_value {
            Some(v) => format!("{}", v),
            None => "N/A".to_string(),
        };
        [
            row.display_name.clone(),
            format!("{}: {}", self.primary.label(), row.primary_value),
            format!("{}: {}", self.secondary.label(), secondary),
        ]
    }
}

/// Why a map could not be built
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NoDataReason {
    #[error("unsupported primary variable '{0}'")]
    UnsupportedPrimary(String),
    #[error("unsupported secondary variable '{0}'")]
    UnsupportedSecondary(String),
    #[error("{dataset} could not be loaded: {message}")]
    SourceUnavailable { dataset: DatasetId, message: String },
}

/// The "no data available" outcome
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{title} ({reason})")]
pub struct NoDataResult {
    pub title: &'static str,
    pub reason: NoDataReason,
}

impl From<NoDataReason> for NoDataResult {
    fn from(reason: NoDataReason) -> Self {
        Self {
            title: NO_DATA_TITLE,
            reason,
        }
    }
}

/// Build the map for raw selector keys
pub fn build_map(primary_key: &str, secondary_key: &str, year: i32, data: &DataAccess) -> Result<MapFrame, NoDataResult> {
    let primary: PrimaryVariable = primary_key
        .parse()
        .map_err(|_| NoDataReason::UnsupportedPrimary(primary_key.to_string()))?;
    let secondary: SecondaryVariable = secondary_key
        .parse()
        .map_err(|_| NoDataReason::UnsupportedSecondary(secondary_key.to_string()))?;
    build_map_for(primary, secondary, year, data)
}

/// Build the map for resolved variables.
///
/// Every country in the primary table for `year` that has an ISO code gets
/// exactly one row. Countries matched in the secondary table are blended;
/// the rest keep the sentinel fill and an absent secondary value.
pub fn build_map_for(
    primary: PrimaryVariable,
    secondary: SecondaryVariable,
    year: i32,
    data: &DataAccess,
) -> Result<MapFrame, NoDataResult> {
    let unavailable = |dataset: DatasetId| {
        move |e: crate::data::DataError| NoDataReason::SourceUnavailable {
            dataset,
            message: e.to_string(),
        }
    };
    let primary_table = data.load(primary.dataset()).map_err(unavailable(primary.dataset()))?;
    let secondary_table = data
        .load(secondary.dataset())
        .map_err(unavailable(secondary.dataset()))?;

    let mut secondary_by_iso: HashMap<&str, f64> = HashMap::new();
    for record in secondary_table.for_year(year) {
        if let Some(iso) = record.iso_alpha.as_deref() {
            secondary_by_iso
                .entry(iso)
                .or_insert_with(|| coerce_numeric(record.value));
        }
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut matched = 0usize;
    for record in primary_table.for_year(year) {
        let Some(iso) = record.iso_alpha.as_deref() else {
            continue;
        };
        if !seen.insert(iso) {
            debug!(iso, year, "duplicate primary row ignored");
            continue;
        }

        let primary_value = coerce_numeric(record.value);
        let secondary_value = secondary_by_iso.get(iso).copied();
        let fill = match secondary_value {
            Some(sv) => {
                matched += 1;
                let x = normalize_primary(primary_value, primary);
                let y = normalize_secondary(sv, secondary);
                Fill::Blended(interpolate(x, y, &BIVARIATE_CORNERS))
            }
            None => Fill::NoData,
        };

        rows.push(MapRow {
            iso_alpha: iso.to_string(),
            display_name: record.country.clone(),
            primary_value,
            secondary_value,
            fill,
        });
    }

    let degraded = matched == 0;
    info!(
        primary = %primary,
        secondary = %secondary,
        year,
        rows = rows.len(),
        matched,
        degraded,
        "built bivariate map"
    );

    Ok(MapFrame {
        primary,
        secondary,
        year,
        title: map_title(primary, secondary, year),
        degraded,
        rows,
    })
}

pub fn map_title(primary: PrimaryVariable, secondary: SecondaryVariable, year: i32) -> String {
    format!(
        "Bivariate Map: {} vs. {} ({})",
        primary.label(),
        secondary.label(),
        year
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::data::{InMemorySource, ObservationRecord, DEFAULT_TTL};

    fn fixture() -> DataAccess {
        let source = InMemorySource::new()
            .with(
                DatasetId::GdpGrowth,
                vec![
                    ObservationRecord::new("Austria", 2018, Some(5.0), Some("AUT")),
                    ObservationRecord::new("Belgium", 2018, Some(-5.0), Some("BEL")),
                    ObservationRecord::new("Euro area", 2018, Some(1.9), None),
                    ObservationRecord::new("Austria", 2019, Some(1.5), Some("AUT")),
                    ObservationRecord::new("Czechia", 2018, None, Some("CZE")),
                    ObservationRecord::new("Czech Republic", 2018, Some(3.2), Some("CZE")),
                ],
            )
            .with(
                DatasetId::Health,
                vec![
                    ObservationRecord::new("Austria", 2018, Some(3000.0), Some("AUT")),
                    ObservationRecord::new("Czechia", 2018, None, Some("CZE")),
                    ObservationRecord::new("Belgium", 2017, Some(4500.0), Some("BEL")),
                ],
            )
            .with(DatasetId::Tourism, Vec::new());
        DataAccess::new(source, DEFAULT_TTL)
    }

    #[test]
    fn test_partial_join() {
        let frame = build_map("gdp_growth", "health", 2018, &fixture()).unwrap();
        assert!(!frame.degraded);
        assert_eq!(frame.rows.len(), 3);

        let a = frame.row("AUT").unwrap();
        assert_eq!(a.secondary_value, Some(3000.0));
        // x = 0.75, y = 0.3
        let expected = interpolate(0.75, 0.3, &BIVARIATE_CORNERS);
        assert_eq!(a.fill, Fill::Blended(expected));

        let b = frame.row("BEL").unwrap();
        assert_eq!(b.primary_value, -5.0);
        assert_eq!(b.secondary_value, None);
        assert_eq!(b.fill, Fill::NoData);
        assert_eq!(frame.hover_lines(b)[2], "Health Expenditure: N/A");
        assert_eq!(frame.hover_lines(a)[2], "Health Expenditure: 3000");
    }

    #[test]
    fn test_non_numeric_values_coerce_to_zero() {
        let frame = build_map("gdp_growth", "health", 2018, &fixture()).unwrap();
        let cz = frame.row("CZE").unwrap();
        // first primary row wins, its value was absent
        assert_eq!(cz.display_name, "Czechia");
        assert_eq!(cz.primary_value, 0.0);
        assert_eq!(cz.secondary_value, Some(0.0));
        assert_eq!(cz.fill, Fill::Blended(interpolate(0.5, 0.0, &BIVARIATE_CORNERS)));
    }

    #[test]
    fn test_unmapped_countries_are_dropped() {
        let frame = build_map("gdp_growth", "health", 2018, &fixture()).unwrap();
        assert!(frame.rows.iter().all(|r| r.display_name != "Euro area"));
    }

    #[test]
    fn test_empty_join_degrades() {
        let frame = build_map("gdp_growth", "tourism", 2018, &fixture()).unwrap();
        assert!(frame.degraded);
        assert_eq!(frame.rows.len(), 3);
        assert!(frame.rows.iter().all(|r| r.fill.is_no_data() && r.secondary_value.is_none()));
        assert_eq!(frame.title, "Bivariate Map: GDP Growth (%) vs. Personal Tourism (%) (2018)");
        assert_eq!(frame.fills().get("AUT").map(|f| f.rgb()), Some(Rgb::LIGHT_GREY));
    }

    #[test]
    fn test_unknown_keys_report_no_data() {
        let data = fixture();
        let err = build_map("unknown_key", "health", 2018, &data).unwrap_err();
        assert_eq!(err.title, NO_DATA_TITLE);
        assert_eq!(err.reason, NoDataReason::UnsupportedPrimary("unknown_key".into()));
        let err = build_map("gdp_growth", "rainfall", 2018, &data).unwrap_err();
        assert_eq!(err.reason, NoDataReason::UnsupportedSecondary("rainfall".into()));
    }

    #[test]
    fn test_unloadable_table_reports_no_data() {
        let err = build_map("gdp_per_capita", "health", 2018, &fixture()).unwrap_err();
        assert!(matches!(
            err.reason,
            NoDataReason::SourceUnavailable { dataset: DatasetId::GdpPerCapita, .. }
        ));
    }

    #[test]
    fn test_year_filter() {
        let frame = build_map("gdp_growth", "health", 2019, &fixture()).unwrap();
        assert_eq!(frame.rows.len(), 1);
        assert!(frame.degraded);
        assert_eq!(frame.hover_lines(&frame.rows[0])[1], "GDP Growth (%): 1.5");
    }
}
