//! Reference colour square for the bivariate ramp, with axes in the
//! variables' own units.

use crate::bivariate::{NoDataReason, NoDataResult};
use crate::color::{interpolate, Rgb, BIVARIATE_CORNERS};
use crate::normalize::{primary_ticks, secondary_ticks, Tick};
use crate::variables::{PrimaryVariable, SecondaryVariable, VariableSpec};
use serde::Serialize;

/// Samples per legend axis
pub const GRID_SIZE: usize = 100;

pub const LEGEND_TITLE: &str = "Continuous 2D Legend (Blended Axes)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub label: String,
    pub ticks: Vec<Tick>,
}

/// Sampled legend square.
///
/// `rows[0]` is the bottom edge (y = 0); y grows with the row index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendGrid {
    pub title: &'static str,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub rows: Vec<Vec<Rgb>>,
}

impl LegendGrid {
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Colour at column `col` of the row `k` places below the top edge
    pub fn from_top(&self, k: usize, col: usize) -> Option<Rgb> {
        let row = self.rows.len().checked_sub(k + 1)?;
        self.rows.get(row)?.get(col).copied()
    }
}

/// `n` evenly spaced samples over [0, 1], both ends included
fn linspace(n: usize) -> impl Iterator<Item = f64> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |i| i as f64 / last)
}

/// Build the legend for raw selector keys.
///
/// Only the primary key must be known; an unknown secondary key gets a unit
/// axis labelled "Secondary Value".
pub fn build_legend(primary_key: &str, secondary_key: &str) -> Result<LegendGrid, NoDataResult> {
    let primary: PrimaryVariable = primary_key
        .parse()
        .map_err(|_| NoDataReason::UnsupportedPrimary(primary_key.to_string()))?;
    Ok(legend_with(primary, SecondaryVariable::spec_or_fallback(secondary_key)))
}

/// Build the legend for resolved variables
pub fn legend_for(primary: PrimaryVariable, secondary: SecondaryVariable) -> LegendGrid {
    legend_with(primary, secondary.spec())
}

fn legend_with(primary: PrimaryVariable, secondary: VariableSpec) -> LegendGrid {
    let rows = linspace(GRID_SIZE)
        .map(|y| {
            linspace(GRID_SIZE)
                .map(|x| interpolate(x, y, &BIVARIATE_CORNERS))
                .collect()
        })
        .collect();

    LegendGrid {
        title: LEGEND_TITLE,
        x_axis: Axis {
            label: primary.label().to_string(),
            ticks: primary_ticks(primary),
        },
        y_axis: Axis {
            label: secondary.label.to_string(),
            ticks: secondary_ticks(&secondary),
        },
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{denormalize, normalize_secondary};

    #[test]
    fn test_grid_shape_and_orientation() {
        let grid = build_legend("gdp_growth", "health").unwrap();
        assert_eq!(grid.size(), GRID_SIZE);
        assert!(grid.rows.iter().all(|r| r.len() == GRID_SIZE));
        assert_eq!(grid.rows[0][0], Rgb::WHITE);
        assert_eq!(grid.rows[0][GRID_SIZE - 1], Rgb::BLUE);
        assert_eq!(grid.rows[GRID_SIZE - 1][0], Rgb::RED);
        assert_eq!(grid.rows[GRID_SIZE - 1][GRID_SIZE - 1], Rgb::MAGENTA);
        assert_eq!(grid.from_top(0, 0), Some(Rgb::RED));
        assert_eq!(grid.from_top(GRID_SIZE - 1, 0), Some(Rgb::WHITE));
        assert_eq!(grid.from_top(GRID_SIZE, 0), None);
    }

    #[test]
    fn test_axis_labels_follow_keys() {
        let grid = build_legend("gdp_per_capita", "lifeexp").unwrap();
        assert_eq!(grid.x_axis.label, "GDP Per Capita (Euro)");
        assert_eq!(grid.y_axis.label, "Life Expectancy");
        let y: Vec<&str> = grid.y_axis.ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(y, ["50", "60", "70", "80", "90"]);
    }

    #[test]
    fn test_unknown_secondary_uses_unit_axis() {
        let grid = build_legend("gdp_growth", "rainfall").unwrap();
        assert_eq!(grid.y_axis.label, "Secondary Value");
        assert_eq!(grid.y_axis.ticks.first().map(|t| t.value), Some(0.0));
        assert_eq!(grid.y_axis.ticks.last().map(|t| t.value), Some(1.0));
    }

    #[test]
    fn test_unknown_primary_is_no_data() {
        let err = build_legend("inflation", "health").unwrap_err();
        assert_eq!(err.reason, NoDataReason::UnsupportedPrimary("inflation".into()));
    }

    #[test]
    fn test_legend_is_deterministic() {
        let a = build_legend("gdp_growth", "tourism_nights").unwrap();
        let b = build_legend("gdp_growth", "tourism_nights").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tick_positions_round_trip() {
        for v in SecondaryVariable::ALL {
            let grid = legend_for(PrimaryVariable::GdpGrowth, v);
            let domain = v.spec().domain;
            assert_eq!(grid.y_axis.ticks.len(), 5);
            for tick in &grid.y_axis.ticks {
                let pos = normalize_secondary(tick.value, v);
                assert_eq!(pos, tick.position);
                let back = denormalize(pos, domain);
                assert!((back - tick.value).abs() <= 1e-9 * domain.1.abs().max(1.0));
            }
        }
    }
}
