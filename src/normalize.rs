//! Mapping between raw indicator values and the unit square, and back
//! again for axis ticks.

use crate::variables::{PrimaryVariable, SecondaryVariable, VariableSpec};
use serde::Serialize;

/// Number of ticks drawn on each legend axis
pub const TICK_COUNT: usize = 5;

/// Affine map of `value` from `domain` into [0, 1], clamped.
///
/// Out-of-domain values saturate at the nearest edge. A degenerate domain
/// maps everything to 0.
pub fn normalize(value: f64, domain: (f64, f64)) -> f64 {
    let (min, max) = domain;
    let span = max - min;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    let n = (value - min) / span;
    if n.is_nan() {
        return 0.0;
    }
    n.clamp(0.0, 1.0)
}

/// Inverse of [`normalize`] for in-domain positions
pub fn denormalize(position: f64, domain: (f64, f64)) -> f64 {
    let (min, max) = domain;
    min + position * (max - min)
}

pub fn normalize_primary(value: f64, variable: PrimaryVariable) -> f64 {
    normalize(value, variable.spec().domain)
}

pub fn normalize_secondary(value: f64, variable: SecondaryVariable) -> f64 {
    normalize(value, variable.spec().domain)
}

/// One labelled axis tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    /// Position on the normalized axis
    pub position: f64,
    /// Value in the variable's own units
    pub value: f64,
    pub label: String,
}

/// How tick values are rendered as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickLabel {
    /// Shortest literal form, e.g. `-10`, `22500`, `0.25`
    Literal,
    /// Rounded to an integer, e.g. `125000000`
    Rounded,
}

impl TickLabel {
    pub fn format(self, value: f64) -> String {
        match self {
            TickLabel::Literal => format!("{}", value),
            TickLabel::Rounded => format!("{:.0}", value),
        }
    }
}

/// `TICK_COUNT` evenly spaced ticks spanning the spec's domain
pub fn ticks(spec: &VariableSpec, style: TickLabel) -> Vec<Tick> {
    let (min, max) = spec.domain;
    let last = (TICK_COUNT - 1) as f64;
    (0..TICK_COUNT)
        .map(|i| {
            let value = min + (max - min) * i as f64 / last;
            Tick {
                position: normalize(value, spec.domain),
                value,
                label: style.format(value),
            }
        })
        .collect()
}

pub fn primary_ticks(variable: PrimaryVariable) -> Vec<Tick> {
    ticks(&variable.spec(), TickLabel::Literal)
}

pub fn secondary_ticks(spec: &VariableSpec) -> Vec<Tick> {
    ticks(spec, TickLabel::Rounded)
}
