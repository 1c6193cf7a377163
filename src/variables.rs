//! The selectable indicators and their fixed value domains.

use crate::data::DatasetId;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Static description of a plotted variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariableSpec {
    pub key: &'static str,
    pub label: &'static str,
    /// Nominal (min, max) used for normalization and axis range
    pub domain: (f64, f64),
}

/// Spec used for an unrecognised secondary key on the legend
pub const FALLBACK_SECONDARY: VariableSpec = VariableSpec {
    key: "",
    label: "Secondary Value",
    domain: (0.0, 1.0),
};

/// Economic indicator on the x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryVariable {
    GdpGrowth,
    GdpPerCapita,
}

impl PrimaryVariable {
    pub const ALL: [PrimaryVariable; 2] = [PrimaryVariable::GdpGrowth, PrimaryVariable::GdpPerCapita];

    pub fn spec(self) -> VariableSpec {
        match self {
            PrimaryVariable::GdpGrowth => VariableSpec {
                key: "gdp_growth",
                label: "GDP Growth (%)",
                domain: (-10.0, 10.0),
            },
            PrimaryVariable::GdpPerCapita => VariableSpec {
                key: "gdp_per_capita",
                label: "GDP Per Capita (Euro)",
                domain: (0.0, 90_000.0),
            },
        }
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn dataset(self) -> DatasetId {
        match self {
            PrimaryVariable::GdpGrowth => DatasetId::GdpGrowth,
            PrimaryVariable::GdpPerCapita => DatasetId::GdpPerCapita,
        }
    }

    /// Next option in selector order, wrapping
    pub fn cycle(self) -> Self {
        let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Social or economic indicator on the y axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryVariable {
    Health,
    LifeExpectancy,
    Epidemic,
    EconomicSentiment,
    Employment,
    Tourism,
    TourismNights,
}

impl SecondaryVariable {
    pub const ALL: [SecondaryVariable; 7] = [
        SecondaryVariable::Health,
        SecondaryVariable::LifeExpectancy,
        SecondaryVariable::Epidemic,
        SecondaryVariable::EconomicSentiment,
        SecondaryVariable::Employment,
        SecondaryVariable::Tourism,
        SecondaryVariable::TourismNights,
    ];

    pub fn spec(self) -> VariableSpec {
        let (key, label, domain) = match self {
            SecondaryVariable::Health => ("health", "Health Expenditure", (0.0, 10_000.0)),
            SecondaryVariable::LifeExpectancy => ("lifeexp", "Life Expectancy", (50.0, 90.0)),
            SecondaryVariable::Epidemic => ("epidemic", "Epidemic Cases", (0.0, 300.0)),
            SecondaryVariable::EconomicSentiment => ("econ", "Economic Sentiment", (50.0, 150.0)),
            SecondaryVariable::Employment => ("employment", "Employment Rate", (50.0, 100.0)),
            SecondaryVariable::Tourism => ("tourism", "Personal Tourism (%)", (0.0, 100.0)),
            SecondaryVariable::TourismNights => ("tourism_nights", "Tourism Nights", (0.0, 500_000_000.0)),
        };
        VariableSpec { key, label, domain }
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn dataset(self) -> DatasetId {
        match self {
            SecondaryVariable::Health => DatasetId::Health,
            SecondaryVariable::LifeExpectancy => DatasetId::LifeExpectancy,
            SecondaryVariable::Epidemic => DatasetId::Epidemic,
            SecondaryVariable::EconomicSentiment => DatasetId::EconomicSentiment,
            SecondaryVariable::Employment => DatasetId::Employment,
            SecondaryVariable::Tourism => DatasetId::Tourism,
            SecondaryVariable::TourismNights => DatasetId::TourismNights,
        }
    }

    /// Spec for a raw key, falling back to a unit domain for unknown keys
    pub fn spec_or_fallback(key: &str) -> VariableSpec {
        key.parse::<SecondaryVariable>()
            .map(SecondaryVariable::spec)
            .unwrap_or(FALLBACK_SECONDARY)
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// A variable key that is not one of the known options
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported variable key '{0}'")]
pub struct UnknownVariable(pub String);

impl FromStr for PrimaryVariable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.key() == s)
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}

impl FromStr for SecondaryVariable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.key() == s)
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}

impl fmt::Display for PrimaryVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for SecondaryVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for PrimaryVariable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl Serialize for SecondaryVariable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_parse_back() {
        for v in PrimaryVariable::ALL {
            assert_eq!(v.key().parse::<PrimaryVariable>(), Ok(v));
        }
        for v in SecondaryVariable::ALL {
            assert_eq!(v.key().parse::<SecondaryVariable>(), Ok(v));
        }
    }

    #[test]
    fn test_unknown_keys() {
        assert!("gdp".parse::<PrimaryVariable>().is_err());
        assert!("health".parse::<PrimaryVariable>().is_err());
        let fallback = SecondaryVariable::spec_or_fallback("rainfall");
        assert_eq!(fallback.domain, (0.0, 1.0));
        assert_eq!(fallback.label, "Secondary Value");
    }

    #[test]
    fn test_selector_cycling() {
        assert_eq!(PrimaryVariable::GdpGrowth.cycle(), PrimaryVariable::GdpPerCapita);
        assert_eq!(PrimaryVariable::GdpPerCapita.cycle(), PrimaryVariable::GdpGrowth);
        assert_eq!(SecondaryVariable::TourismNights.next(), SecondaryVariable::Health);
        assert_eq!(SecondaryVariable::Health.prev(), SecondaryVariable::TourismNights);
    }
}
