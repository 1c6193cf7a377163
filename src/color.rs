use serde::{Serialize, Serializer};
use std::fmt;

/// An 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
    /// Shade used for countries that have no secondary observation
    pub const LIGHT_GREY: Rgb = Rgb::new(211, 211, 211);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb`, lowercase
    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The four anchor colours of a bivariate ramp, indexed by (x, y) corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    /// x = 0, y = 0
    pub c00: Rgb,
    /// x = 1, y = 0
    pub c10: Rgb,
    /// x = 0, y = 1
    pub c01: Rgb,
    /// x = 1, y = 1
    pub c11: Rgb,
}

/// White at the origin, blue along the primary axis, red along the
/// secondary axis, magenta where both are high.
pub const BIVARIATE_CORNERS: Corners = Corners {
    c00: Rgb::WHITE,
    c10: Rgb::BLUE,
    c01: Rgb::RED,
    c11: Rgb::MAGENTA,
};

/// Bilinear blend of the four corners at (x, y).
///
/// Both coordinates are expected in [0, 1]; each channel is rounded to the
/// nearest integer and clamped into [0, 255].
pub fn interpolate(x: f64, y: f64, corners: &Corners) -> Rgb {
    let w00 = (1.0 - x) * (1.0 - y);
    let w10 = x * (1.0 - y);
    let w01 = (1.0 - x) * y;
    let w11 = x * y;

    let channel = |pick: fn(&Rgb) -> u8| -> u8 {
        let v = pick(&corners.c00) as f64 * w00
            + pick(&corners.c10) as f64 * w10
            + pick(&corners.c01) as f64 * w01
            + pick(&corners.c11) as f64 * w11;
        v.round().clamp(0.0, 255.0) as u8
    };

    Rgb {
        r: channel(|c| c.r),
        g: channel(|c| c.g),
        b: channel(|c| c.b),
    }
}

/// Colour of a choropleth region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Blended(Rgb),
    /// Sentinel for "no secondary data"; never produced by [`interpolate`]
    NoData,
}

impl Fill {
    /// Colour to paint with
    pub fn rgb(self) -> Rgb {
        match self {
            Fill::Blended(rgb) => rgb,
            Fill::NoData => Rgb::LIGHT_GREY,
        }
    }

    /// Renderer colour string: `#rrggbb`, or `lightgrey` for the sentinel
    pub fn css(self) -> String {
        match self {
            Fill::Blended(rgb) => rgb.to_hex(),
            Fill::NoData => "lightgrey".to_string(),
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Fill::NoData)
    }
}

impl Serialize for Fill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_exact() {
        let c = &BIVARIATE_CORNERS;
        assert_eq!(interpolate(0.0, 0.0, c), Rgb::WHITE);
        assert_eq!(interpolate(1.0, 0.0, c), Rgb::BLUE);
        assert_eq!(interpolate(0.0, 1.0, c), Rgb::RED);
        assert_eq!(interpolate(1.0, 1.0, c), Rgb::MAGENTA);
    }

    #[test]
    fn test_channels_monotonic_along_x() {
        let c = &BIVARIATE_CORNERS;
        for yi in 0..=10 {
            let y = yi as f64 / 10.0;
            let left = interpolate(0.0, y, c);
            let right = interpolate(1.0, y, c);
            let mut prev = left;
            for xi in 1..=50 {
                let cur = interpolate(xi as f64 / 50.0, y, c);
                for (p, n, lo, hi) in [
                    (prev.r, cur.r, left.r, right.r),
                    (prev.g, cur.g, left.g, right.g),
                    (prev.b, cur.b, left.b, right.b),
                ] {
                    if lo <= hi {
                        assert!(n >= p, "channel fell at y={y}");
                    } else {
                        assert!(n <= p, "channel rose at y={y}");
                    }
                    assert!(n >= lo.min(hi) && n <= lo.max(hi));
                }
                prev = cur;
            }
        }
    }

    #[test]
    fn test_red_channel_constant_along_top_edge() {
        // red and magenta agree on r and g
        for xi in 0..=20 {
            let rgb = interpolate(xi as f64 / 20.0, 1.0, &BIVARIATE_CORNERS);
            assert_eq!(rgb.r, 255);
            assert_eq!(rgb.g, 0);
        }
    }

    #[test]
    fn test_midpoint_blend() {
        let rgb = interpolate(0.5, 0.5, &BIVARIATE_CORNERS);
        // r: (255 + 0 + 255 + 255) / 4, g: 255 / 4, b: (255 + 255 + 0 + 255) / 4
        assert_eq!(rgb, Rgb::new(191, 64, 191));
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Rgb::new(255, 0, 171).to_hex(), "#ff00ab");
        assert_eq!(Rgb::MAGENTA.to_hex(), Rgb::MAGENTA.to_string());
        assert_eq!(Fill::Blended(Rgb::new(1, 2, 3)).css(), "#010203");
        assert_eq!(Fill::NoData.css(), "lightgrey");
        assert_eq!(serde_json::to_string(&Fill::NoData).unwrap(), "\"lightgrey\"");
    }
}
