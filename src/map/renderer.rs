use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, point_in_polygon, ring_bbox, Ring};
use crate::map::projection::Viewport;
use crate::map::spatial::{BBox, FeatureGrid};
use rayon::prelude::*;

/// Index cell size in degrees
const GRID_CELL_DEGREES: f64 = 2.0;

/// One country outline from the geometry file
#[derive(Debug, Clone)]
pub struct CountryShape {
    pub iso_alpha: String,
    pub name: String,
    /// Polygons, each an exterior ring followed by its holes
    pub polygons: Vec<Vec<Ring>>,
    pub bbox: BBox,
}

impl CountryShape {
    /// Returns `None` if the shape has no usable ring
    pub fn new(iso_alpha: impl Into<String>, name: impl Into<String>, polygons: Vec<Vec<Ring>>) -> Option<Self> {
        let bbox = polygons
            .iter()
            .filter_map(|p| p.first())
            .filter_map(|ring| ring_bbox(ring))
            .reduce(|(a, b, c, d), (e, f, g, h)| (a.min(e), b.min(f), c.max(g), d.max(h)))?;
        Some(Self {
            iso_alpha: iso_alpha.into(),
            name: name.into(),
            polygons,
            bbox,
        })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let (min_lon, min_lat, max_lon, max_lat) = self.bbox;
        if lon < min_lon || lon > max_lon || lat < min_lat || lat > max_lat {
            return false;
        }
        self.polygons.iter().any(|rings| point_in_polygon(lon, lat, rings))
    }
}

/// Rasterized map for one frame
pub struct MapLayers {
    /// Country outlines
    pub borders: BrailleCanvas,
    /// Country index under each character cell, row-major
    pub regions: Vec<Option<usize>>,
    pub width: usize,
    pub height: usize,
}

impl MapLayers {
    pub fn region_at(&self, cx: usize, cy: usize) -> Option<usize> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        self.regions[cy * self.width + cx]
    }
}

/// Country shapes with a point lookup index
pub struct ChoroplethRenderer {
    countries: Vec<CountryShape>,
    grid: FeatureGrid,
    pub show_borders: bool,
}

impl ChoroplethRenderer {
    pub fn new(countries: Vec<CountryShape>) -> Self {
        let grid = FeatureGrid::build(countries.iter().map(|c| c.bbox), GRID_CELL_DEGREES);
        Self {
            countries,
            grid,
            show_borders: true,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.countries.is_empty()
    }

    pub fn countries(&self) -> &[CountryShape] {
        &self.countries
    }

    pub fn country(&self, idx: usize) -> Option<&CountryShape> {
        self.countries.get(idx)
    }

    /// Index of the country containing the point
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<usize> {
        self.grid
            .query_point(lon, lat)
            .iter()
            .copied()
            .find(|&idx| self.countries[idx].contains(lon, lat))
    }

    /// Rasterize for a canvas of `width` x `height` character cells.
    /// Each cell is hit-tested at its centre; rows are processed in parallel.
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let mut regions = vec![None; width * height];
        if width > 0 {
            regions
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(cy, row)| {
                    let py = cy as f64 * 4.0 + 2.0;
                    for (cx, slot) in row.iter_mut().enumerate() {
                        let (lon, lat) = viewport.unproject_f(cx as f64 * 2.0 + 1.0, py);
                        *slot = self.country_at(lon, lat);
                    }
                });
        }

        let mut borders = BrailleCanvas::new(width, height);
        if self.show_borders {
            let mut visible = Vec::new();
            self.grid.query_into(viewport.visible_bounds(), &mut visible);
            visible.sort_unstable();
            visible.dedup();
            for idx in visible {
                for rings in &self.countries[idx].polygons {
                    for ring in rings {
                        draw_ring(&mut borders, ring, viewport);
                    }
                }
            }
        }

        MapLayers {
            borders,
            regions,
            width,
            height,
        }
    }

    pub fn toggle_borders(&mut self) {
        self.show_borders = !self.show_borders;
    }
}

/// Draw a ring with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in ring {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // long jumps are antimeridian wraps, not real edges
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}
