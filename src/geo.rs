//! Country outlines from a Natural Earth admin-0 GeoJSON file.

use crate::map::{CountryShape, Ring};
use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Geometry files tried in order inside the data directory
pub const GEOMETRY_FILES: [&str; 4] = [
    "ne_50m_admin_0_countries.json",
    "ne_50m_admin_0_countries.geojson",
    "ne_110m_admin_0_countries.json",
    "ne_110m_admin_0_countries.geojson",
];

/// Properties that may carry the ISO alpha-3 code, best first.
/// Natural Earth marks some countries (France, Norway) `-99` in ISO_A3.
const ISO_PROPERTIES: [&str; 6] = ["ISO_A3", "iso_a3", "ADM0_A3", "adm0_a3", "ISO_A3_EH", "id"];
const NAME_PROPERTIES: [&str; 4] = ["NAME", "name", "ADMIN", "admin"];

/// First existing geometry file in `data_dir`
pub fn find_geometry_file(data_dir: &Path) -> Option<PathBuf> {
    GEOMETRY_FILES
        .iter()
        .map(|f| data_dir.join(f))
        .find(|p| p.exists())
}

/// Load every country polygon from a GeoJSON file
pub fn load_country_shapes(path: &Path) -> Result<Vec<CountryShape>> {
    let mut bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let geojson = parse_geojson(&mut bytes).with_context(|| format!("invalid GeoJSON in {}", path.display()))?;

    let shapes = country_shapes(&geojson);
    info!(countries = shapes.len(), "loaded geometry from {}", path.display());
    Ok(shapes)
}

/// simd-json first; the serde_json path handles anything it rejects
fn parse_geojson(bytes: &mut [u8]) -> Result<GeoJson> {
    let fallback = String::from_utf8_lossy(bytes).into_owned();
    match simd_json::serde::from_slice::<GeoJson>(bytes) {
        Ok(geojson) => Ok(geojson),
        Err(e) => {
            warn!("simd-json parse failed ({}), retrying with serde_json", e);
            Ok(fallback.parse::<GeoJson>()?)
        }
    }
}

pub fn country_shapes(geojson: &GeoJson) -> Vec<CountryShape> {
    let features: Vec<&Feature> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().collect(),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    };

    let mut shapes = Vec::new();
    for feature in features {
        let props = feature.properties.as_ref();
        let Some(iso) = props.and_then(iso_code) else {
            continue;
        };
        let name = props
            .and_then(|p| first_string(p, &NAME_PROPERTIES))
            .unwrap_or_else(|| iso.clone());
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };

        let mut polygons = Vec::new();
        collect_polygons(geometry, &mut polygons);
        match CountryShape::new(iso, name, polygons) {
            Some(shape) => shapes.push(shape),
            None => warn!("feature without polygon rings skipped"),
        }
    }
    shapes
}

fn first_string(props: &JsonObject, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| props.get(*k))
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First property value that looks like an alpha-3 code
fn iso_code(props: &JsonObject) -> Option<String> {
    ISO_PROPERTIES
        .iter()
        .filter_map(|k| props.get(*k))
        .filter_map(|v| v.as_str())
        .find(|s| s.len() == 3 && s.chars().all(|c| c.is_ascii_uppercase()))
        .map(str::to_string)
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Vec<Ring>>) {
    match &geometry.value {
        Value::Polygon(rings) => {
            out.push(rings.iter().map(|r| to_ring(r)).collect());
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(rings.iter().map(|r| to_ring(r)).collect());
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"ISO_A3": "-99", "ADM0_A3": "FRA", "NAME": "France"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[-4, 43], [7, 43], [7, 50], [-4, 50], [-4, 43]]],
                    [[[8.5, 41.4], [9.6, 41.4], [9.6, 43], [8.5, 43], [8.5, 41.4]]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"ISO_A3": "MLT", "NAME": "Malta"},
                "geometry": {"type": "Polygon", "coordinates": [
                    [[14.2, 35.8], [14.6, 35.8], [14.6, 36.1], [14.2, 36.1], [14.2, 35.8]]
                ]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Unlabelled"},
                "geometry": {"type": "Point", "coordinates": [0, 0]}
            }
        ]
    }"#;

    #[test]
    fn test_shapes_from_feature_collection() {
        let mut bytes = SAMPLE.as_bytes().to_vec();
        let geojson = parse_geojson(&mut bytes).unwrap();
        let shapes = country_shapes(&geojson);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].iso_alpha, "FRA");
        assert_eq!(shapes[0].polygons.len(), 2);
        assert!(shapes[0].contains(9.0, 42.0));
        assert_eq!(shapes[1].name, "Malta");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(GEOMETRY_FILES[2]);
        fs::write(&path, SAMPLE).unwrap();
        assert_eq!(find_geometry_file(dir.path()), Some(path.clone()));
        assert_eq!(load_country_shapes(&path).unwrap().len(), 2);
    }
}
