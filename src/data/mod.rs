use crate::map::{Lod, MapRenderer};
use anyhow::Result;
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::ops::Index;
use std::path::Path;

/// Natural Earth files looked up in the data directory.
const COASTLINE_FILES: [(&str, Lod); 2] = [
    ("ne_110m_coastline.json", Lod::Low),
    ("ne_50m_coastline.json", Lod::Medium),
];
const BORDER_FILES: [&str; 2] = [
    "ne_110m_admin_0_boundary_lines_land.json",
    "ne_50m_admin_0_boundary_lines_land.json",
];

/// Load whatever backdrop files exist in `data_dir`. Falls back to the
/// built-in outline when no coastline could be loaded.
pub fn load_backdrop(renderer: &mut MapRenderer, data_dir: &Path) {
    for (filename, lod) in COASTLINE_FILES {
        let path = data_dir.join(filename);
        if path.exists() {
            match load_lines(&path) {
                Ok(lines) => {
                    tracing::info!(file = filename, lines = lines.len(), "coastlines loaded");
                    lines.into_iter().for_each(|l| renderer.add_coastline(l, lod));
                }
                Err(e) => tracing::warn!(file = filename, error = %e, "failed to load coastlines"),
            }
        }
    }

    // One border resolution is enough; take the first that loads.
    for filename in BORDER_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match load_lines(&path) {
            Ok(lines) => {
                tracing::info!(file = filename, lines = lines.len(), "borders loaded");
                lines.into_iter().for_each(|l| renderer.add_border(l));
                break;
            }
            Err(e) => tracing::warn!(file = filename, error = %e, "failed to load borders"),
        }
    }

    if !renderer.has_data() {
        tracing::info!(dir = %data_dir.display(), "no coastline data, using built-in outline");
        generate_simple_world(renderer);
    }
}

fn load_lines(path: &Path) -> Result<Vec<Vec<(f64, f64)>>> {
    let content = fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;
    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn to_line<P: Index<usize, Output = f64>>(coords: &[P]) -> Vec<(f64, f64)> {
    coords.iter().map(|c| (c[0], c[1])).collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|c| add_line(to_line(c))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Very coarse continent rings, enough to orient the markers when no
/// Natural Earth data is installed.
pub fn generate_simple_world(renderer: &mut MapRenderer) {
    const OUTLINES: &[&[(f64, f64)]] = &[
        // North America
        &[
            (-162.0, 70.0), (-156.0, 58.0), (-135.0, 58.5), (-124.5, 49.0),
            (-121.0, 36.0), (-114.0, 30.0), (-105.5, 20.0), (-95.0, 16.0),
            (-83.0, 9.0), (-78.0, 8.5), (-84.0, 15.0), (-88.0, 21.5),
            (-97.5, 22.0), (-95.0, 29.5), (-84.5, 30.0), (-80.5, 25.5),
            (-80.0, 32.0), (-74.0, 40.5), (-66.0, 44.5), (-60.0, 46.0),
            (-64.0, 58.0), (-78.0, 62.5), (-94.0, 60.0), (-88.0, 68.0),
            (-115.0, 69.0), (-140.0, 69.5), (-162.0, 70.0),
        ],
        // South America
        &[
            (-77.5, 8.5), (-72.0, 12.0), (-62.0, 10.5), (-51.0, 4.0),
            (-44.5, -2.5), (-35.0, -7.0), (-39.0, -15.0), (-41.5, -22.5),
            (-48.5, -27.0), (-57.0, -36.0), (-63.0, -40.5), (-66.0, -47.0),
            (-69.0, -51.5), (-73.5, -53.0), (-74.5, -46.0), (-73.5, -37.0),
            (-71.5, -28.0), (-70.5, -18.5), (-76.0, -14.0), (-81.0, -5.0),
            (-79.5, 1.0), (-77.5, 8.5),
        ],
        // Africa
        &[
            (-16.5, 21.0), (-9.5, 30.0), (-5.5, 36.0), (10.0, 37.0),
            (20.0, 31.0), (32.0, 31.5), (34.0, 27.5), (38.5, 18.0),
            (43.5, 11.5), (51.0, 11.5), (40.5, -2.5), (40.0, -15.0),
            (35.0, -24.0), (31.0, -29.5), (20.0, -34.8), (17.5, -29.0),
            (12.0, -18.0), (13.0, -9.0), (9.0, -1.0), (9.5, 4.0),
            (2.0, 6.3), (-8.0, 4.5), (-13.0, 8.0), (-17.3, 14.7),
            (-16.5, 21.0),
        ],
        // Europe and Asia
        &[
            (-9.0, 38.5), (-9.0, 43.0), (-1.5, 46.5), (-4.5, 48.5),
            (2.0, 51.0), (8.5, 54.0), (11.0, 58.5), (5.5, 62.0),
            (15.0, 68.5), (28.0, 71.0), (40.5, 67.0), (60.0, 69.0),
            (80.0, 73.0), (105.0, 77.5), (140.0, 72.5), (170.0, 69.5),
            (178.0, 64.5), (160.0, 60.0), (156.0, 51.0), (141.0, 53.0),
            (135.0, 43.5), (129.5, 35.0), (122.0, 30.0), (119.5, 25.0),
            (108.0, 21.5), (106.5, 10.5), (100.5, 13.5), (103.5, 1.5),
            (98.5, 8.0), (94.5, 16.5), (91.0, 22.5), (80.5, 15.5),
            (77.5, 8.0), (72.5, 21.0), (66.5, 25.0), (57.0, 25.5),
            (56.5, 24.0), (59.5, 22.5), (52.0, 16.5), (43.0, 12.8),
            (35.0, 28.5), (34.0, 31.5), (36.0, 36.5), (27.0, 37.0),
            (26.5, 40.5), (23.0, 40.0), (19.5, 41.8), (13.5, 45.5),
            (12.5, 44.0), (16.0, 38.0), (8.5, 44.0), (3.0, 43.0),
            (-0.5, 38.5), (-5.5, 36.0), (-9.0, 38.5),
        ],
        // Australia
        &[
            (113.5, -22.0), (122.0, -17.5), (129.5, -14.5), (136.5, -12.0),
            (142.0, -10.8), (146.0, -19.0), (153.5, -28.0), (150.0, -37.5),
            (141.5, -38.5), (137.5, -33.5), (131.0, -31.5), (124.0, -33.5),
            (115.0, -34.0), (113.5, -22.0),
        ],
        // Great Britain
        &[
            (-5.5, 50.0), (1.5, 51.2), (1.7, 52.8), (-0.5, 54.5),
            (-2.0, 57.7), (-5.0, 58.6), (-6.0, 56.5), (-3.0, 53.4),
            (-5.2, 51.7), (-5.5, 50.0),
        ],
        // Japan
        &[
            (130.0, 31.0), (135.0, 33.5), (140.0, 35.0), (141.5, 38.5),
            (141.5, 41.5), (145.5, 43.3), (141.7, 45.4), (139.8, 42.0),
            (139.5, 38.0), (136.0, 36.0), (132.5, 35.5), (130.0, 31.0),
        ],
    ];

    for outline in OUTLINES {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
}
