use covid_tracker::braille::BrailleCanvas;
use covid_tracker::data::generate_simple_world;
use covid_tracker::map::{MapRenderer, Viewport};
use covid_tracker::stats::{normalize_batch, project, sort_by_severity, CaseType, RawRecord, RegionId};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

/// Two-letter code, unique for the first 676 indices.
fn code(i: usize) -> String {
    [b'A' + (i / 26 % 26) as u8, b'A' + (i % 26) as u8]
        .iter()
        .map(|&b| b as char)
        .collect()
}

/// A country list about the size the live endpoint serves.
fn raw_catalog(n: usize) -> Vec<RawRecord> {
    (0..n)
        .map(|i| {
            let lat = (i as f64 * 7.3) % 160.0 - 80.0;
            let lng = (i as f64 * 13.7) % 340.0 - 170.0;
            serde_json::from_value(json!({
                "country": format!("Country {i}"),
                "countryInfo": { "iso2": code(i), "lat": lat, "long": lng },
                "cases": (i * 7919) % 5_000_000,
                "todayCases": i % 1000,
                "deaths": (i * 31) % 100_000,
                "recovered": (i * 4001) % 4_000_000
            }))
            .unwrap()
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let raw = raw_catalog(230);
    assert_eq!(normalize_batch(&raw).records.len(), 230);
    c.bench_function("normalize_batch_230", |b| {
        b.iter(|| normalize_batch(black_box(&raw)))
    });
}

fn bench_sort(c: &mut Criterion) {
    let records = normalize_batch(&raw_catalog(230)).records;
    c.bench_function("sort_by_severity_230", |b| {
        b.iter(|| sort_by_severity(black_box(records.clone())))
    });
}

fn bench_project(c: &mut Criterion) {
    let records = normalize_batch(&raw_catalog(230)).records;
    c.bench_function("project_markers_230", |b| {
        b.iter(|| project(black_box(&records), CaseType::Cases))
    });
}

fn bench_render(c: &mut Criterion) {
    let records = sort_by_severity(normalize_batch(&raw_catalog(230)).records);
    let markers = project(&records, CaseType::Cases);
    let mut renderer = MapRenderer::new();
    generate_simple_world(&mut renderer);
    let viewport = Viewport::new(-40.0, 34.8, 1.0, 240, 160);

    c.bench_function("render_world_120x40", |b| {
        b.iter(|| {
            let mut canvas = BrailleCanvas::new(120, 40);
            renderer.render(&mut canvas, black_box(&viewport), &markers, &RegionId::Worldwide);
            canvas
        })
    });
}

criterion_group!(benches, bench_normalize, bench_sort, bench_project, bench_render);
criterion_main!(benches);
