//! Benchmarks du pipeline CSV -> agrégats -> jointure

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use epidata::geojoin::{count_within, load_points, parse_feature_collection};
use epidata::{
    aggregate_by_region, filter, join_metrics_to_features, parse_bytes, AdminLayerConfig,
    FilterState, GeometryKind, IngestPolicy, Theme,
};

const REGIONS: &[&str] = &[
    "Dakar", "Thiès", "Diourbel", "Fatick", "Kaolack", "Kaffrine", "Louga", "Saint-Louis",
    "Matam", "Tambacounda", "Kédougou", "Kolda", "Sédhiou", "Ziguinchor",
];

/// CSV synthétique de `rows` lignes
fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from(
        "Date,Region,Maladie,Cas_confirmes,Morts,Temperature_moy,Humidite_moy,Vent_vit_moy,Densite\n",
    );
    for i in 0..rows {
        let disease = if i % 3 == 0 { "Dengue" } else { "Paludisme" };
        csv.push_str(&format!(
            "{:02}/{:02}/{},{},{},{},{},{:.1},{},{:.1},{}\n",
            i % 28 + 1,
            i % 12 + 1,
            2020 + i % 5,
            REGIONS[i % REGIONS.len()],
            disease,
            i % 500,
            i % 7,
            20.0 + (i % 15) as f64,
            50 + i % 40,
            1.0 + (i % 6) as f64,
            100 + i % 900,
        ));
    }
    csv
}

/// Une feature carrée par région, alignées sur l'axe x
fn synthetic_regions() -> String {
    let features: Vec<String> = REGIONS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let x = i as f64;
            format!(
                r#"{{"type":"Feature","properties":{{"NOMREG":"{}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x},0],[{x1},0],[{x1},1],[{x},1],[{x},0]]]}}}}"#,
                name.to_uppercase(),
                x = x,
                x1 = x + 1.0,
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

fn synthetic_points(count: usize) -> String {
    let features: Vec<String> = (0..count)
        .map(|i| {
            let x = (i % (REGIONS.len() * 10)) as f64 / 10.0 + 0.05;
            let y = (i % 10) as f64 / 10.0 + 0.05;
            format!(
                r#"{{"type":"Feature","properties":{{"Structure":"Poste {}"}},"geometry":{{"type":"Point","coordinates":[{},{}]}}}}"#,
                i, x, y
            )
        })
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

fn regions_layer() -> AdminLayerConfig {
    AdminLayerConfig {
        name: "Régions".into(),
        path: "regions.geojson".into(),
        geometry_type: GeometryKind::Polygon,
        key_property: None,
        name_property: "NOMREG".into(),
        csv_join_column: Some("Region".into()),
    }
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for rows in [1_000usize, 10_000, 100_000] {
        let csv = synthetic_csv(rows);
        group.throughput(Throughput::Bytes(csv.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &csv, |b, csv| {
            b.iter(|| {
                let dataset = parse_bytes(black_box(csv.as_bytes()), IngestPolicy::Lenient)
                    .expect("synthetic CSV parses");
                black_box(dataset.records.len())
            })
        });
    }

    group.finish();
}

fn bench_filter_aggregate_join(c: &mut Criterion) {
    let dataset = parse_bytes(synthetic_csv(100_000).as_bytes(), IngestPolicy::Lenient)
        .expect("synthetic CSV parses");
    let collection = parse_feature_collection(&synthetic_regions(), "bench").expect("regions");
    let layer = regions_layer();
    let state = FilterState::new("2023", "Paludisme", "Tous");

    let mut group = c.benchmark_group("filter_aggregate_join");
    group.throughput(Throughput::Elements(dataset.records.len() as u64));

    group.bench_function("regions", |b| {
        b.iter(|| {
            let selected = filter(&dataset.records, black_box(&state));
            let metrics = aggregate_by_region(selected, "Region");
            let join = join_metrics_to_features(&metrics, &collection, &layer, Theme::Light)
                .expect("join");
            black_box(join.stats.matched)
        })
    });

    group.finish();
}

fn bench_count_within(c: &mut Criterion) {
    let collection = parse_feature_collection(&synthetic_regions(), "bench").expect("regions");
    let health = AdminLayerConfig {
        name: "Infrastructures".into(),
        path: "health.geojson".into(),
        geometry_type: GeometryKind::Point,
        key_property: None,
        name_property: "Structure".into(),
        csv_join_column: None,
    };
    let points = load_points(
        &parse_feature_collection(&synthetic_points(5_000), "points").expect("points"),
        &health,
    )
    .expect("points");
    let base = join_metrics_to_features(
        &Default::default(),
        &collection,
        &regions_layer(),
        Theme::Light,
    )
    .expect("join");

    let mut group = c.benchmark_group("count_within");
    group.sample_size(20);
    group.bench_function("5000_points", |b| {
        b.iter(|| {
            let mut join = base.clone();
            count_within(&mut join, black_box(&points));
            black_box(join.features.len())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_ingest,
    bench_filter_aggregate_join,
    bench_count_within
);
criterion_main!(benches);
