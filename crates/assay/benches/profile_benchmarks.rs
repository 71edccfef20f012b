//! Field profiling benchmarks.
//!
//! Measures metric computation, classification and full field profiles
//! across sample sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use assay::dictionary::DictionaryCatalog;
use assay::inference::{looks_like_geometry, FieldProfiler, MetricCalculator};
use assay::input::{FieldSample, Parser};
use assay::{DatasetPredicates, FieldDescriptor, FieldType, RawValue, RecommendationEngine};

const STREETS: &[&str] = &["ул. Ленина", "проспект Мира", "Садовая улица", "пер. Гончарный"];
const CITIES: &[&str] = &["Москва", "г. Казань", "Санкт-Петербург", "Тула"];

/// Synthetic free-text address column.
fn address_sample(rows: usize) -> FieldSample {
    FieldSample::new(
        (0..rows)
            .map(|i| match i % 7 {
                0 => RawValue::Null,
                _ => RawValue::text(format!(
                    "{}, {}, д. {}",
                    CITIES[i % CITIES.len()],
                    STREETS[i % STREETS.len()],
                    i % 120 + 1
                )),
            })
            .collect(),
    )
}

/// Synthetic WKT point column, mostly inside the default extent.
fn geometry_sample(rows: usize) -> FieldSample {
    FieldSample::new(
        (0..rows)
            .map(|i| {
                let x = 30.0 + (i % 500) as f64 * 0.1;
                let y = 50.0 + (i % 200) as f64 * 0.1;
                RawValue::text(format!("POINT({:.4} {:.4})", x, y))
            })
            .collect(),
    )
}

fn generate_csv(rows: usize) -> String {
    let mut data = String::from("id;address;x;y\n");
    for i in 0..rows {
        data.push_str(&format!(
            "{};\"{}, {}, д. {}\";{:.5};{:.5}\n",
            i,
            CITIES[i % CITIES.len()],
            STREETS[i % STREETS.len()],
            i % 90 + 1,
            37.0 + i as f64 * 0.0001,
            55.0 + i as f64 * 0.0001
        ));
    }
    data
}

/// Benchmark metrics of a string field.
fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    let calculator = MetricCalculator::new();
    let descriptor = FieldDescriptor::new("address", FieldType::String);

    for rows in [100, 1_000, 10_000].iter() {
        let sample = address_sample(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &sample, |b, sample| {
            b.iter(|| black_box(calculator.compute(&descriptor, sample)))
        });
    }

    group.finish();
}

/// Benchmark full profiles, including classification.
fn bench_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile");
    let profiler = FieldProfiler::new().unwrap();
    let address = FieldDescriptor::new("address", FieldType::String);
    let geom = FieldDescriptor::new("geom", FieldType::Geometry);
    let siblings = vec![address.clone(), geom.clone()];

    for rows in [1_000, 10_000].iter() {
        let sample = address_sample(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("address", rows), &sample, |b, sample| {
            b.iter(|| black_box(profiler.profile(&address, sample, &siblings)))
        });

        let sample = geometry_sample(*rows);
        group.bench_with_input(BenchmarkId::new("geometry", rows), &sample, |b, sample| {
            b.iter(|| black_box(profiler.profile(&geom, sample, &siblings)))
        });
    }

    group.finish();
}

/// Benchmark geometry text detection.
fn bench_geometry_detection(c: &mut Criterion) {
    let dictionary = DictionaryCatalog::builtin();
    let inputs = [
        "POINT(37.6 55.7)",
        "SRID=4326;MULTIPOLYGON(((30 20, 45 40, 10 40, 30 20)))",
        r#"{"type": "Point", "coordinates": [37.6, 55.7]}"#,
        "Москва, ул. Ленина, д. 1",
    ];

    c.bench_function("looks_like_geometry", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(looks_like_geometry(input, dictionary));
            }
        })
    });
}

/// Benchmark delimited file parsing.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_csv");
    let parser = Parser::new();

    for rows in [1_000, 10_000].iter() {
        let data = generate_csv(*rows);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter(|| black_box(parser.parse_bytes(data.as_bytes(), b';').unwrap()))
        });
    }

    group.finish();
}

fn bench_recommend(c: &mut Criterion) {
    c.bench_function("recommend_all_combinations", |b| {
        b.iter(|| {
            for bits in 0u8..128 {
                let p = DatasetPredicates {
                    has_address_features: bits & 1 != 0,
                    has_geometry_features: bits & 2 != 0,
                    has_address: bits & 4 != 0,
                    has_geometry: bits & 8 != 0,
                    is_connected: bits & 16 != 0,
                    is_enriched: bits & 32 != 0,
                    is_published: bits & 64 != 0,
                };
                black_box(RecommendationEngine::recommend(&p));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_metrics,
    bench_profile,
    bench_geometry_detection,
    bench_parse,
    bench_recommend,
);
criterion_main!(benches);
