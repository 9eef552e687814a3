use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use casepat_rs::algorithms::embed::EncoderOptions;
use casepat_rs::{
    build_period_graphs, detect_patterns, normalize, CaseTable, GraphEncoder, PatternConfig,
    RecordCounter, TableSchema, Vocabulary,
};

const REGIONS: [&str; 6] = ["North", "South", "East", "West", "Centre", "Coast"];
const DIAGNOSES: [&str; 8] = ["FluA", "FluB", "FluC", "RSV", "Covid", "Strep", "Noro", "Measles"];
const AGES: [&str; 4] = ["0-4", "5-17", "18-64", "65+"];

/// Deterministic synthetic case table with `n` rows over 12 months; month 7
/// over-represents one region/diagnosis/age combination.
fn synthetic_table(n: usize) -> CaseTable {
    let mut t = CaseTable::new(["Month", "Region", "Diagnosis", "Age"]);
    for i in 0..n {
        let month = i % 12 + 1;
        let h = i.wrapping_mul(2_654_435_761) >> 7;
        let (region, diagnosis, age) = if month == 7 && h % 4 == 0 {
            ("Coast", "Noro", "65+")
        } else {
            (
                REGIONS[h % REGIONS.len()],
                DIAGNOSES[(h / 7) % DIAGNOSES.len()],
                AGES[(h / 61) % AGES.len()],
            )
        };
        t.push_row([month.to_string().as_str(), region, diagnosis, age])
            .expect("row width matches header");
    }
    t
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_patterns");
    group.sample_size(10);
    let schema = TableSchema::new("Month");
    let config = PatternConfig::new(10, 4);
    for n in [1_000, 5_000, 20_000] {
        let table = synthetic_table(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| detect_patterns(black_box(&table), &schema, &config))
        });
    }
    group.finish();
}

fn bench_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_counter");
    let table = synthetic_table(20_000);
    let obs = normalize(&table, &TableSchema::new("Month")).expect("valid table");
    let counter = RecordCounter::new(&obs);
    let pattern = ["Age==65+", "Diagnosis==Noro", "Region==Coast"];
    group.bench_function("support", |b| {
        b.iter(|| counter.support(black_box("7"), black_box(&pattern)))
    });
    group.bench_function("period_mean_sd_max", |b| {
        b.iter(|| counter.period_mean_sd_max(black_box(&pattern)))
    });
    group.finish();
}

fn bench_embedding(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_encoder");
    let table = synthetic_table(20_000);
    let obs = normalize(&table, &TableSchema::new("Month")).expect("valid table");
    let vocab = Vocabulary::from_observations(&obs);
    for config in [
        PatternConfig::default(),
        PatternConfig::default().with_laplacian(false),
    ] {
        let graphs = build_period_graphs(&obs, &vocab, &config);
        let encoder = GraphEncoder::from_vocabulary(&vocab, EncoderOptions::from(&config));
        let label = if config.laplacian_normalize {
            "laplacian"
        } else {
            "plain"
        };
        group.bench_function(label, |b| {
            b.iter(|| {
                for g in &graphs {
                    black_box(encoder.encode_graph(g));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_counter, bench_embedding);
criterion_main!(benches);
