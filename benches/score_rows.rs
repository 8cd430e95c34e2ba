use criterion::{criterion_group, criterion_main, Criterion};
use nerscore::{score, Delimiter, ScorerConfig, ScorerConfigBuilder};
use pprof::criterion::{Output, PProfProfiler};

const VOCABULARY: [&str; 12] = [
    "fever",
    "cough",
    "chest",
    "pain",
    "blood",
    "pressure",
    "nausea",
    "headache",
    "glasgow",
    "coma",
    "score",
    "oxygen",
];

/// Deterministic rows of `width` words, the gold cell being shifted by one word from the output
/// cell so roughly half of the tokens match.
fn build_rows(n_rows: usize, width: usize, separator: &str) -> (Vec<String>, Vec<String>) {
    let cell = |offset: usize| -> String {
        (0..width)
            .map(|i| VOCABULARY[(offset + i) % VOCABULARY.len()])
            .collect::<Vec<_>>()
            .join(separator)
    };
    let outputs = (0..n_rows).map(|row| cell(row)).collect();
    let golds = (0..n_rows).map(|row| cell(row + 1)).collect();
    (outputs, golds)
}

fn run(c: &mut Criterion, name: &str, n_rows: usize, config: ScorerConfig, separator: &str) {
    let (outputs, golds) = build_rows(n_rows, 8, separator);
    c.bench_function(name, |b| {
        b.iter(|| score(&outputs, &golds, &config).unwrap().aggregate())
    });
}

fn benchmark_small_dataset(c: &mut Criterion) {
    run(c, "small_dataset_scores", 100, ScorerConfig::default(), " ");
}

fn benchmark_big_dataset(c: &mut Criterion) {
    run(c, "big_dataset_scores", 20_000, ScorerConfig::default(), " ");
}

fn benchmark_big_dataset_parallel(c: &mut Criterion) {
    let config = ScorerConfigBuilder::new().parallel(true).build();
    run(c, "big_dataset_scores_parallel", 20_000, config, " ");
}

fn benchmark_big_dataset_comma(c: &mut Criterion) {
    let config = ScorerConfigBuilder::new()
        .phrase_delimiter(Delimiter::Char(','))
        .build();
    run(c, "big_dataset_scores_comma", 20_000, config, ", ");
}

criterion_group!(
    name=score_benches;
    config = Criterion::default().sample_size(100).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets = benchmark_small_dataset,
    benchmark_big_dataset,
    benchmark_big_dataset_parallel,
    benchmark_big_dataset_comma
);
criterion_main!(score_benches);
