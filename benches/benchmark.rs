// Matching throughput over synthetic corpora
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use greenmatch::{codec, match_jobs, JobId, JobRecord, MatchConfig, Vector};
use rand::Rng;

const DIM: usize = 384;

fn generate_random_vector(dim: usize) -> Vector {
    let mut rng = rand::rng();
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Vector::new(data)
}

fn generate_corpus(size: usize, dim: usize) -> Vec<JobRecord> {
    (1..=size as u64)
        .map(|id| {
            JobRecord::new(format!("job {}", id), "synthetic posting")
                .with_id(JobId(id))
                .with_embedding(generate_random_vector(dim))
        })
        .collect()
}

fn benchmark_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_jobs");
    let query = generate_random_vector(DIM);

    for size in [100, 1_000, 10_000].iter() {
        let corpus = generate_corpus(*size, DIM);

        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, _| {
            let config = MatchConfig {
                parallel_threshold: usize::MAX,
                ..MatchConfig::default()
            };
            b.iter(|| black_box(match_jobs(&query, &corpus, &config)));
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, _| {
            let config = MatchConfig {
                parallel_threshold: 0,
                ..MatchConfig::default()
            };
            b.iter(|| black_box(match_jobs(&query, &corpus, &config)));
        });
    }

    group.finish();
}

fn benchmark_codec(c: &mut Criterion) {
    let vector = generate_random_vector(DIM);
    let blob = codec::encode(vector.as_slice());

    c.bench_function("codec_encode", |b| {
        b.iter(|| black_box(codec::encode(black_box(vector.as_slice()))))
    });
    c.bench_function("codec_decode", |b| {
        b.iter(|| black_box(codec::decode(black_box(&blob))))
    });
}

fn benchmark_cosine(c: &mut Criterion) {
    let a = generate_random_vector(DIM);
    let b_vec = generate_random_vector(DIM);

    c.bench_function("cosine_similarity", |b| {
        b.iter(|| black_box(a.cosine_similarity(black_box(&b_vec))))
    });
}

criterion_group!(benches, benchmark_match, benchmark_codec, benchmark_cosine);
criterion_main!(benches);
