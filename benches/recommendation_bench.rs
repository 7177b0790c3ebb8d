use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use filmrec::algorithms::{Deviations, RatingPredictor, RecommendationFilter, SlopeOne};
use filmrec::RatingMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn synthetic_matrix(users: i64, films: i64, ratings_per_user: usize) -> RatingMatrix {
    let mut rng = StdRng::seed_from_u64(42);
    (1..=users)
        .map(|user| {
            let ratings: HashMap<_, _> = (0..ratings_per_user)
                .map(|_| (rng.gen_range(1..=films), rng.gen_range(1..=10)))
                .collect();
            (user, ratings)
        })
        .collect()
}

fn benchmark_deviations(c: &mut Criterion) {
    let mut group = c.benchmark_group("slope_one_deviations");

    for ratings_per_user in [10usize, 50, 200] {
        let matrix = synthetic_matrix(500, 1000, ratings_per_user);
        group.bench_with_input(
            BenchmarkId::from_parameter(ratings_per_user),
            &matrix,
            |b, matrix| b.iter(|| black_box(Deviations::from_ratings(matrix))),
        );
    }

    group.finish();
}

fn benchmark_predict(c: &mut Criterion) {
    let matrix = synthetic_matrix(1000, 500, 30);

    c.bench_function("slope_one_predict", |b| {
        b.iter(|| black_box(SlopeOne.predict(&matrix, &1)));
    });

    let deviations = Deviations::from_ratings(&matrix);
    let own = matrix[&1].clone();
    c.bench_function("slope_one_predict_prebuilt", |b| {
        b.iter(|| black_box(deviations.predict_for(&own)));
    });
}

fn benchmark_recommend(c: &mut Criterion) {
    let matrix = synthetic_matrix(1000, 500, 30);
    let filter = RecommendationFilter::new(SlopeOne);
    let fallback: Vec<i64> = (1..=10).collect();

    c.bench_function("recommend", |b| {
        b.iter(|| black_box(filter.recommend(&matrix, &1, 5.0, &fallback)));
    });
}

criterion_group!(
    benches,
    benchmark_deviations,
    benchmark_predict,
    benchmark_recommend
);
criterion_main!(benches);
