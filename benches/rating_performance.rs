//! Performance benchmarks for rating calculations and game submission

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use podium::identity::TimeOrderedIdGenerator;
use podium::metrics::MetricsCollector;
use podium::rating::{compute_updated_ratings, MultiEloCalculator, PlacementEntry, RatingCalculator};
use podium::types::{GameSubmission, SeasonConfig, SubmittedResult};
use podium::{InMemoryStorage, LedgerService};
use std::sync::Arc;

fn bench_entries(players: usize) -> Vec<PlacementEntry> {
    (0..players)
        .map(|i| {
            PlacementEntry::new(
                format!("player#{}", i),
                i as u32 + 1,
                1100 + (i as i64 * 37) % 250,
            )
        })
        .collect()
}

fn create_bench_ledger() -> LedgerService {
    LedgerService::new(
        Arc::new(InMemoryStorage::new()),
        Arc::new(TimeOrderedIdGenerator::new()),
        SeasonConfig::default(),
        Arc::new(MetricsCollector::new().unwrap()),
    )
}

fn bench_rating_calculations(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_updated_ratings");

    for players in [2usize, 4, 8, 16] {
        let entries = bench_entries(players);
        group.bench_with_input(BenchmarkId::from_parameter(players), &entries, |b, entries| {
            b.iter(|| black_box(compute_updated_ratings(entries, 32.0, 400.0)))
        });
    }

    group.finish();
}

fn bench_calculator(c: &mut Criterion) {
    let calculator = MultiEloCalculator::for_season(&SeasonConfig::default()).unwrap();
    let entries = bench_entries(4);

    c.bench_function("multi_elo_calculator_4_players", |b| {
        b.iter(|| black_box(calculator.calculate_rating_changes(&entries)))
    });
}

fn bench_submit_game(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = create_bench_ledger();
    let season = rt
        .block_on(ledger.create_season("Bench", None))
        .unwrap();

    c.bench_function("submit_game_new_players", |b| {
        b.iter(|| {
            rt.block_on(async {
                let submission = GameSubmission {
                    season_id: season.id.clone(),
                    results: vec![
                        SubmittedResult::unknown("Ann", 1),
                        SubmittedResult::unknown("Ben", 2),
                        SubmittedResult::unknown("Cal", 3),
                        SubmittedResult::unknown("Dee", 4),
                    ],
                };

                black_box(ledger.submit_game(submission).await)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_rating_calculations,
    bench_calculator,
    bench_submit_game
);
criterion_main!(benches);
