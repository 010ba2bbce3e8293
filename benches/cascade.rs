use criterion::{black_box, criterion_group, criterion_main, Criterion};
use match_three::core::{Board, BoardEngine, EngineConfig, SimpleRng};
use match_three::types::Position;

fn config(seed: u32) -> EngineConfig {
    EngineConfig {
        seed: Some(seed),
        target_score: u32::MAX,
        ..EngineConfig::default()
    }
}

fn bench_find_runs(c: &mut Criterion) {
    let mut rng = SimpleRng::new(12345);
    let board = Board::filled(8, 8, &mut rng, 4);

    c.bench_function("find_runs_8x8", |b| {
        b.iter(|| black_box(board.find_runs()))
    });
}

fn bench_initialize(c: &mut Criterion) {
    let mut seed = 0u32;
    c.bench_function("initialize_8x8", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(BoardEngine::initialize(config(seed)).ok())
        })
    });
}

fn bench_swap_and_resolve(c: &mut Criterion) {
    let mut engine = BoardEngine::initialize(config(12345)).unwrap();
    let (a, b) = (Position::new(3, 3), Position::new(4, 3));

    c.bench_function("swap_and_resolve", |bench| {
        bench.iter(|| {
            engine.attempt_swap(a, b);
            black_box(engine.resolve_cascade().ok())
        })
    });
}

criterion_group!(
    benches,
    bench_find_runs,
    bench_initialize,
    bench_swap_and_resolve
);
criterion_main!(benches);
