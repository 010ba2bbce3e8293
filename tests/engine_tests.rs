//! Engine properties, checked as seeded loops

mod common;

use match_three::core::{BoardEngine, EngineConfig, SimpleRng, TapOutcome};
use match_three::types::{Position, SwapRejection, MAX_KIND_COUNT, POINTS_PER_TILE};

fn random_pos(rng: &mut SimpleRng, engine: &BoardEngine) -> Position {
    Position::new(
        rng.next_range(engine.board().width() as u32) as u8,
        rng.next_range(engine.board().height() as u32) as u8,
    )
}

fn random_neighbor(rng: &mut SimpleRng, engine: &BoardEngine, pos: Position) -> Option<Position> {
    let (w, h) = (engine.board().width(), engine.board().height());
    let candidates = [
        (pos.col.checked_sub(1), Some(pos.row)),
        (pos.col.checked_add(1).filter(|&c| c < w), Some(pos.row)),
        (Some(pos.col), pos.row.checked_sub(1)),
        (Some(pos.col), pos.row.checked_add(1).filter(|&r| r < h)),
    ];
    let valid: Vec<Position> = candidates
        .iter()
        .filter_map(|&(c, r)| Some(Position::new(c?, r?)))
        .collect();
    if valid.is_empty() {
        return None;
    }
    Some(valid[rng.next_range(valid.len() as u32) as usize])
}

#[test]
fn prop_initial_board_is_stable() {
    for seed in 1..200u32 {
        for &(width, height, kinds) in &[(8u8, 8u8, 4u8), (12, 5, 6), (5, 4, 3)] {
            let engine = BoardEngine::initialize(EngineConfig {
                width,
                height,
                kind_count: kinds,
                seed: Some(seed),
                ..EngineConfig::default()
            })
            .unwrap();
            assert!(engine.is_accepting_moves(), "seed {}", seed);
            assert!(engine.board().is_full(), "seed {}", seed);
            assert!(!engine.board().has_runs(), "seed {}", seed);
            assert_eq!(engine.score(), 0);
        }
    }
}

#[test]
fn prop_same_seed_same_game() {
    for seed in 1..50u32 {
        let mut a = BoardEngine::initialize(common::config(seed, u32::MAX)).unwrap();
        let mut b = BoardEngine::initialize(common::config(seed, u32::MAX)).unwrap();
        assert_eq!(a.board(), b.board());

        let (p, q) = (Position::new(3, 3), Position::new(4, 3));
        assert_eq!(a.attempt_swap(p, q), b.attempt_swap(p, q));
        assert_eq!(a.resolve_cascade().unwrap(), b.resolve_cascade().unwrap());
        assert_eq!(a.snapshot(), b.snapshot());
    }
}

#[test]
fn prop_swap_conserves_kinds() {
    let mut rng = SimpleRng::new(77);
    for seed in 1..100u32 {
        let mut engine = BoardEngine::initialize(common::config(seed, u32::MAX)).unwrap();
        let before = engine.board().kind_counts();
        let a = random_pos(&mut rng, &engine);
        let Some(b) = random_neighbor(&mut rng, &engine, a) else {
            continue;
        };
        assert!(engine.attempt_swap(a, b).accepted);
        assert_eq!(engine.board().kind_counts(), before);
    }
}

#[test]
fn prop_cascade_step_invariants() {
    let mut rng = SimpleRng::new(2024);
    for seed in 1..60u32 {
        let mut engine = BoardEngine::initialize(common::config(seed, u32::MAX)).unwrap();

        for _ in 0..10 {
            let a = random_pos(&mut rng, &engine);
            let Some(b) = random_neighbor(&mut rng, &engine, a) else {
                break;
            };
            assert!(engine.attempt_swap(a, b).accepted);

            loop {
                let board_before = engine.board().clone();
                let score_before = engine.score();
                let step = engine.step_cascade().unwrap();

                // Score never decreases and moves by exactly the step's delta
                assert_eq!(engine.score(), score_before + step.score_delta);
                assert_eq!(step.score_delta % POINTS_PER_TILE, 0);

                if step.quiescent {
                    assert!(step.runs.is_empty());
                    assert!(step.removed.is_empty());
                    assert_eq!(step.score_delta, 0);
                    assert_eq!(engine.board(), &board_before);
                    break;
                }

                // Every removed cell was refilled by a spawn
                assert_eq!(step.removed.len(), step.spawned.len());
                let run_tiles: u32 = step.runs.iter().map(|r| r.len as u32).sum();
                assert_eq!(step.score_delta, run_tiles * POINTS_PER_TILE);
                assert!(step.removed.len() as u32 <= run_tiles);

                // Kind counts: before - removed + spawned
                let mut expected = board_before.kind_counts();
                for &pos in &step.removed {
                    let kind = board_before.kind_at(pos).unwrap();
                    expected[kind.index()] -= 1;
                }
                for spawn in &step.spawned {
                    expected[spawn.kind.index()] += 1;
                }
                assert_eq!(engine.board().kind_counts(), expected);
                assert_eq!(expected.len(), MAX_KIND_COUNT as usize);

                // Falls only move tiles down within a column
                assert!(step
                    .fallen
                    .iter()
                    .all(|f| f.from.col == f.to.col && f.to.row > f.from.row));

                assert!(engine.board().is_full());
                engine.board().check_gravity().unwrap();
                assert!(!engine.is_accepting_moves());
            }

            assert!(engine.is_accepting_moves());
            assert!(!engine.board().has_runs());
        }
    }
}

#[test]
fn prop_non_adjacent_swaps_never_change_board() {
    let mut rng = SimpleRng::new(5);
    let mut engine = BoardEngine::initialize(common::config(31, u32::MAX)).unwrap();
    for _ in 0..500 {
        let a = random_pos(&mut rng, &engine);
        let b = random_pos(&mut rng, &engine);
        if a == b || a.is_adjacent(b) {
            continue;
        }
        let before = engine.board().clone();
        let result = engine.attempt_swap(a, b);
        assert!(!result.accepted);
        assert_eq!(result.reason, Some(SwapRejection::NotAdjacent));
        assert_eq!(engine.board(), &before);
        assert!(engine.is_accepting_moves());
    }
}

#[test]
fn prop_out_of_bounds_rejected() {
    let mut engine = BoardEngine::initialize(common::config(8, u32::MAX)).unwrap();
    let before = engine.board().clone();
    for &(a, b) in &[
        (Position::new(7, 0), Position::new(8, 0)),
        (Position::new(0, 7), Position::new(0, 8)),
        (Position::new(200, 200), Position::new(200, 201)),
    ] {
        assert_eq!(
            engine.attempt_swap(a, b).reason,
            Some(SwapRejection::OutOfBounds)
        );
    }
    assert_eq!(
        engine.select_tile(Position::new(9, 9)),
        TapOutcome::Rejected(SwapRejection::OutOfBounds)
    );
    assert_eq!(engine.board(), &before);
}

#[test]
fn prop_quiescent_step_is_idempotent() {
    for seed in 1..30u32 {
        let mut engine = BoardEngine::initialize(common::config(seed, u32::MAX)).unwrap();
        let before = engine.snapshot();
        for _ in 0..3 {
            let step = engine.step_cascade().unwrap();
            assert!(step.quiescent);
            assert!(!step.game_won);
        }
        assert_eq!(engine.snapshot(), before);
    }
}

#[test]
fn prop_random_taps_keep_selection_consistent() {
    let mut rng = SimpleRng::new(99);
    let mut engine = BoardEngine::initialize(common::config(4, u32::MAX)).unwrap();

    for _ in 0..400 {
        let pos = random_pos(&mut rng, &engine);
        let previous = engine.selected();
        match engine.select_tile(pos) {
            TapOutcome::Selected(p) => {
                assert_eq!(previous, None);
                assert_eq!(engine.selected(), Some(p));
            }
            TapOutcome::Deselected => {
                assert_eq!(previous, Some(pos));
                assert_eq!(engine.selected(), None);
            }
            TapOutcome::Reselected(p) => {
                assert_eq!(engine.selected(), Some(p));
            }
            TapOutcome::Swapped => {
                assert!(previous.unwrap().is_adjacent(pos));
                assert_eq!(engine.selected(), None);
                engine.resolve_cascade().unwrap();
            }
            TapOutcome::Rejected(reason) => panic!("unexpected rejection {:?}", reason),
        }
        assert!(engine.is_accepting_moves());
    }
}
