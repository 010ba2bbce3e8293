//! Core game logic - the match-3 board engine
//!
//! This crate owns the tile grid and every rule that changes it. It has
//! **zero dependencies** on rendering, input devices, or networking:
//!
//! - **Deterministic**: the same seed produces the same boards and spawns
//! - **Testable**: every rule is reachable through [`BoardEngine`]
//! - **Headless**: timing belongs to the caller, not the engine
//!
//! # Module Structure
//!
//! - [`board`]: tile grid, run detection, removal, gravity and refill
//! - [`engine`]: swap validation, cascade stepping, scoring and win state
//! - `gate`: the interaction gate and tap-tap selection
//! - [`rng`]: LCG-driven kind generation
//! - [`scoring`]: points per run and per cascade step
//! - [`snapshot`]: owned read-only views for presentation and adapters
//! - [`error`]: internal contract violations
//!
//! # Game Rules
//!
//! - **Runs**: three or more same-kind tiles in a row or column
//! - **Swaps**: any two edge-adjacent tiles while the gate is open; a swap
//!   that creates no run is still kept
//! - **Cascades**: remove every run, let tiles fall, spawn new tiles on top,
//!   and repeat until no run remains
//! - **Scoring**: 10 points per tile per run, so a tile shared by two runs
//!   scores twice
//! - **Win**: reaching the target score ends the game once the cascade settles
//!
//! # Example
//!
//! ```
//! use match_three_core::{BoardEngine, EngineConfig};
//! use match_three_core::types::Position;
//!
//! let config = EngineConfig { seed: Some(12345), ..EngineConfig::default() };
//! let mut engine = BoardEngine::initialize(config).unwrap();
//! assert!(engine.is_accepting_moves());
//!
//! let result = engine.attempt_swap(Position::new(0, 0), Position::new(1, 0));
//! assert!(result.accepted);
//! assert!(!engine.is_accepting_moves());
//!
//! let steps = engine.resolve_cascade().unwrap();
//! assert!(steps.last().unwrap().quiescent);
//! assert!(engine.is_accepting_moves());
//! ```
//!
//! # Timing
//!
//! [`BoardEngine::step_cascade`] performs one observable step. A presentation
//! layer waits between steps using the pacing constants in
//! `match_three_types`; the engine never sleeps.

pub mod board;
pub mod engine;
pub mod error;
mod gate;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use match_three_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, Run};
pub use engine::{BoardEngine, EngineConfig, SwapResult, TapOutcome};
pub use error::EngineError;
pub use rng::SimpleRng;
pub use scoring::{run_score, step_score};
pub use snapshot::{BoardSnapshot, CascadeStep, Fall, GameSnapshot, Spawn};
