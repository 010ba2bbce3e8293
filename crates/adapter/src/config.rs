//! Game configuration from environment variables
//!
//! Engine parameters and driver pacing. Server settings live in
//! [`ServerConfig`](crate::server::ServerConfig).

use std::env;
use std::str::FromStr;

use crate::core::EngineConfig;
use crate::types::{REMOVE_PAUSE_MS, SETTLE_PAUSE_MS, SWAP_ANIMATION_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub engine: EngineConfig,
    /// Delay between an accepted swap and the first cascade step
    pub swap_ms: u32,
    /// Delay between cascade steps that removed tiles
    pub step_ms: u32,
    /// Delay before the quiescent step that reopens the gate
    pub settle_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            swap_ms: SWAP_ANIMATION_MS,
            step_ms: REMOVE_PAUSE_MS,
            settle_ms: SETTLE_PAUSE_MS,
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl GameConfig {
    /// Create from `MATCH3_*` environment variables; unset or unparsable values keep defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let engine = EngineConfig {
            width: parse_var("MATCH3_WIDTH").unwrap_or(defaults.engine.width),
            height: parse_var("MATCH3_HEIGHT").unwrap_or(defaults.engine.height),
            kind_count: parse_var("MATCH3_KINDS").unwrap_or(defaults.engine.kind_count),
            target_score: parse_var("MATCH3_TARGET").unwrap_or(defaults.engine.target_score),
            seed: parse_var("MATCH3_SEED"),
        };

        Self {
            engine,
            step_ms: parse_var("MATCH3_STEP_MS").unwrap_or(defaults.step_ms),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_pacing() {
        let config = GameConfig::default();
        assert_eq!(config.swap_ms, 200);
        assert_eq!(config.step_ms, 500);
        assert_eq!(config.settle_ms, 300);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_from_env_without_vars_is_valid() {
        // Only checks that whatever the environment holds parses without panicking
        let _config = GameConfig::from_env();
    }
}
