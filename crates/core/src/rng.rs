//! RNG module - deterministic kind generation
//!
//! A simple LCG drives every random choice the engine makes (initial fill,
//! repaints, and spawned tiles), so the same seed replays the same game.

use crate::types::Kind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Create an RNG seeded from OS entropy, returning the seed used
    pub fn from_entropy() -> (Self, u32) {
        let seed: u32 = rand::random();
        (Self::new(seed), seed)
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // High bits of an LCG are far better distributed than the low ones.
        (self.next_u32() >> 16) % max
    }

    /// Uniformly random kind from a palette of `kind_count`
    pub fn next_kind(&mut self, kind_count: u8) -> Kind {
        Kind(self.next_range(kind_count as u32) as u8)
    }

    /// Uniformly random kind different from `current`
    ///
    /// Redraws at most `max_redraws` times; returns `None` if every draw
    /// came back equal to `current`.
    pub fn next_kind_except(
        &mut self,
        current: Kind,
        kind_count: u8,
        max_redraws: u32,
    ) -> Option<Kind> {
        for _ in 0..max_redraws {
            let kind = self.next_kind(kind_count);
            if kind != current {
                return Some(kind);
            }
        }
        None
    }

    /// Current RNG state (for restarting a game from where this one left off)
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        // Same seed should produce same sequence
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(54321);

        assert_ne!(rng1.next_u32(), rng2.next_u32());
    }

    #[test]
    fn test_zero_seed_is_remapped() {
        let mut zero = SimpleRng::new(0);
        let mut one = SimpleRng::new(1);
        assert_eq!(zero.next_u32(), one.next_u32());
    }

    #[test]
    fn test_next_kind_in_palette() {
        let mut rng = SimpleRng::new(7);
        let mut seen = [false; 4];
        for _ in 0..400 {
            let k = rng.next_kind(4);
            assert!(k.0 < 4);
            seen[k.index()] = true;
        }
        // Every kind should show up over 400 draws
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_next_kind_except_never_returns_current() {
        let mut rng = SimpleRng::new(99);
        for i in 0..200u32 {
            let current = Kind((i % 4) as u8);
            let k = rng.next_kind_except(current, 4, 64).unwrap();
            assert_ne!(k, current);
        }
    }

    #[test]
    fn test_next_kind_except_exhausts_on_single_kind_palette() {
        let mut rng = SimpleRng::new(3);
        assert_eq!(rng.next_kind_except(Kind(0), 1, 16), None);
    }
}
