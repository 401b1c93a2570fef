//! Deterministic RNG helpers for reproducible tests

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Default seed for deterministic tests
pub const DEFAULT_TEST_SEED: u64 = 42;

/// Create a deterministic RNG with the default seed
pub fn test_rng() -> StdRng {
    test_rng_with_seed(DEFAULT_TEST_SEED)
}

/// Create a deterministic RNG with a custom seed
pub fn test_rng_with_seed(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
