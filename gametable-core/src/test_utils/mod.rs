//! Test utilities shared by unit and integration tests

pub mod deterministic_rng;
pub mod fixtures;

pub use deterministic_rng::*;
pub use fixtures::*;
