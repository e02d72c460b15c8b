//! Seeded random streams.
//!
//! Every island owns one generator, created here and passed by `&mut` into
//! each operator. Nothing in the crate touches a global RNG.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Offset between the seeds of consecutive island ranks.
///
/// Odd 64-bit golden-ratio constant: consecutive ranks land far apart in
/// seed space before `seed_from_u64` expands them.
const RANK_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Creates a deterministic generator from a 64-bit seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Derives the seed of island `rank` from the run's base seed.
///
/// Identical `(base_seed, rank)` pairs always yield identical streams;
/// distinct ranks under the same base seed never share a seed.
pub fn island_seed(base_seed: u64, rank: usize) -> u64 {
    base_seed.wrapping_add((rank as u64).wrapping_mul(RANK_SEED_STRIDE))
}
