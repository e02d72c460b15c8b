//! Parent selection.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Miller & Goldberg (1995), "Genetic Algorithms, Tournament Selection,
//!   and the Effects of Noise"

use rand::Rng;

use super::types::Tour;

/// Tournament selection: draw `k` indices uniformly **with replacement**
/// and return the one with the lowest fitness.
///
/// - k=1: uniform random choice, no selection pressure
/// - k=2–4: moderate pressure (typical)
/// - larger k: strong pressure, faster takeover
///
/// Works on any ordering of `tours`; the first drawn index wins ties.
///
/// # Complexity
/// O(k)
///
/// # Panics
/// Panics if `tours` is empty.
pub fn tournament_select<R: Rng>(tours: &[Tour], k: usize, rng: &mut R) -> usize {
    assert!(!tours.is_empty(), "cannot select from empty population");

    let k = k.max(1);
    let n = tours.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if tours[idx].fitness < tours[best_idx].fitness {
            best_idx = idx;
        }
    }
    best_idx
}
