//! Tour representation.
//!
//! A [`Tour`] is the individual of the GA: a permutation of city indices
//! with a cached closed-tour length. The cache is denormalised state; any
//! code that edits `perm` is responsible for calling
//! [`evaluate`](Tour::evaluate) before the fitness is read again.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::cost::CostModel;

/// A candidate closed tour.
///
/// Lower fitness is better (minimisation). A tour that has never been
/// evaluated carries `f64::INFINITY`, so it loses every comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tour {
    /// Visiting order; a permutation of `0..n` once the tour is trusted.
    pub perm: Vec<usize>,
    /// Cached closed-tour length.
    pub fitness: f64,
}

impl Tour {
    /// Creates an unevaluated tour over `n` cities.
    ///
    /// The permutation starts as the identity; call
    /// [`randomize`](Self::randomize) or overwrite `perm` before use.
    pub fn new(n: usize) -> Self {
        Self {
            perm: (0..n).collect(),
            fitness: f64::INFINITY,
        }
    }

    /// Wraps an existing permutation, leaving it unevaluated.
    pub fn from_perm(perm: Vec<usize>) -> Self {
        Self {
            perm,
            fitness: f64::INFINITY,
        }
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.perm.len()
    }

    /// Returns `true` for a zero-city tour.
    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    /// Resets to the identity and applies a uniform Fisher–Yates shuffle.
    ///
    /// Invalidates the cached fitness.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        for (i, v) in self.perm.iter_mut().enumerate() {
            *v = i;
        }
        self.perm.shuffle(rng);
        self.fitness = f64::INFINITY;
    }

    /// Recomputes the cached fitness. O(n).
    pub fn evaluate<C: CostModel + ?Sized>(&mut self, cost: &C) -> f64 {
        self.fitness = cost.tour_length(&self.perm);
        self.fitness
    }
}
