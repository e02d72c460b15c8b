//! Fixed-size tour populations.

use std::cmp::Ordering;

use rand::Rng;

use super::types::Tour;
use crate::cost::CostModel;
use crate::error::ConfigError;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One island's population of tours.
///
/// Never empty: both constructors reject a size of zero, so
/// [`argmin`](Self::argmin) and [`argmax`](Self::argmax) always have an
/// answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    tours: Vec<Tour>,
}

impl Population {
    /// Creates `size` random, evaluated tours over the cities of `cost`.
    pub fn random<C, R>(size: usize, cost: &C, rng: &mut R) -> Result<Self, ConfigError>
    where
        C: CostModel + ?Sized,
        R: Rng,
    {
        if size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        let n = cost.len();
        let tours = (0..size)
            .map(|_| {
                let mut t = Tour::new(n);
                t.randomize(rng);
                t.evaluate(cost);
                t
            })
            .collect();
        Ok(Self { tours })
    }

    /// Wraps existing tours as-is (fitness values are not recomputed).
    pub fn from_tours(tours: Vec<Tour>) -> Result<Self, ConfigError> {
        if tours.is_empty() {
            return Err(ConfigError::EmptyPopulation);
        }
        Ok(Self { tours })
    }

    /// Number of tours.
    pub fn len(&self) -> usize {
        self.tours.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    /// All tours, in current order.
    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    /// Tour at `idx`.
    pub fn get(&self, idx: usize) -> &Tour {
        &self.tours[idx]
    }

    /// Recomputes every cached fitness.
    pub fn evaluate<C: CostModel + ?Sized>(&mut self, cost: &C) {
        #[cfg(feature = "parallel")]
        self.tours.par_iter_mut().for_each(|t| {
            t.evaluate(cost);
        });

        #[cfg(not(feature = "parallel"))]
        for t in &mut self.tours {
            t.evaluate(cost);
        }
    }

    /// Stable ascending sort by fitness (best first).
    ///
    /// Equal fitness keeps the original relative order, which keeps elite
    /// selection reproducible. Ordering is IEEE total order, so a NaN
    /// fitness sorts after every number.
    pub fn sort_by_fitness(&mut self) {
        self.tours.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
    }

    /// Index of the first tour with the lowest fitness (same order as
    /// [`sort_by_fitness`](Self::sort_by_fitness)).
    pub fn argmin(&self) -> usize {
        let mut best = 0;
        for (i, t) in self.tours.iter().enumerate().skip(1) {
            if t.fitness.total_cmp(&self.tours[best].fitness) == Ordering::Less {
                best = i;
            }
        }
        best
    }

    /// Index of the first tour with the highest fitness.
    pub fn argmax(&self) -> usize {
        let mut worst = 0;
        for (i, t) in self.tours.iter().enumerate().skip(1) {
            if t.fitness.total_cmp(&self.tours[worst].fitness) == Ordering::Greater {
                worst = i;
            }
        }
        worst
    }

    /// The best tour.
    pub fn best(&self) -> &Tour {
        &self.tours[self.argmin()]
    }

    /// Mean cached fitness.
    pub fn mean_fitness(&self) -> f64 {
        self.tours.iter().map(|t| t.fitness).sum::<f64>() / self.tours.len() as f64
    }

    /// Swaps in a whole new generation.
    pub(crate) fn replace_all(&mut self, tours: Vec<Tour>) {
        debug_assert!(!tours.is_empty(), "population must not be empty");
        self.tours = tours;
    }

    /// Overwrites the tour at `idx` with `perm` and re-evaluates it.
    pub fn replace<C: CostModel + ?Sized>(&mut self, idx: usize, perm: &[usize], cost: &C) {
        let slot = &mut self.tours[idx];
        slot.perm.clear();
        slot.perm.extend_from_slice(perm);
        slot.evaluate(cost);
    }
}
