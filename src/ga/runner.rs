//! Generation step.
//!
//! [`evolve_generation`] turns one population into the next:
//! evaluate → sort → hard elites → (select → PMX → mutate → repair →
//! evaluate → optional 2-opt) for every other slot → replace.

use rand::Rng;

use super::config::GaParams;
use super::local_search::two_opt;
use super::operators::{pmx_crossover, repair, Repair};
use super::population::Population;
use super::selection::tournament_select;
use super::types::Tour;
use crate::cost::CostModel;

/// Counters for one generation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepStats {
    /// Children produced by PMX (the rest are parent clones).
    pub crossovers: usize,
    /// Children the mutation operator fired on.
    pub mutations: usize,
    /// Children discarded and reshuffled by the repair path.
    pub repairs: usize,
    /// Improving 2-opt moves applied across the near-elite band.
    pub two_opt_moves: usize,
}

/// Replaces `population` with its offspring (elitist µ+λ).
///
/// 1. Evaluate and stably sort, best first
/// 2. Copy the top [`effective_elite_count`](GaParams::effective_elite_count) tours verbatim
/// 3. Fill every other slot with a tournament-selected, PMX-recombined,
///    mutated, repaired and evaluated child; slots below
///    [`local_search_limit`](GaParams::local_search_limit) are refined by 2-opt
/// 4. Swap in the new population
///
/// The best fitness never increases across a call.
pub fn evolve_generation<C, R>(
    population: &mut Population,
    cost: &C,
    params: &GaParams,
    rng: &mut R,
) -> StepStats
where
    C: CostModel + ?Sized,
    R: Rng,
{
    population.evaluate(cost);
    population.sort_by_fitness();

    let n = cost.len();
    let size = population.len();
    let elites = params.effective_elite_count();
    let ls_limit = params.local_search_limit();
    let parents = population.tours();

    let mut stats = StepStats::default();
    let mut next: Vec<Tour> = Vec::with_capacity(size);
    next.extend_from_slice(&parents[..elites]);

    for slot in elites..size {
        let p1 = &parents[tournament_select(parents, params.tournament_size, rng)].perm;
        let p2 = &parents[tournament_select(parents, params.tournament_size, rng)].perm;

        let mut perm = if rng.random_range(0.0..1.0) < params.crossover_rate {
            stats.crossovers += 1;
            pmx_crossover(p1, p2, rng)
        } else {
            p1.clone()
        };

        if params.mutation.apply(&mut perm, params.mutation_rate, rng) {
            stats.mutations += 1;
        }

        if repair(&mut perm, p1, n, rng) == Repair::Reshuffled {
            stats.repairs += 1;
        }

        let mut child = Tour::from_perm(perm);
        child.evaluate(cost);

        if slot < ls_limit {
            stats.two_opt_moves += two_opt(&mut child, cost);
        }

        next.push(child);
    }

    population.replace_all(next);
    stats
}

// ============================================================================
// Tests
// ============================================================================
