//! Elite migration between islands.
//!
//! One round, executed by every island at the same generation:
//!
//! 1. Evaluate and sort the local population, pack the top
//!    [`migration_elite_count`](GaParams::migration_elite_count) tours
//! 2. Gather all packs at [`MIGRATION_ROOT`]
//! 3. The root re-measures every candidate and keeps the shortest (first
//!    in rank order on ties)
//! 4. Broadcast the winner
//! 5. Every island overwrites its worst tour with the winner
//!
//! The round is a barrier: nobody leaves step 4 before everyone has
//! entered step 2.

use tracing::{debug, warn};

use super::comm::Communicator;
use crate::cost::CostModel;
use crate::error::CommError;
use crate::ga::operators::is_valid_permutation;
use crate::ga::{GaParams, Population};

/// Rank that selects the global best during migration.
pub const MIGRATION_ROOT: usize = 0;

/// Result of one migration round on one island.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MigrationOutcome {
    /// The global best replaced the local worst.
    Applied {
        /// Population index that was overwritten.
        replaced: usize,
        /// Fitness of the immigrant.
        fitness: f64,
    },
    /// No island offered a usable candidate; the population is unchanged.
    Skipped,
}

/// Runs one synchronous migration round.
///
/// An island that cannot allocate its send buffer still takes part in
/// every collective with an empty contribution, so the group never
/// deadlocks on a local allocation failure.
pub fn migrate<C, M>(
    population: &mut Population,
    cost: &C,
    params: &GaParams,
    comm: &mut M,
) -> Result<MigrationOutcome, CommError>
where
    C: CostModel + ?Sized,
    M: Communicator + ?Sized,
{
    let n = cost.len();

    population.evaluate(cost);
    population.sort_by_fitness();

    let k = params.migration_elite_count().min(population.len());
    let send = pack_elites(population, k, n).unwrap_or_else(|| {
        warn!(rank = comm.rank(), "migration buffer allocation failed; contributing nothing");
        Vec::new()
    });

    let mut winner = match comm.gather(&send, MIGRATION_ROOT)? {
        Some(blocks) => select_global_best(&blocks, n, cost).unwrap_or_default(),
        None => Vec::new(),
    };
    comm.broadcast(&mut winner, MIGRATION_ROOT)?;

    if winner.is_empty() || !is_valid_permutation(&winner, n) {
        if comm.rank() == MIGRATION_ROOT {
            warn!("migration round skipped: no candidates");
        }
        return Ok(MigrationOutcome::Skipped);
    }

    let worst = population.argmax();
    population.replace(worst, &winner, cost);
    let fitness = population.get(worst).fitness;

    if comm.rank() == MIGRATION_ROOT {
        debug!(fitness, "migrated global best");
    }

    Ok(MigrationOutcome::Applied {
        replaced: worst,
        fitness,
    })
}

/// Flattens the first `k` tours of a sorted population into one buffer.
///
/// `None` if the buffer cannot be allocated.
fn pack_elites(population: &Population, k: usize, n: usize) -> Option<Vec<usize>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(k.checked_mul(n)?).ok()?;
    for tour in &population.tours()[..k] {
        buf.extend_from_slice(&tour.perm);
    }
    Some(buf)
}

/// Picks the shortest valid candidate across all gathered packs.
///
/// Each pack is a concatenation of length-`n` permutations. Lengths are
/// recomputed from `cost`, never trusted from the sender. The first
/// candidate in gather order wins ties.
pub fn select_global_best<C: CostModel + ?Sized>(
    blocks: &[Vec<usize>],
    n: usize,
    cost: &C,
) -> Option<Vec<usize>> {
    if n == 0 {
        return None;
    }

    let mut best: Option<(&[usize], f64)> = None;
    for candidate in blocks.iter().flat_map(|b| b.chunks_exact(n)) {
        if !is_valid_permutation(candidate, n) {
            continue;
        }
        let length = cost.tour_length(candidate);
        if best.is_none_or(|(_, b)| length < b) {
            best = Some((candidate, length));
        }
    }
    best.map(|(perm, _)| perm.to_vec())
}
