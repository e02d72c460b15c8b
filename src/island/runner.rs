//! Island coordinator.
//!
//! [`IslandRunner`] drives one island through the whole run: random
//! initial population, `generations` calls to
//! [`evolve_generation`](crate::ga::evolve_generation), a migration round
//! every `migration_interval` generations, and a final MINLOC reduction
//! plus broadcast so every island returns the same [`BestResult`].
//!
//! [`run_islands`] runs a whole group on scoped threads of the current
//! process.

use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info};

use super::comm::{Communicator, LocalGroup};
use super::migration::{migrate, MigrationOutcome};
use crate::cost::CostModel;
use crate::error::IslandError;
use crate::ga::{evolve_generation, GaParams, Population, StepStats};
use crate::random::{create_rng, island_seed};

/// Best tour of the whole run, identical on every island.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BestResult {
    /// Visiting order.
    pub perm: Vec<usize>,
    /// Closed-tour length, recomputed from `perm`.
    pub fitness: f64,
}

/// Progress snapshot emitted after every generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// Island that produced the snapshot.
    pub rank: usize,
    /// 1-based generation index.
    pub generation: usize,
    /// Best fitness in the population after the generation (and migration).
    pub best_fitness: f64,
    /// Mean fitness in the population.
    pub mean_fitness: f64,
    /// Operator counters for this generation.
    pub step: StepStats,
    /// Migration outcome, if a round ran this generation.
    pub migration: Option<MigrationOutcome>,
}

/// What one island returns at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandReport {
    /// Island rank.
    pub rank: usize,
    /// Global best across all islands.
    pub best: BestResult,
    /// This island's own best before the final reduction.
    pub local_best: BestResult,
    /// Generations executed.
    pub generations: usize,
    /// Migration rounds that replaced a tour.
    pub migrations_applied: usize,
    /// Migration rounds skipped for lack of candidates.
    pub migrations_skipped: usize,
    /// Best local fitness: initial population, then after every generation.
    pub fitness_history: Vec<f64>,
    /// Wall-clock time of the evolutionary loop (excludes the final reduction).
    pub elapsed: Duration,
}

/// One island's private state: population and random stream.
#[derive(Debug, Clone)]
pub struct Island {
    rank: usize,
    population: Population,
    rng: StdRng,
}

impl Island {
    /// Seeds the island's stream from `(params.seed, rank)` and draws a
    /// random, evaluated population.
    pub fn new<C: CostModel + ?Sized>(
        cost: &C,
        params: &GaParams,
        rank: usize,
    ) -> Result<Self, IslandError> {
        params.validate()?;
        if cost.is_empty() {
            return Err(IslandError::EmptyCostModel);
        }
        let mut rng = create_rng(island_seed(params.seed, rank));
        let population = Population::random(params.population_size, cost, &mut rng)?;
        Ok(Self {
            rank,
            population,
            rng,
        })
    }

    /// Island rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Current population.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Advances one generation.
    pub fn evolve<C: CostModel + ?Sized>(&mut self, cost: &C, params: &GaParams) -> StepStats {
        evolve_generation(&mut self.population, cost, params, &mut self.rng)
    }

    /// Runs one migration round with the island's peers.
    pub fn migrate<C, M>(
        &mut self,
        cost: &C,
        params: &GaParams,
        comm: &mut M,
    ) -> Result<MigrationOutcome, IslandError>
    where
        C: CostModel + ?Sized,
        M: Communicator + ?Sized,
    {
        Ok(migrate(&mut self.population, cost, params, comm)?)
    }
}

/// Executes the island-model GA on one participant of a group.
///
/// # Usage
///
/// ```
/// use u_tsp_island::cost::DistanceMatrix;
/// use u_tsp_island::ga::GaParams;
/// use u_tsp_island::island::{IslandRunner, SoloComm};
///
/// let cost = DistanceMatrix::euclidean(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
/// let params = GaParams::fast().with_population_size(10).with_generations(10);
/// let report = IslandRunner::run(&cost, &params, &mut SoloComm).unwrap();
/// assert!((report.best.fitness - 4.0).abs() < 1e-9);
/// ```
pub struct IslandRunner;

impl IslandRunner {
    /// Runs to completion and returns this island's report.
    ///
    /// Parameters are validated before any collective is issued, so a bad
    /// configuration fails identically and immediately on every island.
    pub fn run<C, M>(cost: &C, params: &GaParams, comm: &mut M) -> Result<IslandReport, IslandError>
    where
        C: CostModel + ?Sized,
        M: Communicator + ?Sized,
    {
        Self::run_with_progress(cost, params, comm, |_| {})
    }

    /// Like [`run`](Self::run), calling `progress` after every generation.
    ///
    /// The callback only observes; it cannot alter the run.
    pub fn run_with_progress<C, M, F>(
        cost: &C,
        params: &GaParams,
        comm: &mut M,
        mut progress: F,
    ) -> Result<IslandReport, IslandError>
    where
        C: CostModel + ?Sized,
        M: Communicator + ?Sized,
        F: FnMut(&GenerationStats),
    {
        let rank = comm.rank();
        let _span = tracing::debug_span!("island", rank).entered();

        let mut island = Island::new(cost, params, rank)?;

        if rank == 0 {
            info!(
                islands = comm.size(),
                cities = cost.len(),
                population = params.population_size,
                generations = params.generations,
                two_opt = params.local_search,
                migration_interval = params.migration_interval,
                "starting island run"
            );
        }

        let mut fitness_history = Vec::with_capacity(params.generations + 1);
        fitness_history.push(island.population().best().fitness);
        let mut migrations_applied = 0usize;
        let mut migrations_skipped = 0usize;

        let start = Instant::now();

        for gen in 1..=params.generations {
            let step = island.evolve(cost, params);

            let migration = if params.migration_interval > 0 && gen % params.migration_interval == 0 {
                let outcome = island.migrate(cost, params, comm)?;
                match outcome {
                    MigrationOutcome::Applied { .. } => migrations_applied += 1,
                    MigrationOutcome::Skipped => migrations_skipped += 1,
                }
                Some(outcome)
            } else {
                None
            };

            let best_fitness = island.population().best().fitness;
            fitness_history.push(best_fitness);

            progress(&GenerationStats {
                rank,
                generation: gen,
                best_fitness,
                mean_fitness: island.population().mean_fitness(),
                step,
                migration,
            });

            if rank == 0 && gen % 10 == 0 {
                debug!(generation = gen, best = best_fitness, "progress");
            }
        }

        let elapsed = start.elapsed();

        let local = island.population().best();
        let local_best = BestResult {
            perm: local.perm.clone(),
            fitness: local.fitness,
        };

        let (_, owner) = comm.all_reduce_min_loc(local_best.fitness)?;
        let mut perm = if rank == owner {
            local_best.perm.clone()
        } else {
            Vec::new()
        };
        comm.broadcast(&mut perm, owner)?;
        let fitness = cost.tour_length(&perm);

        if rank == 0 {
            info!(
                best = fitness,
                owner,
                elapsed_ms = elapsed.as_millis() as u64,
                "island run finished"
            );
        }

        Ok(IslandReport {
            rank,
            best: BestResult { perm, fitness },
            local_best,
            generations: params.generations,
            migrations_applied,
            migrations_skipped,
            fitness_history,
            elapsed,
        })
    }
}

/// Runs `islands` islands on scoped threads and returns their reports in
/// rank order.
pub fn run_islands<C>(cost: &C, params: &GaParams, islands: usize) -> Result<Vec<IslandReport>, IslandError>
where
    C: CostModel + ?Sized,
{
    run_islands_with_progress(cost, params, islands, |_| {})
}

/// Like [`run_islands`], forwarding every island's progress to `progress`.
///
/// `progress` is called concurrently from all island threads.
pub fn run_islands_with_progress<C, F>(
    cost: &C,
    params: &GaParams,
    islands: usize,
    progress: F,
) -> Result<Vec<IslandReport>, IslandError>
where
    C: CostModel + ?Sized,
    F: Fn(&GenerationStats) + Sync,
{
    if islands == 0 {
        return Err(IslandError::NoIslands);
    }
    params.validate()?;
    if cost.is_empty() {
        return Err(IslandError::EmptyCostModel);
    }

    let comms = LocalGroup::new(islands);
    let progress = &progress;

    let joined: Vec<thread::Result<Result<IslandReport, IslandError>>> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|mut comm| {
                scope.spawn(move || IslandRunner::run_with_progress(cost, params, &mut comm, progress))
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });

    // A panic is the root cause; peers only report the abort it triggered.
    let mut outcomes = Vec::with_capacity(islands);
    for (rank, joined) in joined.into_iter().enumerate() {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(_) => return Err(IslandError::Panicked(rank)),
        }
    }
    outcomes.into_iter().collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::DistanceMatrix;
    use crate::error::ConfigError;
    use crate::ga::operators::is_valid_permutation;
    use crate::island::comm::SoloComm;
    use rand::Rng;
    use std::sync::Mutex;

    fn square() -> DistanceMatrix {
        DistanceMatrix::euclidean(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)])
    }

    fn scattered(n: usize, seed: u64) -> DistanceMatrix {
        let mut rng = create_rng(seed);
        let pts: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();
        DistanceMatrix::euclidean(&pts)
    }

    #[test]
    fn test_square_converges_to_perimeter() {
        let m = square();
        let params = GaParams::default()
            .with_population_size(20)
            .with_generations(10)
            .with_local_search(true);

        let report = IslandRunner::run(&m, &params, &mut SoloComm).unwrap();

        assert!((report.best.fitness - 4.0).abs() < 1e-9, "got {}", report.best.fitness);
        assert!(is_valid_permutation(&report.best.perm, 4));
    }

    #[test]
    fn test_square_converges_across_islands() {
        let m = square();
        let params = GaParams::fast().with_population_size(8).with_generations(5);
        let reports = run_islands(&m, &params, 3).unwrap();
        for r in &reports {
            assert!((r.best.fitness - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_history_non_increasing() {
        let m = scattered(30, 1);
        let params = GaParams::default()
            .with_population_size(30)
            .with_generations(40)
            .with_migration_interval(0);
        let report = IslandRunner::run(&m, &params, &mut SoloComm).unwrap();

        assert_eq!(report.fitness_history.len(), 41);
        for w in report.fitness_history.windows(2) {
            assert!(w[1] <= w[0], "best worsened {} -> {}", w[0], w[1]);
        }
        assert_eq!(report.best, report.local_best);
    }

    #[test]
    fn test_deterministic_given_seed() {
        let m = scattered(25, 2);
        let params = GaParams::default()
            .with_population_size(30)
            .with_generations(25)
            .with_seed(77);

        let a = IslandRunner::run(&m, &params, &mut SoloComm).unwrap();
        let b = IslandRunner::run(&m, &params, &mut SoloComm).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);

        // Population-level: every generation identical
        let trace = || {
            let mut island = Island::new(&m, &params, 0).unwrap();
            let mut pops = vec![island.population().clone()];
            for _ in 0..params.generations {
                island.evolve(&m, &params);
                pops.push(island.population().clone());
            }
            pops
        };
        assert_eq!(trace(), trace());
    }

    #[test]
    fn test_no_migration_islands_are_independent() {
        let m = scattered(20, 3);
        let params = GaParams::default()
            .with_population_size(20)
            .with_generations(15)
            .with_migration_interval(0);

        let reports = run_islands(&m, &params, 3).unwrap();
        assert_eq!(reports.len(), 3);

        for r in &reports {
            assert_eq!(r.migrations_applied + r.migrations_skipped, 0);

            // Same rank, run alone: identical local outcome
            let mut island = Island::new(&m, &params, r.rank).unwrap();
            for _ in 0..params.generations {
                island.evolve(&m, &params);
            }
            let best = island.population().best();
            assert_eq!(r.local_best.perm, best.perm);
            assert_eq!(r.local_best.fitness, best.fitness);
        }

        // Distinct streams give distinct initial populations
        let first: Vec<f64> = reports.iter().map(|r| r.fitness_history[0]).collect();
        assert!(first[0] != first[1] || first[1] != first[2]);

        // Everyone ends with the same global answer: the minimum local best
        let min_local = reports
            .iter()
            .map(|r| r.local_best.fitness)
            .fold(f64::INFINITY, f64::min);
        for r in &reports {
            assert_eq!(r.best, reports[0].best);
            assert!((r.best.fitness - min_local).abs() < 1e-9);
        }
    }

    #[test]
    fn test_migration_rounds_counted_and_shared() {
        let m = scattered(20, 4);
        let params = GaParams::default()
            .with_population_size(20)
            .with_generations(20)
            .with_migration_interval(5);

        let reports = run_islands(&m, &params, 3).unwrap();
        for r in &reports {
            assert_eq!(r.migrations_applied, 4);
            assert_eq!(r.migrations_skipped, 0);
        }
    }

    #[test]
    fn test_migration_never_worsens_island_best() {
        let m = scattered(24, 5);
        let params = GaParams::default()
            .with_population_size(16)
            .with_generations(12)
            .with_migration_interval(3);

        let seen = Mutex::new(Vec::new());
        run_islands_with_progress(&m, &params, 3, |s| {
            seen.lock().unwrap().push(*s);
        })
        .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3 * 12);
        for s in seen.iter().filter(|s| s.migration.is_some()) {
            if let Some(MigrationOutcome::Applied { fitness, .. }) = s.migration {
                assert!(s.best_fitness <= fitness + 1e-9);
            }
        }
        for rank in 0..3 {
            let mut prev = f64::INFINITY;
            for s in seen.iter().filter(|s| s.rank == rank) {
                assert!(s.best_fitness <= prev);
                prev = s.best_fitness;
            }
        }
    }

    #[test]
    fn test_zero_generations_reduces_initial_populations() {
        let m = scattered(10, 6);
        let params = GaParams::default().with_population_size(5).with_generations(0);
        let reports = run_islands(&m, &params, 2).unwrap();
        assert_eq!(reports[0].fitness_history.len(), 1);
        assert_eq!(reports[0].best, reports[1].best);
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let m = square();
        let params = GaParams::default().with_tournament_size(0);
        assert_eq!(
            IslandRunner::run(&m, &params, &mut SoloComm),
            Err(IslandError::Config(ConfigError::EmptyTournament))
        );
        assert_eq!(
            run_islands(&m, &params, 3),
            Err(IslandError::Config(ConfigError::EmptyTournament))
        );
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let empty = DistanceMatrix::euclidean(&[]);
        let params = GaParams::default();
        assert_eq!(
            IslandRunner::run(&empty, &params, &mut SoloComm),
            Err(IslandError::EmptyCostModel)
        );
        assert_eq!(run_islands(&square(), &params, 0), Err(IslandError::NoIslands));
    }

    #[test]
    fn test_single_city() {
        let m = DistanceMatrix::euclidean(&[(3.0, 4.0)]);
        let params = GaParams::fast().with_population_size(3).with_generations(3);
        let report = IslandRunner::run(&m, &params, &mut SoloComm).unwrap();
        assert_eq!(report.best.perm, vec![0]);
        assert_eq!(report.best.fitness, 0.0);
    }
}
