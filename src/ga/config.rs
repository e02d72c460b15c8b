//! GA configuration.
//!
//! [`GaParams`] holds every parameter of a run. It is immutable once the
//! run starts and shared read-only by all islands.

use super::operators::Mutation;
use crate::error::ConfigError;

/// Parameters of an island-model GA run.
///
/// Builder methods store values as given; out-of-range values are
/// rejected by [`validate`](Self::validate), never clamped.
///
/// # Defaults
///
/// ```
/// use u_tsp_island::ga::GaParams;
///
/// let params = GaParams::default();
/// assert_eq!(params.population_size, 200);
/// assert_eq!(params.generations, 500);
/// assert_eq!(params.tournament_size, 4);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_tsp_island::ga::GaParams;
///
/// let params = GaParams::default()
///     .with_population_size(100)
///     .with_tournament_size(3)
///     .with_migration_interval(25)
///     .with_seed(7);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaParams {
    /// Tours per island.
    pub population_size: usize,

    /// Generations each island runs. Zero skips evolution entirely and
    /// reduces the initial random populations.
    pub generations: usize,

    /// Probability of PMX crossover; otherwise the first parent is cloned.
    pub crossover_rate: f64,

    /// Probability that the mutation operator fires on a child.
    pub mutation_rate: f64,

    /// Mutation operator.
    pub mutation: Mutation,

    /// Tournament size k (k=1 means uniform selection).
    pub tournament_size: usize,

    /// Generations between migration rounds; 0 disables migration.
    pub migration_interval: usize,

    /// Fraction of each population offered as migration candidates.
    ///
    /// At least one tour is always offered.
    pub migration_elite_fraction: f64,

    /// Whether near-elite children are refined with 2-opt.
    pub local_search: bool,

    /// Fraction of the population (after the hard elites) refined by
    /// 2-opt each generation. At least one slot when local search is on.
    pub local_search_band: f64,

    /// Tours copied unchanged into the next generation. At least one;
    /// capped at the population size.
    pub elite_count: usize,

    /// Base seed; each island derives its own stream from it.
    pub seed: u64,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_size: 200,
            generations: 500,
            crossover_rate: 0.8,
            mutation_rate: 0.05,
            mutation: Mutation::Inversion,
            tournament_size: 4,
            migration_interval: 50,
            migration_elite_fraction: 0.05,
            local_search: true,
            local_search_band: 0.1,
            elite_count: 2,
            seed: 42,
        }
    }
}

impl GaParams {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of generations.
    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the mutation operator.
    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Sets the migration interval (0 disables migration).
    pub fn with_migration_interval(mut self, generations: usize) -> Self {
        self.migration_interval = generations;
        self
    }

    /// Sets the migration elite fraction.
    pub fn with_migration_elite_fraction(mut self, fraction: f64) -> Self {
        self.migration_elite_fraction = fraction;
        self
    }

    /// Enables or disables 2-opt refinement.
    pub fn with_local_search(mut self, enabled: bool) -> Self {
        self.local_search = enabled;
        self
    }

    /// Sets the 2-opt band fraction.
    pub fn with_local_search_band(mut self, fraction: f64) -> Self {
        self.local_search_band = fraction;
        self
    }

    /// Sets the number of hard elites.
    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Preset for quick runs: small population, few generations.
    ///
    /// - Population: 60, Generations: 150, Migration every 25
    pub fn fast() -> Self {
        Self {
            population_size: 60,
            generations: 150,
            migration_interval: 25,
            ..Self::default()
        }
    }

    /// Preset balancing quality and time.
    ///
    /// - Population: 200, Generations: 500, Migration every 50
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Preset for quality: large population, many generations.
    ///
    /// - Population: 400, Generations: 1500, Migration every 75
    pub fn quality() -> Self {
        Self {
            population_size: 400,
            generations: 1500,
            migration_interval: 75,
            ..Self::default()
        }
    }

    /// Selects a preset from the number of cities.
    ///
    /// - `cities < 50` → [`fast()`](Self::fast)
    /// - `50 ≤ cities < 300` → [`balanced()`](Self::balanced)
    /// - `cities ≥ 300` → [`quality()`](Self::quality)
    pub fn auto_select(cities: usize) -> Self {
        if cities < 50 {
            Self::fast()
        } else if cities < 300 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Number of candidates each island offers per migration round.
    pub fn migration_elite_count(&self) -> usize {
        let k = (self.population_size as f64 * self.migration_elite_fraction) as usize;
        k.clamp(1, self.population_size.max(1))
    }

    /// Hard elites actually carried over (never more than the population).
    pub fn effective_elite_count(&self) -> usize {
        self.elite_count.min(self.population_size)
    }

    /// Exclusive upper bound of the slot indices refined by 2-opt.
    ///
    /// Zero when local search is disabled.
    pub fn local_search_limit(&self) -> usize {
        if !self.local_search {
            return 0;
        }
        let band = ((self.population_size as f64 * self.local_search_band) as usize).max(1);
        (self.effective_elite_count() + band).min(self.population_size)
    }

    /// Validates the parameters.
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        check_rate("crossover_rate", self.crossover_rate)?;
        check_rate("mutation_rate", self.mutation_rate)?;
        check_rate("local_search_band", self.local_search_band)?;
        if self.tournament_size == 0 {
            return Err(ConfigError::EmptyTournament);
        }
        if self.elite_count == 0 {
            return Err(ConfigError::NoElites);
        }
        let f = self.migration_elite_fraction;
        if f.is_nan() || f <= 0.0 || f > 1.0 {
            return Err(ConfigError::EliteFractionOutOfRange(f));
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}
