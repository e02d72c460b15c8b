//! Genetic algorithm over TSP tours.
//!
//! Everything an island needs to evolve its own population, with no
//! knowledge of other islands.
//!
//! # Key Types
//!
//! - [`Tour`]: permutation of cities plus cached length
//! - [`Population`]: fixed-size, never-empty set of tours
//! - [`GaParams`]: run parameters (population, rates, migration, seed)
//!
//! # Operators
//!
//! - [`tournament_select`]: k-way tournament, with replacement
//! - [`operators`]: PMX crossover, inversion/swap mutation, validity repair
//! - [`local_search`]: first-improvement 2-opt
//! - [`evolve_generation`]: one elitist µ+λ generation
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Croes (1958), "A Method for Solving Traveling-Salesman Problems"

mod config;
pub mod local_search;
pub mod operators;
mod population;
mod runner;
mod selection;
mod types;

pub use config::GaParams;
pub use operators::Mutation;
pub use population::Population;
pub use runner::{evolve_generation, StepStats};
pub use selection::tournament_select;
pub use types::Tour;
