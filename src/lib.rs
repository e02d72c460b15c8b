//! Island-model genetic algorithm for the symmetric Euclidean TSP.
//!
//! Each island evolves its own population of tours with tournament
//! selection, PMX crossover, inversion mutation and an optional 2-opt
//! refinement of the best children. Islands periodically share their best
//! tour (gather to a root, broadcast the global best, replace the local
//! worst) and agree on a single answer at the end.
//!
//! - [`cost`]: distance matrix and the [`CostModel`](cost::CostModel) trait
//! - [`ga`]: tours, populations, operators and the generation step
//! - [`island`]: collectives, migration and the per-island coordinator
//! - [`instance`]: coordinate file loader
//! - [`random`]: seeded per-island random streams
//!
//! # Quick start
//!
//! ```
//! use u_tsp_island::cost::DistanceMatrix;
//! use u_tsp_island::ga::GaParams;
//! use u_tsp_island::island::run_islands;
//!
//! let points = [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (1.0, 3.0)];
//! let cost = DistanceMatrix::euclidean(&points);
//! let params = GaParams::fast().with_population_size(20).with_generations(30);
//!
//! let reports = run_islands(&cost, &params, 2).unwrap();
//! assert_eq!(reports[0].best, reports[1].best);
//! ```
//!
//! # Features
//!
//! - `parallel`: evaluate population fitness with rayon
//! - `serde`: derive `Serialize`/`Deserialize` on parameter and result types
//! - `mpi`: `island::MpiComm`, one island per MPI process (needs an MPI
//!   installation)

pub mod cost;
pub mod error;
pub mod ga;
pub mod instance;
pub mod island;
pub mod random;
