//! Island model.
//!
//! A group of islands evolves independent populations and periodically
//! exchanges its best tour. Islands only interact through the
//! [`Communicator`] collectives, so the same coordinator runs on a single
//! thread ([`SoloComm`]), on a thread per island ([`LocalGroup`]), or on
//! a process per island (`MpiComm`, behind the `mpi` feature).
//!
//! # Protocol
//!
//! Every `migration_interval` generations each island runs
//! [`migrate`]: gather elites at [`MIGRATION_ROOT`], the root picks the
//! shortest, broadcast, each island overwrites its worst tour. After the
//! last generation an all-reduce MINLOC finds the island holding the best
//! tour, which broadcasts it to all.
//!
//! # References
//!
//! - Whitley, Rana & Heckendorn (1999), "The Island Model Genetic Algorithm"
//! - Cantú-Paz (1998), "A Survey of Parallel Genetic Algorithms"

mod comm;
mod migration;
#[cfg(feature = "mpi")]
mod mpi_comm;
mod runner;

pub use comm::{Communicator, LocalComm, LocalGroup, SoloComm};
pub use migration::{migrate, select_global_best, MigrationOutcome, MIGRATION_ROOT};
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
pub use runner::{
    run_islands, run_islands_with_progress, BestResult, GenerationStats, Island, IslandReport,
    IslandRunner,
};
