//! Error types.
//!
//! Recombination defects are not errors: they are repaired in place by the
//! generation step (see [`crate::ga::operators::repair`]). Everything here
//! is either rejected before a run starts or fatal for the run.

use std::path::PathBuf;

/// Invalid [`GaParams`](crate::ga::GaParams) value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Population must hold at least one tour.
    #[error("population_size must be at least 1")]
    EmptyPopulation,

    /// A probability parameter is outside `[0, 1]` or NaN.
    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Tournament must draw at least one contestant.
    #[error("tournament_size must be at least 1")]
    EmptyTournament,

    /// At least one tour must survive each generation unchanged.
    #[error("elite_count must be at least 1")]
    NoElites,

    /// Migration elite fraction must be within `(0, 1]`.
    #[error("migration_elite_fraction must be within (0, 1], got {0}")]
    EliteFractionOutOfRange(f64),
}

/// Failure of a collective operation.
///
/// All variants are fatal: the group has no way to reconfigure itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommError {
    /// A peer endpoint went away while this rank was waiting on it.
    #[error("rank {rank}: peer disconnected during {op}")]
    Disconnected {
        /// Rank that observed the failure.
        rank: usize,
        /// Collective being executed.
        op: &'static str,
    },

    /// Peers issued different collectives at the same point in the sequence.
    #[error("rank {rank}: collective mismatch at step {seq}: expected {expected}, got {got} from rank {from}")]
    Mismatch {
        /// Rank that observed the mismatch.
        rank: usize,
        /// Collective sequence number.
        seq: u64,
        /// Collective this rank is executing.
        expected: &'static str,
        /// Collective the peer sent.
        got: &'static str,
        /// Sending peer.
        from: usize,
    },

    /// A peer failed (panicked) and aborted the group.
    #[error("rank {rank}: peer {peer} aborted during {op}")]
    PeerAborted {
        /// Rank that observed the failure.
        rank: usize,
        /// Failed peer.
        peer: usize,
        /// Collective being executed.
        op: &'static str,
    },

    /// The MPI environment could not be initialized (or already was).
    #[cfg(feature = "mpi")]
    #[error("MPI initialization failed")]
    MpiUnavailable,

    /// A root rank outside the group was requested.
    #[error("root rank {root} out of range for group of size {size}")]
    InvalidRoot {
        /// Requested root.
        root: usize,
        /// Group size.
        size: usize,
    },
}

/// Error returned by an island run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IslandError {
    /// Parameters rejected before the run started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Collective communication failed.
    #[error("coordination failure: {0}")]
    Comm(#[from] CommError),

    /// The cost model has no cities.
    #[error("cost model must contain at least one city")]
    EmptyCostModel,

    /// A requested island count of zero.
    #[error("at least one island is required")]
    NoIslands,

    /// An island thread panicked.
    #[error("island {0} panicked")]
    Panicked(usize),
}

/// Error loading a city coordinate file.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Missing or non-positive city count (plain header line, TSPLIB
    /// `DIMENSION`, or an empty `NODE_COORD_SECTION`).
    #[error("missing or non-positive city count")]
    BadCount,

    /// A coordinate line is not `x y`.
    #[error("malformed coordinate line near city {0} (expected \"x y\")")]
    BadCoordinate(usize),

    /// Fewer coordinate lines than announced.
    #[error("expected {expected} coordinates, read {read}")]
    Truncated {
        /// Announced count.
        expected: usize,
        /// Lines actually read.
        read: usize,
    },
}
