//! Collectives over an MPI process group (`mpi` feature).
//!
//! One island per process, launched with `mpirun -n P`. Permutations
//! travel as `u64` buffers; gathers are two-phase (element counts, then a
//! variable-count gather) because islands may contribute empty buffers.

use mpi::datatype::PartitionMut;
use mpi::environment::Universe;
use mpi::topology::{Rank, SimpleCommunicator};
use mpi::traits::{Communicator as _, CommunicatorCollectives as _, Root as _};
use mpi::Count;
use tracing::warn;

use super::comm::{check_root, min_loc, Communicator};
use crate::error::CommError;

/// `MPI_COMM_WORLD` endpoint. Finalizes MPI when dropped.
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: usize,
    size: usize,
    // Dropped last: finalizes MPI
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI and wraps the world communicator.
    ///
    /// Fails if MPI was already initialized in this process.
    pub fn initialize() -> Result<Self, CommError> {
        let universe = mpi::initialize().ok_or(CommError::MpiUnavailable)?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Ok(Self {
            world,
            rank,
            size,
            _universe: universe,
        })
    }
}

fn to_wire(perm: &[usize]) -> Vec<u64> {
    perm.iter().map(|&c| c as u64).collect()
}

fn from_wire(buf: &[u64]) -> Vec<usize> {
    buf.iter().map(|&c| c as usize).collect()
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn gather(&mut self, send: &[usize], root: usize) -> Result<Option<Vec<Vec<usize>>>, CommError> {
        check_root(root, self.size)?;
        let root_process = self.world.process_at_rank(root as Rank);

        let mut wire = to_wire(send);
        let count = Count::try_from(wire.len()).unwrap_or_else(|_| {
            warn!(rank = self.rank, len = wire.len(), "gather buffer too large; contributing nothing");
            wire.clear();
            0
        });

        if self.rank != root {
            root_process.gather_into(&count);
            root_process.gather_varcount_into(&wire[..]);
            return Ok(None);
        }

        let mut counts = vec![0 as Count; self.size];
        root_process.gather_into_root(&count, &mut counts[..]);
        let displs: Vec<Count> = counts
            .iter()
            .scan(0 as Count, |offset, &c| {
                let d = *offset;
                *offset += c;
                Some(d)
            })
            .collect();

        let total: usize = counts.iter().map(|&c| c as usize).sum();
        let mut flat = vec![0u64; total];
        {
            let mut partition = PartitionMut::new(&mut flat[..], &counts[..], &displs[..]);
            root_process.gather_varcount_into_root(&wire[..], &mut partition);
        }

        let mut blocks = Vec::with_capacity(self.size);
        let mut offset = 0;
        for &c in &counts {
            let c = c as usize;
            blocks.push(from_wire(&flat[offset..offset + c]));
            offset += c;
        }
        Ok(Some(blocks))
    }

    fn broadcast(&mut self, buf: &mut Vec<usize>, root: usize) -> Result<(), CommError> {
        check_root(root, self.size)?;
        let root_process = self.world.process_at_rank(root as Rank);

        let mut len = buf.len() as u64;
        root_process.broadcast_into(&mut len);

        let mut wire = if self.rank == root {
            to_wire(buf)
        } else {
            vec![0u64; len as usize]
        };
        root_process.broadcast_into(&mut wire[..]);

        if self.rank != root {
            *buf = from_wire(&wire);
        }
        Ok(())
    }

    /// MINLOC as an all-gather of values: position in the receive buffer is
    /// the rank, and every rank folds the same buffer the same way.
    fn all_reduce_min_loc(&mut self, value: f64) -> Result<(f64, usize), CommError> {
        let mut values = vec![0.0f64; self.size];
        self.world.all_gather_into(&value, &mut values[..]);
        let first = (values[0], 0);
        Ok(values
            .iter()
            .enumerate()
            .skip(1)
            .fold(first, |acc, (rank, &v)| min_loc(acc, (v, rank))))
    }
}
