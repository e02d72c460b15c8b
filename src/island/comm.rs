//! Collective communication between islands.
//!
//! The island protocol only needs three collectives, modelled on their MPI
//! namesakes: `gather` to a root, `broadcast` from a root, and an
//! all-reduce of `(value, rank)` pairs by minimum (`MINLOC`). Every
//! participant must issue the same collectives in the same order; each
//! call blocks until its peers have reached the matching call.
//!
//! [`SoloComm`] is the trivial single-island group. [`LocalGroup`] wires
//! `size` endpoints together with channels so each island can run on its
//! own thread; it is the in-process transport behind
//! [`run_islands`](super::run_islands) and the tests. Separate processes
//! use `MpiComm` (`mpi` feature).

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::error::CommError;

/// SPMD collective operations over a fixed group of islands.
pub trait Communicator {
    /// This participant's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of participants.
    fn size(&self) -> usize;

    /// Collects every rank's `send` buffer at `root`.
    ///
    /// Returns `Some(buffers)` indexed by rank on the root, `None` elsewhere.
    /// Buffers may differ in length.
    fn gather(&mut self, send: &[usize], root: usize) -> Result<Option<Vec<Vec<usize>>>, CommError>;

    /// Replaces `buf` on every rank with the root's `buf`.
    fn broadcast(&mut self, buf: &mut Vec<usize>, root: usize) -> Result<(), CommError>;

    /// Returns the minimum `value` across the group and the rank holding it.
    ///
    /// Ties go to the lowest rank. NaN never wins against a number.
    fn all_reduce_min_loc(&mut self, value: f64) -> Result<(f64, usize), CommError>;
}

pub(super) fn check_root(root: usize, size: usize) -> Result<(), CommError> {
    if root < size {
        Ok(())
    } else {
        Err(CommError::InvalidRoot { root, size })
    }
}

/// `MINLOC` combine: lower value wins, then lower rank.
pub(super) fn min_loc(a: (f64, usize), b: (f64, usize)) -> (f64, usize) {
    let b_wins = match (a.0.is_nan(), b.0.is_nan()) {
        (true, false) => true,
        (false, true) => false,
        _ => b.0 < a.0 || ((b.0 == a.0 || a.0.is_nan()) && b.1 < a.1),
    };
    if b_wins {
        b
    } else {
        a
    }
}

// ============================================================================
// Single island
// ============================================================================

/// Group of one: every collective is local.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloComm;

impl Communicator for SoloComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn gather(&mut self, send: &[usize], root: usize) -> Result<Option<Vec<Vec<usize>>>, CommError> {
        check_root(root, 1)?;
        Ok(Some(vec![send.to_vec()]))
    }

    fn broadcast(&mut self, _buf: &mut Vec<usize>, root: usize) -> Result<(), CommError> {
        check_root(root, 1)
    }

    fn all_reduce_min_loc(&mut self, value: f64) -> Result<(f64, usize), CommError> {
        Ok((value, 0))
    }
}

// ============================================================================
// Thread-backed group
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collective {
    Gather,
    Broadcast,
    AllReduce,
}

impl Collective {
    fn name(self) -> &'static str {
        match self {
            Collective::Gather => "gather",
            Collective::Broadcast => "broadcast",
            Collective::AllReduce => "all_reduce_min_loc",
        }
    }
}

#[derive(Debug)]
enum Payload {
    Perm(Vec<usize>),
    MinLoc(f64, usize),
}

#[derive(Debug)]
struct Envelope {
    seq: u64,
    from: usize,
    op: Collective,
    payload: Payload,
}

#[derive(Debug)]
enum Message {
    Data(Envelope),
    /// Sent by an endpoint dropped after a failure or during a panic.
    Abort { from: usize },
}

/// Builder for a group of channel-connected endpoints.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `size` connected endpoints; endpoint `r` has rank `r`.
    ///
    /// Move each endpoint to its own thread. An endpoint dropped during a
    /// panic, or after one of its collectives failed, aborts every peer's
    /// pending and future collectives with [`CommError::PeerAborted`].
    pub fn new(size: usize) -> Vec<LocalComm> {
        let (senders, receivers): (Vec<Sender<Message>>, Vec<Receiver<Message>>) =
            (0..size).map(|_| channel()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalComm {
                rank,
                size,
                seq: 0,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(r, s)| (r != rank).then(|| s.clone()))
                    .collect(),
                inbox,
                pending: Vec::new(),
                failed: false,
            })
            .collect()
    }
}

/// One endpoint of a [`LocalGroup`].
///
/// Messages carry the collective's sequence number, so early arrivals for
/// a later collective are parked until this rank gets there.
#[derive(Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    seq: u64,
    peers: Vec<Option<Sender<Message>>>,
    inbox: Receiver<Message>,
    pending: Vec<Envelope>,
    failed: bool,
}

impl LocalComm {
    /// Marks the endpoint broken once any collective fails, so dropping it
    /// releases peers still blocked on it.
    fn track<T>(&mut self, result: Result<T, CommError>) -> Result<T, CommError> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn send(&self, to: usize, seq: u64, op: Collective, payload: Payload) -> Result<(), CommError> {
        let disconnected = CommError::Disconnected {
            rank: self.rank,
            op: op.name(),
        };
        let Some(tx) = &self.peers[to] else {
            return Err(disconnected);
        };
        tx.send(Message::Data(Envelope {
            seq,
            from: self.rank,
            op,
            payload,
        }))
        .map_err(|_| disconnected)
    }

    /// Blocks until a message of collective `seq` arrives (from `from`, if
    /// given).
    fn recv(&mut self, seq: u64, op: Collective, from: Option<usize>) -> Result<Envelope, CommError> {
        let wanted = |env: &Envelope| env.seq == seq && from.is_none_or(|f| env.from == f);

        if let Some(idx) = self.pending.iter().position(wanted) {
            let env = self.pending.swap_remove(idx);
            return self.check_op(env, seq, op);
        }

        loop {
            let msg = self.inbox.recv().map_err(|_| CommError::Disconnected {
                rank: self.rank,
                op: op.name(),
            })?;
            match msg {
                Message::Abort { from: peer } => {
                    return Err(CommError::PeerAborted {
                        rank: self.rank,
                        peer,
                        op: op.name(),
                    });
                }
                Message::Data(env) if wanted(&env) => return self.check_op(env, seq, op),
                Message::Data(env) => self.pending.push(env),
            }
        }
    }

    fn check_op(&self, env: Envelope, seq: u64, op: Collective) -> Result<Envelope, CommError> {
        if env.op == op {
            Ok(env)
        } else {
            Err(self.mismatch(seq, op, env.op, env.from))
        }
    }

    fn mismatch(&self, seq: u64, expected: Collective, got: Collective, from: usize) -> CommError {
        CommError::Mismatch {
            rank: self.rank,
            seq,
            expected: expected.name(),
            got: got.name(),
            from,
        }
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn gather(&mut self, send: &[usize], root: usize) -> Result<Option<Vec<Vec<usize>>>, CommError> {
        let result = self.gather_impl(send, root);
        self.track(result)
    }

    fn broadcast(&mut self, buf: &mut Vec<usize>, root: usize) -> Result<(), CommError> {
        let result = self.broadcast_impl(buf, root);
        self.track(result)
    }

    fn all_reduce_min_loc(&mut self, value: f64) -> Result<(f64, usize), CommError> {
        let result = self.all_reduce_impl(value);
        self.track(result)
    }
}

impl LocalComm {
    fn gather_impl(&mut self, send: &[usize], root: usize) -> Result<Option<Vec<Vec<usize>>>, CommError> {
        check_root(root, self.size)?;
        let seq = self.next_seq();
        let op = Collective::Gather;

        if self.rank != root {
            self.send(root, seq, op, Payload::Perm(send.to_vec()))?;
            return Ok(None);
        }

        let mut blocks = vec![Vec::new(); self.size];
        blocks[root] = send.to_vec();
        for _ in 1..self.size {
            let env = self.recv(seq, op, None)?;
            match env.payload {
                Payload::Perm(p) => blocks[env.from] = p,
                Payload::MinLoc(..) => return Err(self.mismatch(seq, op, Collective::AllReduce, env.from)),
            }
        }
        Ok(Some(blocks))
    }

    fn broadcast_impl(&mut self, buf: &mut Vec<usize>, root: usize) -> Result<(), CommError> {
        check_root(root, self.size)?;
        let seq = self.next_seq();
        let op = Collective::Broadcast;

        if self.rank == root {
            for to in (0..self.size).filter(|&r| r != root) {
                self.send(to, seq, op, Payload::Perm(buf.clone()))?;
            }
            return Ok(());
        }

        let env = self.recv(seq, op, Some(root))?;
        match env.payload {
            Payload::Perm(p) => {
                *buf = p;
                Ok(())
            }
            Payload::MinLoc(..) => Err(self.mismatch(seq, op, Collective::AllReduce, env.from)),
        }
    }

    fn all_reduce_impl(&mut self, value: f64) -> Result<(f64, usize), CommError> {
        const ROOT: usize = 0;
        let seq = self.next_seq();
        let op = Collective::AllReduce;

        if self.rank != ROOT {
            self.send(ROOT, seq, op, Payload::MinLoc(value, self.rank))?;
            let env = self.recv(seq, op, Some(ROOT))?;
            return match env.payload {
                Payload::MinLoc(v, r) => Ok((v, r)),
                Payload::Perm(_) => Err(self.mismatch(seq, op, Collective::Gather, env.from)),
            };
        }

        let mut acc = (value, ROOT);
        for _ in 1..self.size {
            let env = self.recv(seq, op, None)?;
            match env.payload {
                Payload::MinLoc(v, r) => acc = min_loc(acc, (v, r)),
                Payload::Perm(_) => return Err(self.mismatch(seq, op, Collective::Gather, env.from)),
            }
        }
        for to in 1..self.size {
            self.send(to, seq, op, Payload::MinLoc(acc.0, acc.1))?;
        }
        Ok(acc)
    }
}

impl Drop for LocalComm {
    fn drop(&mut self) {
        if self.failed || std::thread::panicking() {
            for tx in self.peers.iter().flatten() {
                let _ = tx.send(Message::Abort { from: self.rank });
            }
        }
    }
}
