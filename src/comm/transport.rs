//! Thin façade over intra-process (threaded) or inter-process (MPI) message
//! passing.
//!
//! The exchange primitive is symmetric: one non-blocking send and one
//! non-blocking receive per peer, then a wait for every outstanding
//! operation before returning. Callers never observe a partial exchange.
//!
//! `all_reduce_or` is collective: every partition must call it at the same
//! relative position in the control flow every iteration, or the partitions
//! deadlock. The driver relies on this for convergence consensus and for
//! the wall-clock cutoff.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::error::FlowError;

/// One peer's half of a symmetric boundary-value exchange.
pub struct ExchangeLink<'a> {
    /// Neighbor partition id.
    pub peer: usize,
    pub send: &'a [f64],
    pub recv: &'a mut [f64],
}

/// Message-passing contract consumed by the driver and the communication
/// directory.
pub trait Transport: Send {
    /// This partition's id.
    fn rank(&self) -> usize;
    /// Total partition count.
    fn size(&self) -> usize;
    /// Perform every link's send and receive, then wait for all of them.
    fn exchange(&self, links: &mut [ExchangeLink<'_>]) -> Result<(), FlowError>;
    /// Collective logical-OR consensus across all partitions.
    fn all_reduce_or(&self, flag: bool) -> bool;
    /// Collective synchronization point.
    fn barrier(&self);
}

/// Degenerate transport for a single-partition run: no peers exist, the
/// reduction is the identity and the barrier is a no-op.
#[derive(Clone, Debug, Default)]
pub struct NoTransport;

impl Transport for NoTransport {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn exchange(&self, links: &mut [ExchangeLink<'_>]) -> Result<(), FlowError> {
        debug_assert!(links.is_empty(), "single partition has no peers");
        Ok(())
    }

    fn all_reduce_or(&self, flag: bool) -> bool {
        flag
    }

    fn barrier(&self) {}
}

// --- LocalTransport: deterministic in-process group, one rank per thread ---

struct ReduceState {
    arrived: usize,
    acc: bool,
    result: bool,
    generation: u64,
}

struct GroupState {
    size: usize,
    // FIFO of payloads per directed (src, dst) pair.
    mailbox: DashMap<(usize, usize), VecDeque<Bytes>>,
    reduce: Mutex<ReduceState>,
    reduce_cv: Condvar,
}

/// In-process transport for tests and threaded multi-partition simulation.
/// Ranks of one group share a mailbox; payload order per directed pair is
/// FIFO, so repeated collective exchanges stay aligned.
pub struct LocalTransport {
    rank: usize,
    group: Arc<GroupState>,
}

impl LocalTransport {
    /// Build a connected group of `size` ranks.
    pub fn group(size: usize) -> Vec<LocalTransport> {
        assert!(size > 0);
        let state = Arc::new(GroupState {
            size,
            mailbox: DashMap::new(),
            reduce: Mutex::new(ReduceState {
                arrived: 0,
                acc: false,
                result: false,
                generation: 0,
            }),
            reduce_cv: Condvar::new(),
        });
        (0..size)
            .map(|rank| LocalTransport {
                rank,
                group: Arc::clone(&state),
            })
            .collect()
    }

    fn post(&self, peer: usize, payload: &[f64]) {
        let bytes = Bytes::copy_from_slice(bytemuck::cast_slice(payload));
        self.group
            .mailbox
            .entry((self.rank, peer))
            .or_default()
            .push_back(bytes);
    }

    fn take(&self, peer: usize) -> Bytes {
        let key = (peer, self.rank);
        loop {
            if let Some(mut queue) = self.group.mailbox.get_mut(&key) {
                if let Some(bytes) = queue.pop_front() {
                    return bytes;
                }
            }
            std::thread::yield_now();
        }
    }
}

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.group.size
    }

    fn exchange(&self, links: &mut [ExchangeLink<'_>]) -> Result<(), FlowError> {
        // All sends first; they never block, so no posting order deadlocks.
        for link in links.iter() {
            self.post(link.peer, link.send);
        }
        for link in links.iter_mut() {
            let bytes = self.take(link.peer);
            let values: Vec<f64> = bytemuck::pod_collect_to_vec(&bytes[..]);
            if values.len() != link.recv.len() {
                return Err(FlowError::ExchangeShape {
                    peer: link.peer,
                    expected: link.recv.len(),
                    got: values.len(),
                });
            }
            link.recv.copy_from_slice(&values);
        }
        Ok(())
    }

    fn all_reduce_or(&self, flag: bool) -> bool {
        let mut state = self.group.reduce.lock();
        let generation = state.generation;
        state.acc |= flag;
        state.arrived += 1;
        if state.arrived == self.group.size {
            state.result = state.acc;
            state.acc = false;
            state.arrived = 0;
            state.generation += 1;
            self.group.reduce_cv.notify_all();
            state.result
        } else {
            while state.generation == generation {
                self.group.reduce_cv.wait(&mut state);
            }
            state.result
        }
    }

    fn barrier(&self) {
        // A reduction nobody contributes to is exactly a barrier.
        let _ = self.all_reduce_or(false);
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{ExchangeLink, Transport};
    use crate::error::FlowError;
    use mpi::collective::SystemOperation;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// Transport over an MPI world, one process per partition.
    pub struct MpiTransport {
        _universe: mpi::environment::Universe,
        world: SimpleCommunicator,
    }

    impl MpiTransport {
        /// Initialize the MPI environment. Returns `None` when MPI was
        /// already initialized in this process.
        pub fn init() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            Some(Self {
                _universe: universe,
                world,
            })
        }
    }

    impl Transport for MpiTransport {
        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn exchange(&self, links: &mut [ExchangeLink<'_>]) -> Result<(), FlowError> {
            mpi::request::multiple_scope(2 * links.len(), |scope, coll| {
                for link in links.iter_mut() {
                    let process = self.world.process_at_rank(link.peer as i32);
                    coll.add(process.immediate_send(scope, link.send));
                    coll.add(process.immediate_receive_into(scope, &mut *link.recv));
                }
                let mut finished = Vec::new();
                coll.wait_all(&mut finished);
            });
            Ok(())
        }

        fn all_reduce_or(&self, flag: bool) -> bool {
            let mut all = false;
            self.world
                .all_reduce_into(&flag, &mut all, SystemOperation::logical_or());
            all
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiTransport;
