//! Simulation driver: initialization, invariant computation, the
//! time-stepping loop and the convergence-correction loop.
//!
//! One driver serves both the multi-partition and the single-partition
//! case; the transport decides which. With `NoTransport` the OR-reductions
//! degenerate to the local flags and exchanges are no-ops over an empty
//! peer set.
//!
//! Reduction discipline: `all_reduce_or` is called exactly once per
//! time-loop iteration (wall-clock consensus) and exactly once per
//! correction iteration (divergence consensus), unconditionally and before
//! any early exit. Skipping or reordering a call on one partition deadlocks
//! the group.

use std::time::{Duration, Instant};

use crate::comm::{CommDirectory, Transport};
use crate::config::CaseConfig;
use crate::error::FlowError;
use crate::io::mesh::{load_boundaries, load_mesh};
use crate::io::{checkpoint, rank_scoped, snapshot_scoped, vtk};
use crate::solver::clock::SimClock;
use crate::solver::partition::Partition;

pub struct Driver<T: Transport> {
    config: CaseConfig,
    transport: T,
    partition: Partition,
    comm: CommDirectory,
    clock: SimClock,
    corrections_total: u64,
    wall_clock_budget: Option<Duration>,
    started: Instant,
}

impl<T: Transport> Driver<T> {
    /// Construct a driver and synchronize with the other partitions.
    pub fn new(config: CaseConfig, transport: T) -> Self {
        let rank = transport.rank();
        let driver = Self {
            config,
            partition: Partition::new(rank, Vec::new(), Vec::new()),
            comm: CommDirectory::new(),
            clock: SimClock::new(),
            corrections_total: 0,
            wall_clock_budget: None,
            started: Instant::now(),
            transport,
        };
        driver.transport.barrier();
        log::info!("driver ready on rank {rank}");
        driver
    }

    /// Test-construction entry: a driver over an already-built partition
    /// and communication directory.
    pub fn from_parts(
        config: CaseConfig,
        transport: T,
        partition: Partition,
        comm: CommDirectory,
    ) -> Self {
        Self {
            config,
            transport,
            partition,
            comm,
            clock: SimClock::new(),
            corrections_total: 0,
            wall_clock_budget: None,
            started: Instant::now(),
        }
    }

    /// Optional wall-clock cutoff. When set, the budget flag passes through
    /// the collective reduction each iteration so all partitions stop
    /// together even if only one observed the timeout.
    pub fn set_wall_clock_budget(&mut self, budget: Option<Duration>) {
        self.wall_clock_budget = budget;
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn partition_mut(&mut self) -> &mut Partition {
        &mut self.partition
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    pub fn corrections_total(&self) -> u64 {
        self.corrections_total
    }

    /// Load mesh and boundary files, resolve ownership and register shared
    /// nodes with the communication directory.
    pub fn load_case(&mut self) -> Result<(), FlowError> {
        let mesh = load_mesh(&self.config.mesh_path)?;
        if mesh.num_partitions != self.transport.size() {
            return Err(FlowError::Data {
                file: self.config.mesh_path.display().to_string(),
                line: 1,
                message: format!(
                    "mesh is decomposed for {} partitions but {} were launched",
                    mesh.num_partitions,
                    self.transport.size()
                ),
            });
        }
        self.partition = Partition::new(self.transport.rank(), mesh.nodes, mesh.elements);
        self.partition.find_own_data(&mut self.comm);
        let boundaries = load_boundaries(
            &self.config.boundary_path,
            self.partition.nodes(),
            self.transport.rank(),
        )?;
        self.partition.set_boundaries(boundaries);
        Ok(())
    }

    /// Restore field state from this rank's checkpoint if one exists,
    /// otherwise zero-initialize velocities and pressures.
    pub fn init_field_data(&mut self) -> Result<(), FlowError> {
        let path = rank_scoped(&self.config.checkpoint_path, self.transport.rank());
        let loaded = checkpoint::load(
            &path,
            self.partition.owned_node_indices().len(),
            self.partition.owned_element_indices().len(),
        )?;
        match loaded {
            Some(cp) => {
                checkpoint::restore(&mut self.partition, &cp);
                self.clock.restore(cp.t, self.config.delta_t);
            }
            None => self.partition.clear_field_data(),
        }
        Ok(())
    }

    /// Compute the loop invariants: phase 1, the cross-partition mass
    /// reduction, then phase 2.
    pub fn calc_invariants(&mut self) -> Result<(), FlowError> {
        self.partition
            .calc_invariants_1(self.config.reynolds, &mut self.comm)?;
        self.comm.exchange(&self.transport)?;
        self.partition
            .calc_invariants_2(self.config.delta_t, self.config.relaxation, &self.comm)
    }

    fn exchange_velocity_delta(&mut self) -> Result<(), FlowError> {
        self.partition.gather_velocity_delta(&mut self.comm);
        self.comm.exchange(&self.transport)?;
        self.partition.distribute_velocity_delta(&self.comm);
        Ok(())
    }

    /// One time step: predict, share deltas, apply, re-impose boundary
    /// conditions, run the correction loop, snapshot periodically, advance
    /// the clock.
    pub fn step(&mut self) -> Result<(), FlowError> {
        self.partition.calc_velocity_prediction();
        self.exchange_velocity_delta()?;
        self.partition.apply_velocity_delta_and_clear();
        self.partition
            .apply_boundary_conditions(self.clock.t(), self.config.t_ramp);

        self.correct_velocity()?;

        if self.clock.round() % self.config.output_interval == 0 {
            let path = snapshot_scoped(
                &self.config.output_path,
                self.transport.rank(),
                self.clock.round(),
            );
            vtk::write_snapshot(&path, &self.partition)?;
        }
        self.clock.advance(self.config.delta_t);
        Ok(())
    }

    /// Velocity-pressure relaxation loop: correct locally, agree globally.
    ///
    /// Converging early clears the residual deltas the final corrections
    /// staged; exhausting `max_corrections` is not an error, the step just
    /// proceeds with whatever was applied.
    pub fn correct_velocity(&mut self) -> Result<(), FlowError> {
        let max_corrections = self.config.max_corrections;
        let mut iterations = 0;
        for i in 0..max_corrections {
            let diverging = self.partition.calc_divergence_and_correct(self.config.epsilon);
            let any_diverging = self.transport.all_reduce_or(diverging);
            if !any_diverging {
                self.partition.clear_velocity_delta();
                iterations = i;
                log::debug!("correction converged after {i} iterations");
                break;
            }
            iterations = i + 1;

            self.exchange_velocity_delta()?;
            self.partition.apply_velocity_delta_and_clear();
            self.partition
                .apply_boundary_conditions(self.clock.t(), self.config.t_ramp);
        }
        // A budget of zero disables correction entirely; only a budget that
        // was actually spent is worth a warning.
        if max_corrections > 0 && iterations == max_corrections {
            log::warn!(
                "correction budget ({max_corrections}) exhausted at t = {}",
                self.clock.t()
            );
        }
        self.corrections_total += iterations as u64;
        Ok(())
    }

    /// Run time steps until the simulated duration is covered or the
    /// wall-clock budget expires on any partition.
    pub fn time_loop(&mut self) -> Result<(), FlowError> {
        loop {
            let exceeded = self
                .wall_clock_budget
                .is_some_and(|budget| self.started.elapsed() > budget);
            let timed_out = self.transport.all_reduce_or(exceeded);

            if self.clock.t() > self.config.duration + self.config.delta_t {
                log::info!("time loop finished at t = {}", self.clock.t());
                break;
            }
            if timed_out {
                log::warn!(
                    "wall-clock budget exceeded, stopping at t = {}",
                    self.clock.t()
                );
                break;
            }
            self.step()?;
        }
        log::info!("total corrections: {}", self.corrections_total);
        Ok(())
    }

    /// Write this rank's restart checkpoint.
    pub fn save_state(&self) -> Result<(), FlowError> {
        let path = rank_scoped(&self.config.checkpoint_path, self.transport.rank());
        checkpoint::save(&path, self.clock.t(), &self.partition)
    }

    pub fn finalize(&self) {
        log::info!("ending");
        log::logger().flush();
    }

    /// Full run: load, restore, invariants, time loop, checkpoint.
    pub fn run(&mut self) -> Result<(), FlowError> {
        self.load_case()?;
        self.init_field_data()?;
        self.calc_invariants()?;
        self.time_loop()?;
        self.save_state()?;
        self.finalize();
        Ok(())
    }
}
