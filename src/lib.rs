//! # quadflow
//!
//! quadflow is a distributed solver for two-dimensional incompressible
//! viscous flow on partitioned unstructured quadrilateral meshes. Every
//! process loads the full shared topology, claims the elements assigned to
//! its rank, and advances the flow field with a predictor step followed by a
//! simultaneous velocity-pressure relaxation. Field contributions on
//! partition-boundary nodes are combined through ordered peer buffers, and
//! convergence and wall-clock consensus travel through a collective
//! OR-reduction, so all partitions step in lockstep.
//!
//! ## Backends
//! The driver is generic over a [`comm::Transport`]:
//! - [`comm::NoTransport`] for single-partition runs,
//! - [`comm::LocalTransport`] for deterministic in-process groups (tests),
//! - `MpiTransport` for distributed runs (feature `mpi-support`).
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! quadflow = "0.1"
//! # features = ["mpi-support"]
//! ```

pub mod comm;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod mesh;
pub mod solver;

pub use config::CaseConfig;
pub use error::FlowError;
pub use solver::Driver;

/// Commonly used types for downstream code and tests.
pub mod prelude {
    pub use crate::comm::{CommDirectory, LocalTransport, NoTransport, Transport};
    pub use crate::config::CaseConfig;
    pub use crate::error::FlowError;
    pub use crate::mesh::{Boundary, Node, QuadElement};
    pub use crate::solver::{Driver, Partition, SimClock};
}
