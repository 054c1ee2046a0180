//! Mesh vertex: position, lumped mass, velocity state and the set of
//! partitions the vertex borders.

use nalgebra::Vector2;

use crate::error::FlowError;

/// A mesh vertex.
///
/// Mass and the velocity-delta accumulator are filled additively by every
/// adjacent element, so both start at zero. A node that borders more than
/// one partition is *shared*: its mass and delta contributions must be
/// summed across the bordering partitions before use.
#[derive(Debug, Clone)]
pub struct Node {
    /// Position in the plane.
    pub position: Vector2<f64>,
    /// Lumped mass, accumulated from adjacent elements.
    pub mass: f64,
    /// Inverse of the globally summed lumped mass.
    pub inv_mass: f64,
    /// `delta_t / mass`, cached once per run.
    pub dt_by_mass: f64,
    /// Current velocity.
    pub velocity: Vector2<f64>,
    /// Transient accumulator for predictor/corrector contributions.
    pub velocity_delta: Vector2<f64>,
    /// Index within the owning partition's node list, assigned by
    /// `Partition::find_own_data`.
    pub local_index: Option<usize>,
    // Ranks that touch this node, in first-seen order, no duplicates.
    ranks: Vec<usize>,
}

impl Node {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            mass: 0.0,
            inv_mass: 0.0,
            dt_by_mass: 0.0,
            velocity: Vector2::zeros(),
            velocity_delta: Vector2::zeros(),
            local_index: None,
            ranks: Vec::new(),
        }
    }

    /// Record that `rank` touches this node. Idempotent: re-adding a known
    /// rank is a no-op.
    pub fn add_rank(&mut self, rank: usize) {
        if !self.ranks.contains(&rank) {
            self.ranks.push(rank);
        }
    }

    /// Whether `rank` touches this node.
    pub fn is_on_rank(&self, rank: usize) -> bool {
        self.ranks.contains(&rank)
    }

    /// Whether the node borders more than one partition.
    pub fn is_shared(&self) -> bool {
        self.ranks.len() > 1
    }

    /// Ranks touching this node, in first-seen order.
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    pub fn clear_mass(&mut self) {
        self.mass = 0.0;
    }

    /// Invert the lumped mass once all partition contributions are in.
    /// Zero or negative mass at this point means the mesh left this node
    /// without any adjacent owned element.
    pub fn invert_mass(&mut self, index: usize) -> Result<(), FlowError> {
        if self.mass <= 0.0 {
            return Err(FlowError::NonPositiveMass {
                node: index,
                mass: self.mass,
            });
        }
        self.inv_mass = 1.0 / self.mass;
        Ok(())
    }

    pub fn cache_dt_by_mass(&mut self, delta_t: f64) {
        self.dt_by_mass = delta_t * self.inv_mass;
    }

    pub fn apply_velocity_delta(&mut self) {
        self.velocity += self.velocity_delta;
    }

    pub fn clear_velocity_delta(&mut self) {
        self.velocity_delta = Vector2::zeros();
    }
}
