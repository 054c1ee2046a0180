//! Partition dataset: the full mesh arenas, the subset owned by this
//! partition, the boundary groups and the per-partition computational
//! stages.
//!
//! All partitions hold the complete topology (so shared nodes can be
//! identified locally), but each runs its stages only over the nodes and
//! elements it owns.

use crate::comm::CommDirectory;
use crate::error::FlowError;
use crate::mesh::{Boundary, Node, QuadElement};

#[derive(Debug, Clone)]
pub struct Partition {
    my_rank: usize,
    nodes: Vec<Node>,
    elements: Vec<QuadElement>,
    /// Indices of locally owned nodes, in node-array order.
    my_nodes: Vec<usize>,
    /// Indices of locally owned elements, in element-array order.
    my_elements: Vec<usize>,
    boundaries: Vec<Boundary>,
}

impl Partition {
    pub fn new(my_rank: usize, nodes: Vec<Node>, elements: Vec<QuadElement>) -> Self {
        Self {
            my_rank,
            nodes,
            elements,
            my_nodes: Vec::new(),
            my_elements: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    pub fn rank(&self) -> usize {
        self.my_rank
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn elements(&self) -> &[QuadElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [QuadElement] {
        &mut self.elements
    }

    pub fn owned_node_indices(&self) -> &[usize] {
        &self.my_nodes
    }

    pub fn owned_element_indices(&self) -> &[usize] {
        &self.my_elements
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn set_boundaries(&mut self, boundaries: Vec<Boundary>) {
        self.boundaries = boundaries;
    }

    /// Split the shared topology into owned subsets, assign local node
    /// indices, and register every owned node that borders another
    /// partition with the communication directory under each *other* rank
    /// it touches.
    ///
    /// Nodes are scanned in node-array order, so any two partitions
    /// enumerate a shared pair's nodes identically; the peer buffers come
    /// out isomorphic without an index handshake.
    pub fn find_own_data(&mut self, comm: &mut CommDirectory) {
        self.my_elements = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.rank() == self.my_rank)
            .map(|(i, _)| i)
            .collect();

        self.my_nodes.clear();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if !node.is_on_rank(self.my_rank) {
                continue;
            }
            node.local_index = Some(self.my_nodes.len());
            self.my_nodes.push(i);
            if node.is_shared() {
                for &rank in node.ranks() {
                    if rank != self.my_rank {
                        comm.register_shared_node(rank, i);
                    }
                }
            }
        }
        log::info!(
            "rank {}: {} owned nodes, {} owned elements, {} peer partitions",
            self.my_rank,
            self.my_nodes.len(),
            self.my_elements.len(),
            comm.peer_buffers().len()
        );
    }

    /// Zero all owned field data (fresh start without a checkpoint).
    pub fn clear_field_data(&mut self) {
        for &ni in &self.my_nodes {
            let node = &mut self.nodes[ni];
            node.velocity = nalgebra::Vector2::zeros();
            node.velocity_delta = nalgebra::Vector2::zeros();
        }
        for &ei in &self.my_elements {
            self.elements[ei].set_pressure(0.0);
        }
    }

    /// Phase-1 invariants: clear owned masses, accumulate element
    /// contributions, then stage the shared-boundary masses for exchange.
    /// The exchange itself is the driver's job.
    pub fn calc_invariants_1(
        &mut self,
        re: f64,
        comm: &mut CommDirectory,
    ) -> Result<(), FlowError> {
        log::debug!("calc_invariants_1 start");
        for &ni in &self.my_nodes {
            self.nodes[ni].clear_mass();
        }
        for &ei in &self.my_elements {
            self.elements[ei].calc_invariants_1(&mut self.nodes, re)?;
        }
        comm.gather_mass(&self.nodes);
        log::debug!("calc_invariants_1 end");
        Ok(())
    }

    /// Phase-2 invariants: fold in the neighbors' mass contributions,
    /// invert the now-complete masses and derive everything that needs
    /// `1/m`. Precondition: the mass exchange has completed.
    pub fn calc_invariants_2(
        &mut self,
        delta_t: f64,
        relaxation: f64,
        comm: &CommDirectory,
    ) -> Result<(), FlowError> {
        log::debug!("calc_invariants_2 start");
        comm.distribute_mass(&mut self.nodes);
        for &ni in &self.my_nodes {
            self.nodes[ni].invert_mass(ni)?;
            self.nodes[ni].cache_dt_by_mass(delta_t);
        }
        for &ei in &self.my_elements {
            self.elements[ei].calc_invariants_2(&self.nodes, delta_t, relaxation);
        }
        log::debug!("calc_invariants_2 end");
        Ok(())
    }

    /// Predictor over the owned elements.
    pub fn calc_velocity_prediction(&mut self) {
        for &ei in &self.my_elements {
            self.elements[ei].calc_velocity_prediction(&mut self.nodes);
        }
    }

    pub fn gather_velocity_delta(&self, comm: &mut CommDirectory) {
        comm.gather_velocity_delta(&self.nodes);
    }

    pub fn distribute_velocity_delta(&mut self, comm: &CommDirectory) {
        comm.distribute_velocity_delta(&mut self.nodes);
    }

    /// Fold each owned node's accumulated delta into its velocity, then
    /// reset the accumulator.
    pub fn apply_velocity_delta_and_clear(&mut self) {
        for &ni in &self.my_nodes {
            self.nodes[ni].apply_velocity_delta();
            self.nodes[ni].clear_velocity_delta();
        }
    }

    /// Re-impose every boundary group's Dirichlet velocities for time `t`.
    pub fn apply_boundary_conditions(&mut self, t: f64, t_ramp: f64) {
        for boundary in &self.boundaries {
            boundary.apply(&mut self.nodes, t, t_ramp);
        }
    }

    /// Evaluate each owned element's discriminant; correct those above the
    /// tolerance. Returns whether any element was still diverging.
    pub fn calc_divergence_and_correct(&mut self, epsilon: f64) -> bool {
        let mut diverging = false;
        for &ei in &self.my_elements {
            let d = self.elements[ei].calc_discriminant(&self.nodes);
            if d.abs() > epsilon {
                self.elements[ei].correct_velocity(&mut self.nodes);
                diverging = true;
            }
        }
        diverging
    }

    /// Discard residual deltas (used when the correction loop converges
    /// with contributions still staged).
    pub fn clear_velocity_delta(&mut self) {
        for &ni in &self.my_nodes {
            self.nodes[ni].clear_velocity_delta();
        }
    }
}
