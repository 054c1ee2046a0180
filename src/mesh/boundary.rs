//! Dirichlet boundary group: a set of constrained nodes and a quadratic
//! velocity profile with a cosine ramp-up schedule.

use crate::mesh::node::Node;

/// Quadratic-in-position velocity profile applied to a group of nodes.
///
/// Velocities are overwritten, not accumulated: the condition is re-imposed
/// in full every time `apply` runs, so applying twice at the same `t` is
/// idempotent.
#[derive(Debug, Clone, Default)]
pub struct Boundary {
    /// Constrained node indices; only locally owned nodes are registered.
    nodes: Vec<usize>,
    /// u(x,y) = a0 + a1 x + a2 y + a3 x^2 + a4 xy + a5 y^2.
    pub u_coeffs: [f64; 6],
    /// v(x,y), same polynomial basis.
    pub v_coeffs: [f64; 6],
}

fn eval_quadratic(c: &[f64; 6], x: f64, y: f64) -> f64 {
    c[0] + c[1] * x + c[2] * y + c[3] * x * x + c[4] * x * y + c[5] * y * y
}

impl Boundary {
    pub fn new(u_coeffs: [f64; 6], v_coeffs: [f64; 6]) -> Self {
        Self {
            nodes: Vec::new(),
            u_coeffs,
            v_coeffs,
        }
    }

    pub fn add_node(&mut self, node: usize) {
        self.nodes.push(node);
    }

    pub fn node_indices(&self) -> &[usize] {
        &self.nodes
    }

    /// Impose the profile on every constrained node at time `t`, scaled by
    /// the ramp weight `(1 - cos(pi t / t_ramp)) / 2` until `t_ramp`, 1
    /// afterwards.
    pub fn apply(&self, nodes: &mut [Node], t: f64, t_ramp: f64) {
        let weight = if t < t_ramp {
            (1.0 - (std::f64::consts::PI * t / t_ramp).cos()) / 2.0
        } else {
            1.0
        };
        for &ni in &self.nodes {
            let node = &mut nodes[ni];
            let (x, y) = (node.position.x, node.position.y);
            node.velocity.x = eval_quadratic(&self.u_coeffs, x, y) * weight;
            node.velocity.y = eval_quadratic(&self.v_coeffs, x, y) * weight;
        }
    }
}
