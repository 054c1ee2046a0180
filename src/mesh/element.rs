//! Quadrilateral element: per-element numerical invariants and the
//! predictor/corrector kernels of the velocity-pressure simultaneous
//! relaxation scheme.
//!
//! Elements reference nodes by index into the partition's node arena. The
//! four corners must be ordered counter-clockwise; a reversed element shows
//! up as a non-positive signed area and is rejected.
//!
//! Invariants come in two phases because lumped mass is accumulated by all
//! partitions sharing a node and must be globally summed before its inverse
//! may be used: phase 1 needs only local geometry, phase 2 needs `1/m`.

use nalgebra::{Matrix4, Vector4};

use crate::error::FlowError;
use crate::mesh::node::Node;

/// Bilinear shape-function coefficients, identical for every element.
const SHAPE_A: [f64; 4] = [0.25, 0.25, 0.25, 0.25];
const SHAPE_B: [f64; 4] = [-0.25, 0.25, 0.25, -0.25];
const SHAPE_C: [f64; 4] = [-0.25, -0.25, 0.25, 0.25];
const SHAPE_D: [f64; 4] = [0.25, -0.25, 0.25, -0.25];

#[derive(Debug, Clone)]
pub struct QuadElement {
    /// Corner node indices into the partition node arena, counter-clockwise.
    nodes: [usize; 4],
    /// Owning partition.
    rank: usize,
    /// Zero-based element index, for diagnostics.
    index: usize,

    // Shape-function derivative vectors, one component set per corner.
    a_nx: Vector4<f64>,
    a_ny: Vector4<f64>,
    b_nx: Vector4<f64>,
    b_ny: Vector4<f64>,
    r_nx: Vector4<f64>,
    r_ny: Vector4<f64>,

    /// Diffusion operator, scaled by `1/(Re * 6 * alpha)`.
    diffusion: Matrix4<f64>,
    /// Pressure-gradient operators.
    hx: Vector4<f64>,
    hy: Vector4<f64>,
    /// `H / size`, the discriminant weights.
    hx_by_size: Vector4<f64>,
    hy_by_size: Vector4<f64>,
    /// `delta_t * H / m` per corner, the corrector weights.
    dt_hx_by_m: Vector4<f64>,
    dt_hy_by_m: Vector4<f64>,
    /// Signed element area; strictly positive for valid orientation.
    size: f64,
    /// Pressure-correction relaxation coefficient.
    lambda: f64,

    /// Element pressure, the persistent unknown of the relaxation scheme.
    pressure: f64,
    /// Discriminant from the latest correction iteration.
    discriminant: f64,
}

impl QuadElement {
    pub fn new(index: usize, nodes: [usize; 4], rank: usize) -> Self {
        Self {
            nodes,
            rank,
            index,
            a_nx: Vector4::zeros(),
            a_ny: Vector4::zeros(),
            b_nx: Vector4::zeros(),
            b_ny: Vector4::zeros(),
            r_nx: Vector4::zeros(),
            r_ny: Vector4::zeros(),
            diffusion: Matrix4::zeros(),
            hx: Vector4::zeros(),
            hy: Vector4::zeros(),
            hx_by_size: Vector4::zeros(),
            hy_by_size: Vector4::zeros(),
            dt_hx_by_m: Vector4::zeros(),
            dt_hy_by_m: Vector4::zeros(),
            size: 0.0,
            lambda: 0.0,
            pressure: 0.0,
            discriminant: 0.0,
        }
    }

    pub fn node_indices(&self) -> [usize; 4] {
        self.nodes
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn set_pressure(&mut self, p: f64) {
        self.pressure = p;
    }

    pub fn discriminant(&self) -> f64 {
        self.discriminant
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn hx(&self) -> Vector4<f64> {
        self.hx
    }

    pub fn hy(&self) -> Vector4<f64> {
        self.hy
    }

    pub fn diffusion(&self) -> &Matrix4<f64> {
        &self.diffusion
    }

    fn corner_x(&self, nodes: &[Node]) -> (Vector4<f64>, Vector4<f64>) {
        let x = Vector4::from_fn(|i, _| nodes[self.nodes[i]].position.x);
        let y = Vector4::from_fn(|i, _| nodes[self.nodes[i]].position.y);
        (x, y)
    }

    fn corner_vel(&self, nodes: &[Node]) -> (Vector4<f64>, Vector4<f64>) {
        let u = Vector4::from_fn(|i, _| nodes[self.nodes[i]].velocity.x);
        let v = Vector4::from_fn(|i, _| nodes[self.nodes[i]].velocity.y);
        (u, v)
    }

    /// Phase-1 invariants: everything that does not need the globally
    /// summed mass. Accumulates this element's lumped-mass contribution
    /// onto its four corner nodes.
    pub fn calc_invariants_1(&mut self, nodes: &mut [Node], re: f64) -> Result<(), FlowError> {
        let (x, y) = self.corner_x(nodes);

        // Signed-area-like scalars of the bilinear map.
        let alpha = (x[0] - x[2]) * (y[1] - y[3]) + (x[1] - x[3]) * (y[2] - y[0]);
        let beta = (x[2] - x[3]) * (y[0] - y[1]) + (x[0] - x[1]) * (y[3] - y[2]);
        let gamma = (x[1] - x[2]) * (y[0] - y[3]) + (x[0] - x[3]) * (y[2] - y[1]);

        self.set_shape_derivatives(&x, &y);
        self.add_mass(nodes, alpha, beta, gamma);
        self.set_diffusion_matrix(alpha, beta, gamma, re);
        self.set_pressure_vectors();
        self.set_size(&x, &y)?;
        self.set_pressure_vectors_by_size();
        Ok(())
    }

    // Derivative vectors of the shape functions against the alpha/beta/gamma
    // directions, from the unit coefficient matrix.
    fn set_shape_derivatives(&mut self, x: &Vector4<f64>, y: &Vector4<f64>) {
        let e = Matrix4::<f64>::identity();
        for j in 0..4 {
            self.a_nx[j] =
                (e[(0, j)] - e[(2, j)]) * (x[1] - x[3]) + (e[(1, j)] - e[(3, j)]) * (x[2] - x[0]);
            self.a_ny[j] =
                (e[(0, j)] - e[(2, j)]) * (y[1] - y[3]) + (e[(1, j)] - e[(3, j)]) * (y[2] - y[0]);
            self.b_nx[j] =
                (e[(2, j)] - e[(3, j)]) * (x[0] - x[1]) + (e[(0, j)] - e[(1, j)]) * (x[3] - x[2]);
            self.b_ny[j] =
                (e[(2, j)] - e[(3, j)]) * (y[0] - y[1]) + (e[(0, j)] - e[(1, j)]) * (y[3] - y[2]);
            self.r_nx[j] =
                (e[(1, j)] - e[(2, j)]) * (x[0] - x[3]) + (e[(0, j)] - e[(3, j)]) * (x[2] - x[1]);
            self.r_ny[j] =
                (e[(1, j)] - e[(2, j)]) * (y[0] - y[3]) + (e[(0, j)] - e[(3, j)]) * (y[2] - y[1]);
        }
    }

    // Lumped-mass contribution per corner, with fixed blending weights.
    fn add_mass(&self, nodes: &mut [Node], alpha: f64, beta: f64, gamma: f64) {
        for i in 0..4 {
            nodes[self.nodes[i]].mass +=
                (3.0 * alpha * SHAPE_A[i] + beta * SHAPE_B[i] + gamma * SHAPE_C[i]) / 6.0;
        }
    }

    fn set_diffusion_matrix(&mut self, alpha: f64, beta: f64, gamma: f64, re: f64) {
        for i in 0..4 {
            for j in 0..4 {
                let val = (3.0 * self.a_ny[i] * self.a_ny[j]
                    + 3.0 * self.a_nx[i] * self.a_nx[j]
                    + self.b_ny[i] * self.b_ny[j]
                    + self.b_nx[i] * self.b_nx[j]
                    + self.r_ny[i] * self.r_ny[j]
                    + self.r_nx[i] * self.r_nx[j]
                    - beta / alpha
                        * (self.a_ny[i] * self.b_ny[j]
                            + self.a_ny[j] * self.b_ny[i]
                            + self.a_nx[i] * self.b_nx[j]
                            + self.a_nx[j] * self.b_nx[i])
                    - gamma / alpha
                        * (self.a_ny[i] * self.r_ny[j]
                            + self.a_ny[j] * self.r_ny[i]
                            + self.a_nx[i] * self.r_nx[j]
                            + self.a_nx[j] * self.r_nx[i]))
                    / (re * 6.0 * alpha);
                self.diffusion[(i, j)] = val;
            }
        }
    }

    fn set_pressure_vectors(&mut self) {
        self.hx = 0.5 * self.a_ny;
        self.hy = -0.5 * self.a_nx;
    }

    // Shoelace/trapezoid formula over the four edges.
    fn set_size(&mut self, x: &Vector4<f64>, y: &Vector4<f64>) -> Result<(), FlowError> {
        let mut val = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            val += (x[i] - x[j]) * (y[i] + y[j]) / 2.0;
        }
        if val <= 0.0 {
            return Err(FlowError::NonPositiveSize {
                element: self.index,
                size: val,
            });
        }
        self.size = val;
        Ok(())
    }

    fn set_pressure_vectors_by_size(&mut self) {
        self.hx_by_size = self.hx / self.size;
        self.hy_by_size = self.hy / self.size;
    }

    /// Phase-2 invariants; valid only after node masses have been summed
    /// across partitions and inverted.
    pub fn calc_invariants_2(&mut self, nodes: &[Node], delta_t: f64, relaxation: f64) {
        for i in 0..4 {
            let inv_m = nodes[self.nodes[i]].inv_mass;
            self.dt_hx_by_m[i] = delta_t * inv_m * self.hx[i];
            self.dt_hy_by_m[i] = delta_t * inv_m * self.hy[i];
        }

        let inv_m = Matrix4::from_diagonal(&Vector4::from_fn(|i, _| {
            nodes[self.nodes[i]].inv_mass
        }));
        let hx_m_hx = self.hx.dot(&(inv_m * self.hx));
        let hy_m_hy = self.hy.dot(&(inv_m * self.hy));
        self.lambda = self.size * relaxation / (delta_t * (hx_m_hx + hy_m_hy));
    }

    /// Predictor: accumulate `-(dt/m) * (A*vel - H*p + D*vel)` onto each
    /// corner's velocity delta. Additive because all elements sharing a
    /// node contribute.
    pub fn calc_velocity_prediction(&mut self, nodes: &mut [Node]) {
        let convection = self.convection_matrix(nodes);
        let (u, v) = self.corner_vel(nodes);

        let d_u = convection * u - self.hx * self.pressure + self.diffusion * u;
        let d_v = convection * v - self.hy * self.pressure + self.diffusion * v;
        for i in 0..4 {
            let node = &mut nodes[self.nodes[i]];
            node.velocity_delta.x += -node.dt_by_mass * d_u[i];
            node.velocity_delta.y += -node.dt_by_mass * d_v[i];
        }
    }

    // Quadratic Galerkin convection operator from the current corner
    // velocities, x and y parts built separately and summed.
    fn convection_matrix(&self, nodes: &[Node]) -> Matrix4<f64> {
        let (vel_u, vel_v) = self.corner_vel(nodes);
        let mut au = 0.0;
        let mut av = 0.0;
        let mut bu = 0.0;
        let mut bv = 0.0;
        let mut cu = 0.0;
        let mut cv = 0.0;
        let mut du = 0.0;
        let mut dv = 0.0;
        for i in 0..4 {
            au += SHAPE_A[i] * vel_u[i];
            av += SHAPE_A[i] * vel_v[i];
            bu += SHAPE_B[i] * vel_u[i];
            bv += SHAPE_B[i] * vel_v[i];
            cu += SHAPE_C[i] * vel_u[i];
            cv += SHAPE_C[i] * vel_v[i];
            du += SHAPE_D[i] * vel_u[i];
            dv += SHAPE_D[i] * vel_v[i];
        }

        let mut conv_x = Matrix4::zeros();
        let mut conv_y = Matrix4::zeros();
        for i in 0..4 {
            for j in 0..4 {
                conv_x[(i, j)] = (1.0 / 18.0)
                    * (9.0 * SHAPE_A[i] * au * self.a_ny[j]
                        + 3.0
                            * ((SHAPE_B[i] * bu + SHAPE_C[i] * cu) * self.a_ny[j]
                                + (SHAPE_A[i] * bu + SHAPE_B[i] * au) * self.b_ny[j]
                                + (SHAPE_A[i] * cu + SHAPE_C[i] * au) * self.r_ny[j])
                        + SHAPE_D[i] * du * self.a_ny[j]
                        + (SHAPE_D[i] * cu + SHAPE_C[i] * du) * self.b_ny[j]
                        + (SHAPE_D[i] * bu + SHAPE_B[i] * du) * self.r_ny[j]);

                conv_y[(i, j)] = -(1.0 / 18.0)
                    * (9.0 * SHAPE_A[i] * av * self.a_nx[j]
                        + 3.0
                            * ((SHAPE_B[i] * bv + SHAPE_C[i] * cv) * self.a_nx[j]
                                + (SHAPE_A[i] * bv + SHAPE_B[i] * av) * self.b_nx[j]
                                + (SHAPE_A[i] * cv + SHAPE_C[i] * av) * self.r_nx[j])
                        + SHAPE_D[i] * dv * self.a_nx[j]
                        + (SHAPE_D[i] * cv + SHAPE_C[i] * dv) * self.b_nx[j]
                        + (SHAPE_D[i] * bv + SHAPE_B[i] * dv) * self.r_nx[j]);
            }
        }
        conv_x + conv_y
    }

    /// Discriminant `D = (Hx/size) . u + (Hy/size) . v`, an approximation of
    /// the local velocity divergence.
    pub fn calc_discriminant(&mut self, nodes: &[Node]) -> f64 {
        let (u, v) = self.corner_vel(nodes);
        self.discriminant = self.hx_by_size.dot(&u) + self.hy_by_size.dot(&v);
        self.discriminant
    }

    /// Pressure correction `dp = -lambda * D` plus the matching velocity
    /// correction distributed onto the corners' delta accumulators.
    pub fn correct_velocity(&mut self, nodes: &mut [Node]) {
        let dp = -self.lambda * self.discriminant;
        self.pressure += dp;
        for i in 0..4 {
            let node = &mut nodes[self.nodes[i]];
            node.velocity_delta.x += self.dt_hx_by_m[i] * dp;
            node.velocity_delta.y += self.dt_hy_by_m[i] * dp;
        }
    }
}
