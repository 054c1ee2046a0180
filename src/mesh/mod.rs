//! Mesh data model: nodes, quadrilateral elements and Dirichlet boundary
//! groups, plus the per-element numerical kernels.

pub mod boundary;
pub mod element;
pub mod node;

pub use boundary::Boundary;
pub use element::QuadElement;
pub use node::Node;
