//! Mesh and boundary-condition file loaders.
//!
//! External files index nodes and elements from 1; internal storage is
//! 0-based. Every record echoes its own index and the echo is checked, so a
//! truncated or reordered file fails fast with the offending line.

use std::path::Path;

use crate::error::FlowError;
use crate::io::reader::LineReader;
use crate::mesh::{Boundary, Node, QuadElement};

/// A parsed mesh file: shared topology plus the partition count it was
/// decomposed for.
#[derive(Debug, Clone)]
pub struct MeshFile {
    pub num_partitions: usize,
    pub nodes: Vec<Node>,
    pub elements: Vec<QuadElement>,
}

/// Read a mesh file: header `n_procs n_nodes n_elems`, then one line per
/// node (`index x y`) and one per element (`index n1 n2 n3 n4 rank`).
///
/// Element ranks are recorded onto the corner nodes, which is how node
/// ownership and partition-boundary membership are derived.
pub fn load_mesh(path: &Path) -> Result<MeshFile, FlowError> {
    log::info!("reading mesh file {}", path.display());
    let mut rdr = LineReader::open(path)?;

    rdr.next_line()?;
    // Checked before the usize casts: a negative count would wrap into an
    // absurd allocation size.
    let num_partitions = rdr.take_int("number of processes")?;
    let n_nodes = rdr.take_int("number of nodes")?;
    let n_elems = rdr.take_int("number of elements")?;
    for (count, what) in [
        (num_partitions, "process count"),
        (n_nodes, "node count"),
        (n_elems, "element count"),
    ] {
        if count < 1 {
            return Err(rdr.data_error(format!("{what} must be positive, found {count}")));
        }
    }
    let num_partitions = num_partitions as usize;
    let n_nodes = n_nodes as usize;
    let n_elems = n_elems as usize;

    let mut nodes = Vec::with_capacity(n_nodes);
    for j in 1..=n_nodes {
        rdr.next_line()?;
        rdr.take_expected_int(j as i64, "node index")?;
        let x = rdr.take_f64("X")?;
        let y = rdr.take_f64("Y")?;
        nodes.push(Node::new(x, y));
    }

    let mut elements = Vec::with_capacity(n_elems);
    for i in 1..=n_elems {
        rdr.next_line()?;
        rdr.take_expected_int(i as i64, "element index")?;
        let mut corners = [0usize; 4];
        for (c, corner) in corners.iter_mut().enumerate() {
            let raw = rdr.take_int(&format!("node{}", c + 1))?;
            if raw < 1 || raw as usize > n_nodes {
                return Err(rdr.data_error(format!(
                    "node index {raw} out of range 1..={n_nodes}"
                )));
            }
            *corner = raw as usize - 1;
        }
        let rank = rdr.take_int("rank")?;
        if rank < 0 || rank as usize >= num_partitions {
            return Err(rdr.data_error(format!(
                "rank {rank} out of range 0..{num_partitions}"
            )));
        }
        let rank = rank as usize;
        for &corner in &corners {
            nodes[corner].add_rank(rank);
        }
        elements.push(QuadElement::new(i - 1, corners, rank));
    }

    log::info!("finished reading mesh file");
    Ok(MeshFile {
        num_partitions,
        nodes,
        elements,
    })
}

/// Read a boundary-condition file: a group count, then per group a header
/// (`index n_nodes`), a node-index line, and the six u- and six
/// v-polynomial coefficients.
///
/// Referenced nodes are filtered down to the ones `my_rank` owns; a group
/// may come out empty on partitions it does not touch.
pub fn load_boundaries(
    path: &Path,
    nodes: &[Node],
    my_rank: usize,
) -> Result<Vec<Boundary>, FlowError> {
    log::info!("reading boundary file {}", path.display());
    let mut rdr = LineReader::open(path)?;

    rdr.next_line()?;
    let num_groups = rdr.take_int("number of boundaries")?;
    if num_groups < 0 {
        return Err(rdr.data_error(format!("negative boundary count {num_groups}")));
    }

    let mut boundaries = Vec::with_capacity(num_groups as usize);
    for g in 1..=num_groups {
        rdr.next_line()?;
        rdr.take_expected_int(g, "boundary index")?;
        let n_members = rdr.take_int("number of nodes")? as usize;

        let mut boundary = Boundary::default();
        rdr.next_line()?;
        for _ in 0..n_members {
            let raw = rdr.take_int("node index")?;
            if raw < 1 || raw as usize > nodes.len() {
                return Err(rdr.data_error(format!(
                    "node index {raw} out of range 1..={}",
                    nodes.len()
                )));
            }
            let ni = raw as usize - 1;
            if nodes[ni].is_on_rank(my_rank) {
                boundary.add_node(ni);
            }
        }

        rdr.next_line()?;
        for (k, slot) in boundary.u_coeffs.iter_mut().enumerate() {
            *slot = rdr.take_f64(&format!("a{k}"))?;
        }
        rdr.next_line()?;
        for (k, slot) in boundary.v_coeffs.iter_mut().enumerate() {
            *slot = rdr.take_f64(&format!("b{k}"))?;
        }
        boundaries.push(boundary);
    }

    log::info!("finished reading boundary file");
    Ok(boundaries)
}
