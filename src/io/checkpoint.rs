//! Binary checkpoint store for restartable runs.
//!
//! The record is raw f64 values in a fixed order: simulation time, then
//! (vx, vy) per owned node, then pressure per owned element, matching the
//! owned-node/owned-element array order. A missing file is not an error; it
//! means a fresh start.

use std::path::Path;

use crate::error::FlowError;
use crate::solver::partition::Partition;

/// Field state recovered from a checkpoint file.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub t: f64,
    /// (vx, vy) per owned node.
    pub velocities: Vec<(f64, f64)>,
    /// Pressure per owned element.
    pub pressures: Vec<f64>,
}

/// Write the partition's owned field state.
pub fn save(path: &Path, t: f64, partition: &Partition) -> Result<(), FlowError> {
    let nodes = partition.nodes();
    let elements = partition.elements();
    let mut values =
        Vec::with_capacity(1 + 2 * partition.owned_node_indices().len()
            + partition.owned_element_indices().len());
    values.push(t);
    for &ni in partition.owned_node_indices() {
        values.push(nodes[ni].velocity.x);
        values.push(nodes[ni].velocity.y);
    }
    for &ei in partition.owned_element_indices() {
        values.push(elements[ei].pressure());
    }
    std::fs::write(path, bytemuck::cast_slice::<f64, u8>(&values))
        .map_err(|e| FlowError::io(path, e))?;
    log::info!("checkpoint written: {}", path.display());
    Ok(())
}

/// Read a checkpoint sized for `n_nodes` owned nodes and `n_elements` owned
/// elements. `Ok(None)` when the file does not exist; a file of the wrong
/// length is a data error.
pub fn load(
    path: &Path,
    n_nodes: usize,
    n_elements: usize,
) -> Result<Option<Checkpoint>, FlowError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("no checkpoint at {}, starting from zero state", path.display());
            return Ok(None);
        }
        Err(e) => return Err(FlowError::io(path, e)),
    };

    let expected = 1 + 2 * n_nodes + n_elements;
    if bytes.len() != expected * std::mem::size_of::<f64>() {
        return Err(FlowError::Data {
            file: path.display().to_string(),
            line: 0,
            message: format!(
                "checkpoint holds {} bytes, expected {} ({} values)",
                bytes.len(),
                expected * std::mem::size_of::<f64>(),
                expected
            ),
        });
    }
    let values: Vec<f64> = bytemuck::pod_collect_to_vec(&bytes);

    let t = values[0];
    let mut velocities = Vec::with_capacity(n_nodes);
    for j in 0..n_nodes {
        velocities.push((values[1 + 2 * j], values[2 + 2 * j]));
    }
    let pressures = values[1 + 2 * n_nodes..].to_vec();
    log::info!("checkpoint read: {} (t = {})", path.display(), t);
    Ok(Some(Checkpoint {
        t,
        velocities,
        pressures,
    }))
}

/// Apply a loaded checkpoint onto the partition's owned field state.
pub fn restore(partition: &mut Partition, checkpoint: &Checkpoint) {
    let owned_nodes = partition.owned_node_indices().to_vec();
    for (&ni, &(vx, vy)) in owned_nodes.iter().zip(&checkpoint.velocities) {
        let node = &mut partition.nodes_mut()[ni];
        node.velocity.x = vx;
        node.velocity.y = vy;
    }
    let owned_elements = partition.owned_element_indices().to_vec();
    for (&ei, &p) in owned_elements.iter().zip(&checkpoint.pressures) {
        partition.elements_mut()[ei].set_pressure(p);
    }
}
