//! ASCII legacy VTK snapshot writer (`UNSTRUCTURED_GRID`).
//!
//! Writes the partition's owned nodes and elements: point positions with
//! z = 0, quad cells (VTK type 9) through local node indices, a point-data
//! velocity vector field and a cell-data pressure scalar field.

use std::io::Write;
use std::path::Path;

use crate::error::FlowError;
use crate::solver::partition::Partition;

const VTK_QUAD: u8 = 9;

/// Write one snapshot of the owned field state.
pub fn write_snapshot(path: &Path, partition: &Partition) -> Result<(), FlowError> {
    let file = std::fs::File::create(path).map_err(|e| FlowError::io(path, e))?;
    let mut out = std::io::BufWriter::new(file);
    write_grid(&mut out, path, partition).map_err(|e| FlowError::io(path, e))?;
    log::debug!("snapshot written: {}", path.display());
    Ok(())
}

fn write_grid(
    out: &mut impl Write,
    path: &Path,
    partition: &Partition,
) -> Result<(), std::io::Error> {
    let nodes = partition.nodes();
    let elements = partition.elements();
    let owned_nodes = partition.owned_node_indices();
    let owned_elements = partition.owned_element_indices();

    writeln!(out, "# vtk DataFile Version 2.0")?;
    writeln!(out, "{}", path.display())?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET UNSTRUCTURED_GRID")?;

    writeln!(out, "POINTS {} double", owned_nodes.len())?;
    for &ni in owned_nodes {
        let p = nodes[ni].position;
        writeln!(out, "{} {} 0.0", p.x, p.y)?;
    }
    writeln!(out)?;

    writeln!(out, "CELLS {} {}", owned_elements.len(), owned_elements.len() * 5)?;
    for &ei in owned_elements {
        write!(out, "4")?;
        for corner in elements[ei].node_indices() {
            // Owned elements only reference owned nodes, so the local index
            // has been assigned by find_own_data.
            let local = nodes[corner]
                .local_index
                .expect("owned element corner has a local index");
            write!(out, " {local}")?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    writeln!(out, "CELL_TYPES {}", owned_elements.len())?;
    for _ in owned_elements {
        writeln!(out, "{VTK_QUAD}")?;
    }
    writeln!(out)?;

    writeln!(out, "POINT_DATA {}", owned_nodes.len())?;
    writeln!(out, "VECTORS velocity double")?;
    for &ni in owned_nodes {
        let v = nodes[ni].velocity;
        writeln!(out, "{} {} 0", v.x, v.y)?;
    }
    writeln!(out)?;

    writeln!(out, "CELL_DATA {}", owned_elements.len())?;
    writeln!(out, "SCALARS pressure double")?;
    writeln!(out, "LOOKUP_TABLE default")?;
    for &ei in owned_elements {
        writeln!(out, "{}", elements[ei].pressure())?;
    }
    writeln!(out)?;
    out.flush()
}
