//! File I/O: text loaders (case, mesh, boundary), the binary checkpoint
//! store and the VTK snapshot writer, plus per-rank file naming.

pub mod checkpoint;
pub mod mesh;
pub mod reader;
pub mod vtk;

use std::path::{Path, PathBuf};

/// Per-rank variant of a base path: `state.bin` -> `state_r00003.bin`.
pub fn rank_scoped(base: &Path, rank: usize) -> PathBuf {
    scoped(base, &format!("_r{rank:05}"))
}

/// Per-rank, per-round snapshot path:
/// `flow.vtk` -> `flow_r00003_s0000012.vtk`.
pub fn snapshot_scoped(base: &Path, rank: usize, round: u64) -> PathBuf {
    scoped(base, &format!("_r{rank:05}_s{round:07}"))
}

fn scoped(base: &Path, suffix: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let name = match base.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };
    base.with_file_name(name)
}
