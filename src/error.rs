//! FlowError: unified error type for quadflow public APIs.
//!
//! Every fallible operation in the crate reports through this enum; nothing
//! is retried or recovered at intermediate layers. The binary reports the
//! error to the operator and exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for quadflow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A file could not be opened, read or written.
    #[error("I/O failure on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An input file held something other than what was expected at a
    /// specific line (keyword mismatch, non-numeric field, bad index).
    #[error("invalid data in '{file}', line {line}: {message}")]
    Data {
        file: String,
        line: usize,
        message: String,
    },
    /// Element signed area came out non-positive; node ordering must be
    /// counter-clockwise, so this is a mesh data error.
    #[error("element {element}: non-positive size {size} (node ordering must be counter-clockwise)")]
    NonPositiveSize { element: usize, size: f64 },
    /// Lumped mass must be strictly positive before its inverse is taken.
    #[error("node {node}: non-positive lumped mass {mass}")]
    NonPositiveMass { node: usize, mass: f64 },
    /// Send and receive buffers for a peer must hold the same number of
    /// values; both sides register the same shared-node set.
    #[error("peer {peer}: send buffer holds {send} values but recv buffer holds {recv}")]
    BufferMismatch { peer: usize, send: usize, recv: usize },
    /// A peer delivered a payload of unexpected length.
    #[error("exchange with peer {peer}: expected {expected} values, got {got}")]
    ExchangeShape { peer: usize, expected: usize, got: usize },
}

impl FlowError {
    /// Shorthand for an I/O failure tagged with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlowError::Io {
            path: path.into(),
            source,
        }
    }
}
