//! Case configuration: physical constants, time-stepping controls and the
//! paths of the other input/output files.
//!
//! The case file is a fixed sequence of `label value` lines; a missing or
//! misspelled label is a data error, not a default.

use std::path::{Path, PathBuf};

use crate::error::FlowError;
use crate::io::reader::LineReader;

#[derive(Debug, Clone)]
pub struct CaseConfig {
    /// Reynolds number.
    pub reynolds: f64,
    /// Time-step size.
    pub delta_t: f64,
    /// Total simulated duration.
    pub duration: f64,
    /// Ramp-up period for the boundary velocity profiles.
    pub t_ramp: f64,
    /// Snapshot output interval, in rounds.
    pub output_interval: u64,
    /// Convergence tolerance for the per-element discriminant.
    pub epsilon: f64,
    /// Upper bound on correction iterations per time step.
    pub max_corrections: usize,
    /// Relaxation factor for the pressure correction.
    pub relaxation: f64,
    pub mesh_path: PathBuf,
    pub boundary_path: PathBuf,
    pub output_path: PathBuf,
    pub checkpoint_path: PathBuf,
}

impl CaseConfig {
    /// Read a case file. Labels must appear in the fixed order below.
    pub fn load(path: &Path) -> Result<Self, FlowError> {
        let mut rdr = LineReader::open(path)?;
        let reynolds = rdr.labeled_f64("Re")?;
        let delta_t = rdr.labeled_f64("delta_t")?;
        let duration = rdr.labeled_f64("T")?;
        let t_ramp = rdr.labeled_f64("T_ramp")?;
        // The interval divides the round counter, so zero is as fatal as a
        // negative value.
        let output_interval = rdr.labeled_int("N_interval")?;
        if output_interval < 1 {
            return Err(rdr.data_error(format!(
                "N_interval must be positive, found {output_interval}"
            )));
        }
        let epsilon = rdr.labeled_f64("epsilon")?;
        let max_corrections = rdr.labeled_int("max_corrections")?;
        if max_corrections < 1 {
            return Err(rdr.data_error(format!(
                "max_corrections must be positive, found {max_corrections}"
            )));
        }
        let config = Self {
            reynolds,
            delta_t,
            duration,
            t_ramp,
            output_interval: output_interval as u64,
            epsilon,
            max_corrections: max_corrections as usize,
            relaxation: rdr.labeled_f64("relaxation")?,
            mesh_path: rdr.labeled_str("mesh")?.into(),
            boundary_path: rdr.labeled_str("boundary")?.into(),
            output_path: rdr.labeled_str("outfile")?.into(),
            checkpoint_path: rdr.labeled_str("tmpfile")?.into(),
        };
        log::info!(
            "case loaded: Re={} dt={} T={} eps={}",
            config.reynolds,
            config.delta_t,
            config.duration,
            config.epsilon
        );
        Ok(config)
    }
}
