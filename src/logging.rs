//! Per-rank file logging.
//!
//! Each rank writes its own `<prefix>_rNNNNN.log` so interleaved output from
//! concurrently running partitions never mixes. Installation is global and
//! once per process; a second install attempt is ignored.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

use crate::error::FlowError;
use crate::io::rank_scoped;

pub struct RankLog {
    rank: usize,
    file: Mutex<File>,
}

impl RankLog {
    /// Open `<prefix>_rNNNNN.log` and install it as the global logger.
    pub fn install(prefix: &Path, rank: usize) -> Result<(), FlowError> {
        let path = rank_scoped(&prefix.with_extension("log"), rank);
        let file = File::create(&path).map_err(|e| FlowError::io(&path, e))?;
        let logger = Box::new(RankLog {
            rank,
            file: Mutex::new(file),
        });
        if log::set_boxed_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
        Ok(())
    }
}

impl Log for RankLog {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut file = self.file.lock();
        let _ = writeln!(
            file,
            "[{:5}] [rank {}] {}",
            record.level(),
            self.rank,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = self.file.lock().flush();
    }
}
