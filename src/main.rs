//! Command-line entry point.
//!
//! Usage: `quadflow <casefile>`. With the `mpi-support` feature the binary
//! runs one partition per MPI rank; without it, it runs the whole case as a
//! single partition. `QUADFLOW_TIME_BUDGET_SECS` caps the wall-clock time; a
//! run cut short by the budget checkpoints and can be restarted.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use quadflow::comm::Transport;
use quadflow::logging::RankLog;
use quadflow::{CaseConfig, Driver, FlowError};

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(case) = args.next() else {
        eprintln!("usage: quadflow <casefile>");
        return ExitCode::FAILURE;
    };
    match run(Path::new(&case)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("quadflow: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "mpi-support")]
fn run(case: &Path) -> Result<(), FlowError> {
    let Some(transport) = quadflow::comm::MpiTransport::init() else {
        eprintln!("quadflow: MPI was already initialized in this process");
        return Ok(());
    };
    run_with(case, transport)
}

#[cfg(not(feature = "mpi-support"))]
fn run(case: &Path) -> Result<(), FlowError> {
    run_with(case, quadflow::comm::NoTransport)
}

fn run_with<T: Transport>(case: &Path, transport: T) -> Result<(), FlowError> {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    } else {
        RankLog::install(case, transport.rank())?;
    }

    let config = CaseConfig::load(case)?;
    let mut driver = Driver::new(config, transport);
    driver.set_wall_clock_budget(wall_clock_budget());
    driver.run()
}

fn wall_clock_budget() -> Option<Duration> {
    let raw = std::env::var("QUADFLOW_TIME_BUDGET_SECS").ok()?;
    match raw.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            eprintln!("quadflow: ignoring malformed QUADFLOW_TIME_BUDGET_SECS {raw:?}");
            None
        }
    }
}
