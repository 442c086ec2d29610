// solver.rs - Launch the external parallel solver inside a case directory

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::{info, warn};

use crate::case::case_prefix;
use crate::error::{CaseError, Result};

/// How to start the solver: `<launcher> -n <procs> <solver>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverLauncher {
    pub launcher: String,
    pub solver:   String,
}

impl Default for SolverLauncher {
    fn default() -> Self {
        Self {
            launcher: "mpiexec".to_string(),
            solver:   "mpimcfd".to_string(),
        }
    }
}

impl SolverLauncher {
    pub fn command_line(&self, process_count: usize) -> String {
        format!("{} -n {} {}", self.launcher, process_count, self.solver)
    }

    /// Run the solver in `case_dir` until it exits.
    ///
    /// stdout and stderr both go to `<case_dir>/<case_name>.log`. There is no
    /// timeout: a hung solver blocks the caller.
    pub fn run(&self, case_name: &str, case_dir: &Path, process_count: usize) -> Result<ExitStatus> {
        let prefix = case_prefix(case_name);
        let log_path: PathBuf = case_dir.join(format!("{case_name}.log"));
        let log = File::create(&log_path).map_err(|e| CaseError::io(&log_path, e))?;
        let log_err = log.try_clone().map_err(|e| CaseError::io(&log_path, e))?;

        info!("{prefix}{} > {}", self.command_line(process_count), log_path.display());

        let status = Command::new(&self.launcher)
            .arg("-n")
            .arg(process_count.to_string())
            .arg(&self.solver)
            .current_dir(case_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .status()
            .map_err(|e| CaseError::Solver(format!("{prefix}could not execute '{}': {e}", self.launcher)))?;

        if status.success() {
            info!("{prefix}Computation finished!!!");
        } else {
            warn!("{prefix}solver exited with {status}, see {}", log_path.display());
        }
        Ok(status)
    }
}
