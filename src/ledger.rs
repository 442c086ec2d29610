// ledger.rs - CSV record of staged cases, one row per case

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::case::format_value;
use crate::error::{CaseError, Result};
use crate::runner::CaseOutcome;

pub const LEDGER_HEADER: [&str; 12] = [
    "case", "source", "alpha", "nprocs", "ntstep", "istart", "cldriver",
    "velx", "vely", "velz", "files", "solver_exit",
];

/// Append-only CSV ledger.
#[derive(Debug, Clone)]
pub struct CaseLedger {
    path: PathBuf,
}

impl CaseLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row; the header goes in only when the file is new or empty.
    pub fn append(&self, outcome: &CaseOutcome) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CaseError::io(&self.path, e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| CaseError::io(&self.path, e))?
            .len() == 0;

        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_empty {
            wtr.write_record(LEDGER_HEADER)?;
        }

        let cfg = &outcome.config;
        // empty when the solver was not launched
        let solver_exit = match outcome.solver_status {
            Some(status) => status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
            None => String::new(),
        };
        wtr.write_record(&[
            cfg.case_name.clone(),
            cfg.source_case.clone(),
            format_value(cfg.alpha_deg),
            cfg.process_count.to_string(),
            cfg.step_count.to_string(),
            u8::from(cfg.is_restart).to_string(),
            u8::from(outcome.cl_driver).to_string(),
            format_value(outcome.velocity.x),
            format_value(outcome.velocity.y),
            format_value(outcome.velocity.z),
            outcome.files_copied.to_string(),
            solver_exit,
        ])?;
        wtr.flush().map_err(|e| CaseError::io(&self.path, e))?;
        Ok(())
    }
}
