// runner.rs - One case end to end: validate, stage, patch, launch, record

use std::path::PathBuf;
use std::process::ExitStatus;

use log::info;

use crate::case::{CaseConfig, Velocity};
use crate::error::Result;
use crate::ledger::CaseLedger;
use crate::patcher::{InputPatcher, KeyMatcher, LineMatcher, PatchParams, PatchSummary, SubstringMatcher};
use crate::solver::SolverLauncher;
use crate::stager::CaseStager;

/// How a case is run, as opposed to what it computes.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Directory holding the case directories.
    pub root:          PathBuf,
    /// Match parameter keys exactly instead of by containment.
    pub strict_keys:   bool,
    pub show_progress: bool,
    /// `None` stops after patching.
    pub launcher:      Option<SolverLauncher>,
    pub ledger:        Option<PathBuf>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            root:          PathBuf::from("."),
            strict_keys:   false,
            show_progress: false,
            launcher:      None,
            ledger:        None,
        }
    }
}

/// Result of a finished case.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub config:          CaseConfig,
    pub case_dir:        PathBuf,
    pub files_copied:    usize,
    pub cl_driver:       bool,
    pub source_velocity: Velocity,
    pub velocity:        Velocity,
    pub solver_status:   Option<ExitStatus>,
}

pub struct CaseRunner {
    config:  CaseConfig,
    options: RunnerOptions,
}

impl CaseRunner {
    pub fn new(config: CaseConfig, options: RunnerOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &CaseConfig {
        &self.config
    }

    /// Any error stops the case; nothing already written is rolled back.
    pub fn run(&self) -> Result<CaseOutcome> {
        let cfg = &self.config;
        cfg.validate()?;
        let prefix = cfg.prefix();

        let report = CaseStager::new(&self.options.root, cfg.process_count)
            .with_progress(self.options.show_progress)
            .stage(&cfg.source_case, &cfg.case_name)?;

        let (cl_driver, summary) = if self.options.strict_keys {
            self.patch(&InputPatcher::with_matcher(KeyMatcher))?
        } else {
            self.patch(&InputPatcher::with_matcher(SubstringMatcher))?
        };

        let solver_status = match &self.options.launcher {
            Some(launcher) => Some(launcher.run(&cfg.case_name, &report.target, cfg.process_count)?),
            None => None,
        };

        let outcome = CaseOutcome {
            config: cfg.clone(),
            case_dir: report.target,
            files_copied: report.copied,
            cl_driver,
            source_velocity: summary.source.velocity,
            velocity: summary.patched.velocity,
            solver_status,
        };

        if let Some(path) = &self.options.ledger {
            let ledger = CaseLedger::new(path);
            ledger.append(&outcome)?;
            info!("{prefix}recorded in {}", ledger.path().display());
        }
        Ok(outcome)
    }

    /// Resolve the driver mode on the staged copy, then patch it.
    fn patch<M: LineMatcher>(&self, patcher: &InputPatcher<M>) -> Result<(bool, PatchSummary)> {
        let cfg = &self.config;
        let case_dir = cfg.case_dir(&self.options.root);

        let cl_driver = match cfg.cl_driver {
            Some(mode) => mode,
            None => {
                let inherited = patcher.detect_cl_driver(&case_dir)?;
                info!("{}inherits cl-driver mode {inherited} from {}", cfg.prefix(), cfg.source_case);
                inherited
            }
        };
        let params = PatchParams {
            is_restart: cfg.is_restart,
            step_count: cfg.step_count,
            alpha_deg:  cfg.alpha_deg,
            cl_driver,
        };
        let summary = patcher.patch_case(&case_dir, &params)?;
        Ok((cl_driver, summary))
    }
}
