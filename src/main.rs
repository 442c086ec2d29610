//! Stage, patch and (optionally) run one CFD++ case of a CL–alpha sweep.
//!
//! Parameters come from an optional TOML case file; flags given on the
//! command line override it.
//
//  Example:  `clalpha --case aoa05 --from aoa00 --nprocs 16 --alpha 5.0 --ntstep 300 --run`

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use clalpha::solver::SolverLauncher;
use clalpha::{CaseConfig, CaseRunner, RunnerOptions};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML case file (fields of `CaseConfig`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the new case
    #[arg(long = "case")]
    case_name: Option<String>,

    /// Case to restart from
    #[arg(long = "from")]
    source_case: Option<String>,

    /// Number of MPI processes
    #[arg(long)]
    nprocs: Option<usize>,

    /// Angle of attack in degrees
    #[arg(long, allow_hyphen_values = true)]
    alpha: Option<f64>,

    /// Number of time steps
    #[arg(long)]
    ntstep: Option<u64>,

    /// Start from scratch instead of restarting
    #[arg(long)]
    no_restart: bool,

    /// Force cl-driver mode on or off (default: inherit from source case)
    #[arg(long)]
    cl_driver: Option<bool>,

    /// Directory holding the case directories
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Launch the solver after patching
    #[arg(long)]
    run: bool,

    #[arg(long, default_value = "mpiexec")]
    launcher: String,

    #[arg(long, default_value = "mpimcfd")]
    solver: String,

    /// CSV ledger the case is appended to
    #[arg(long, default_value = "cases.csv")]
    ledger: PathBuf,

    /// Do not write the ledger
    #[arg(long)]
    no_ledger: bool,

    /// Match parameter keys exactly instead of by substring
    #[arg(long)]
    strict_keys: bool,

    #[arg(short, long)]
    verbose: bool,

    /// No progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn case_config(&self) -> Result<CaseConfig, Box<dyn std::error::Error>> {
        let mut cfg = match &self.config {
            Some(path) => CaseConfig::from_toml_file(path)?,
            None => CaseConfig::default(),
        };
        if let Some(name) = &self.case_name { cfg.case_name = name.clone(); }
        if let Some(name) = &self.source_case { cfg.source_case = name.clone(); }
        if let Some(n) = self.nprocs { cfg.process_count = n; }
        if let Some(a) = self.alpha { cfg.alpha_deg = a; }
        if let Some(n) = self.ntstep { cfg.step_count = n; }
        if self.no_restart { cfg.is_restart = false; }
        if self.cl_driver.is_some() { cfg.cl_driver = self.cl_driver; }
        Ok(cfg)
    }

    fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            root:          self.root.clone(),
            strict_keys:   self.strict_keys,
            show_progress: !self.quiet,
            launcher:      self.run.then(|| SolverLauncher {
                launcher: self.launcher.clone(),
                solver:   self.solver.clone(),
            }),
            ledger:        (!self.no_ledger).then(|| self.root.join(&self.ledger)),
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let cfg = args.case_config()?;
    info!("Configuration:\n{cfg:#?}");
    let prefix = cfg.prefix();

    let runner = CaseRunner::new(cfg, args.runner_options());
    match runner.run() {
        Ok(outcome) => {
            info!(
                "{prefix}done: {} files, velocity ({}, {}, {})",
                outcome.files_copied, outcome.velocity.x, outcome.velocity.y, outcome.velocity.z
            );
            Ok(())
        }
        Err(e) => {
            error!("{prefix}{e}");
            Err(e.into())
        }
    }
}
