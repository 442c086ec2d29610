// src/bin/patch_inputs.rs - Patch the inputs of an already staged case in place

use std::path::PathBuf;
use clap::Parser;
use clalpha::patcher::{InputPatcher, PatchParams};

#[derive(Parser)]
struct Cli {
    /// Staged case directory
    case_dir: PathBuf,

    /// Angle of attack in degrees
    #[arg(long, allow_hyphen_values = true)]
    alpha: f64,

    #[arg(long, default_value = "1000")]
    ntstep: u64,

    /// Start from scratch instead of restarting
    #[arg(long)]
    no_restart: bool,

    /// Keep the case in cl-driver mode (default: inherit from the case itself)
    #[arg(long)]
    cl_driver: Option<bool>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let patcher = InputPatcher::new();
    let cl_driver = match args.cl_driver {
        Some(mode) => mode,
        None => patcher.detect_cl_driver(&args.case_dir)?,
    };
    let params = PatchParams {
        is_restart: !args.no_restart,
        step_count: args.ntstep,
        alpha_deg:  args.alpha,
        cl_driver,
    };
    let summary = patcher.patch_case(&args.case_dir, &params)?;

    println!(
        "Patched {}: |v| = {}, velx = {}, velz = {}",
        args.case_dir.display(),
        summary.source.velocity.magnitude(),
        summary.patched.velocity.x,
        summary.patched.velocity.z,
    );
    Ok(())
}
