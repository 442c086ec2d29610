// src/bin/detect_driver.rs - Report whether a case runs in cl-driver mode

use std::path::PathBuf;
use clap::Parser;
use clalpha::patcher::{InputPatcher, KeyMatcher};

#[derive(Parser)]
struct Cli {
    /// Case directories to inspect
    #[arg(required = true)]
    cases: Vec<PathBuf>,

    /// Match the `cldriver` key exactly
    #[arg(long)]
    strict_keys: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    for dir in &args.cases {
        let cl_driver = if args.strict_keys {
            InputPatcher::with_matcher(KeyMatcher).detect_cl_driver(dir)?
        } else {
            InputPatcher::new().detect_cl_driver(dir)?
        };
        let mode = if cl_driver { "cl-driver" } else { "fixed-alpha" };
        println!("{}\t{mode}", dir.display());
    }
    Ok(())
}
