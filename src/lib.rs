pub mod error;
pub mod case;
pub mod stager;
pub mod patcher;
pub mod solver;
pub mod ledger;
pub mod runner;
pub mod utils;

pub use case::{CaseConfig, Velocity};
pub use error::{CaseError, Result};
pub use runner::{CaseOutcome, CaseRunner, RunnerOptions};
