// stager.rs - Build a fresh case directory from the files of a prior case

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::case::{case_prefix, is_case_name};
use crate::error::{CaseError, Result};

/// Main solver control input.
pub const MAIN_INPUT: &str = "mcfd.inp";
/// Reference values (carries `alpha`).
pub const REFERENCE_INPUT: &str = "infout1f.inp";
/// Partition file, suffixed with the processor count.
pub const PARTITION_PREFIX: &str = "mcpusin.bin";

/// Files a restarted case needs, in copy order.
pub fn required_files(process_count: usize) -> Vec<String> {
    vec![
        "nodesin.bin".to_string(),                       // basic input
        "mcfd.bc".to_string(),                           // basic input
        "exbcsin.bin".to_string(),                       // basic input
        "cellsin.bin".to_string(),                       // basic input
        "npfopts.inp".to_string(),                       // output settings
        "mcfd_metis.graph".to_string(),                  // mpi input
        format!("{PARTITION_PREFIX}.{process_count}"),   // mpi input
        MAIN_INPUT.to_string(),                          // main control input
        "cdepsout.bin".to_string(),                      // restart input
        REFERENCE_INPUT.to_string(),                     // reference values
    ]
}

/// Result of a complete staging run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub target: PathBuf,
    pub copied: usize,
}

/// Copies the allow-listed files of a source case into a new case directory.
#[derive(Debug, Clone)]
pub struct CaseStager {
    root:          PathBuf,
    process_count: usize,
    show_progress: bool,
}

impl CaseStager {
    /// `root` is the directory holding the case directories.
    pub fn new(root: impl Into<PathBuf>, process_count: usize) -> Self {
        Self { root: root.into(), process_count, show_progress: false }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Stage `target` from `source`.
    ///
    /// An existing target directory is removed first, never merged.
    /// On `IncompleteFileSet` the partially filled directory stays in place.
    pub fn stage(&self, source: &str, target: &str) -> Result<StageReport> {
        let prefix = case_prefix(target);
        let source_dir = self.root.join(source);
        let target_dir = self.root.join(target);

        info!("{prefix}Creating input files for {target} based on {source}...");

        for name in [source, target] {
            if !is_case_name(name) {
                return Err(CaseError::InvalidCaseName(name.to_string()));
            }
        }
        if !source_dir.is_dir() {
            return Err(CaseError::MissingSourceDirectory(source_dir));
        }
        if same_dir(&source_dir, &target_dir)? {
            return Err(CaseError::SourceIsTarget(target_dir));
        }

        recreate_dir(&target_dir)?;

        let files = required_files(self.process_count);
        let bar = self.progress_bar(files.len());

        let mut copied = 0usize;
        for name in &files {
            bar.set_message(name.clone());
            let from = source_dir.join(name);
            if from.is_file() {
                let to = target_dir.join(name);
                let bytes = fs::copy(&from, &to).map_err(|e| CaseError::io(&from, e))?;
                debug!("{prefix}copied {name} ({bytes} bytes)");
                copied += 1;
            } else {
                warn!("{prefix}{name} missing in {}", source_dir.display());
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if copied < files.len() {
            return Err(CaseError::IncompleteFileSet {
                dir: target_dir,
                copied,
                expected: files.len(),
            });
        }

        info!("{prefix}{copied} copied into {target}!");
        Ok(StageReport { target: target_dir, copied })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template(
            " {bar:40.cyan/blue} {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }
}

/// Do both paths name one directory (symlinks and case aliases included)?
fn same_dir(source: &Path, target: &Path) -> Result<bool> {
    if !target.exists() {
        return Ok(false);
    }
    let s = fs::canonicalize(source).map_err(|e| CaseError::io(source, e))?;
    let t = fs::canonicalize(target).map_err(|e| CaseError::io(target, e))?;
    Ok(s == t)
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| CaseError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| CaseError::io(dir, e))
}
