// error.rs - Failure modes of staging, patching and launching a case

use std::io;
use std::path::{Path, PathBuf};

/// Everything that can stop a case pipeline.
///
/// Every variant is terminal for the case being built; the caller decides
/// whether the rest of a sweep continues.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// Source case directory does not exist; nothing was created.
    #[error("source case directory {} does not exist", .0.display())]
    MissingSourceDirectory(PathBuf),

    /// Case name is not a single plain directory name.
    #[error("{0:?} is not a plain case directory name")]
    InvalidCaseName(String),

    /// Target resolves to the source directory; nothing was removed.
    #[error("case directory {} is the source case itself", .0.display())]
    SourceIsTarget(PathBuf),

    /// Staging copied fewer files than the allow-list names.
    /// The target directory is left as it is.
    #[error("only {copied} of {expected} required files copied into {}", .dir.display())]
    IncompleteFileSet {
        dir: PathBuf,
        copied: usize,
        expected: usize,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed value in a solver input file (1-based line number).
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Main input file carries no primitive-variable record.
    #[error("{}: no primitive variable record found", .0.display())]
    MissingRecord(PathBuf),

    #[error("invalid case configuration: {0}")]
    InvalidConfig(String),

    #[error("solver launch failed: {0}")]
    Solver(String),

    #[error("case ledger: {0}")]
    Ledger(#[from] csv::Error),

    #[error("case file: {0}")]
    Config(#[from] toml::de::Error),
}

impl CaseError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        CaseError::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        CaseError::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaseError>;
