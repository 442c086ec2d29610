// case.rs - Case parameters and the freestream velocity decomposition

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use crate::error::{CaseError, Result};

/// Run parameters of one case (single source of truth).
///
/// `cl_driver = None` inherits the driver mode of the source case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseConfig {
    pub case_name:     String,
    pub source_case:   String,
    pub process_count: usize,
    pub alpha_deg:     f64,
    pub step_count:    u64,
    pub is_restart:    bool,
    pub cl_driver:     Option<bool>,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            case_name:     String::new(),
            source_case:   String::new(),
            process_count: 1,
            alpha_deg:     0.0,
            step_count:    1000,
            is_restart:    true,
            cl_driver:     None,
        }
    }
}

impl CaseConfig {
    /// Load a case description from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CaseError::io(path, e))?;
        Ok(toml::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(CaseError::InvalidConfig(format!(
                "wrong processor number {}", self.process_count
            )));
        }
        if self.case_name.trim().is_empty() || self.source_case.trim().is_empty() {
            return Err(CaseError::InvalidConfig(
                "case name and source case name must not be empty".into(),
            ));
        }
        for name in [&self.case_name, &self.source_case] {
            if !is_case_name(name) {
                return Err(CaseError::InvalidConfig(format!(
                    "{name:?} is not a plain case directory name"
                )));
            }
        }
        if self.case_name == self.source_case {
            return Err(CaseError::InvalidConfig("case cannot be staged from itself".into()));
        }
        if !self.alpha_deg.is_finite() {
            return Err(CaseError::InvalidConfig("angle of attack must be finite".into()));
        }
        Ok(())
    }

    /// Diagnostic prefix, e.g. `===B=== `.
    pub fn prefix(&self) -> String {
        case_prefix(&self.case_name)
    }

    pub fn case_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.case_name)
    }

    pub fn source_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.source_case)
    }

    /// Solver log file name, `<caseName>.log`.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.case_name)
    }
}

/// A case name must be one normal path component: no `.`, `..`,
/// separators or absolute paths.
pub fn is_case_name(name: &str) -> bool {
    let mut parts = Path::new(name).components();
    matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None))
}

pub fn case_prefix(case_name: &str) -> String {
    format!("==={case_name}=== ")
}

/// Freestream velocity vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Velocity {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Rotate `magnitude` into the x–z plane at `alpha_deg`, keeping `y`.
    ///
    /// x = m·cos α, z = m·sin α, so x² + z² = m².
    pub fn at_angle(magnitude: f64, y: f64, alpha_deg: f64) -> Self {
        let (sin_a, cos_a) = alpha_deg.to_radians().sin_cos();
        Self {
            x: magnitude * cos_a,
            y,
            z: magnitude * sin_a,
        }
    }

    /// Same magnitude as `self`, pointed at `alpha_deg`.
    pub fn rotated_to(&self, alpha_deg: f64) -> Self {
        Self::at_angle(self.magnitude(), self.y, alpha_deg)
    }
}

/// Shortest round-trip rendering, so repeated patch cycles do not drift.
/// Ordinary magnitudes keep a decimal point (`5.0`, `101325.0`); very
/// large or small ones use exponent form (`1e20`, `1e-7`).
pub fn format_value(v: f64) -> String {
    format!("{v:?}")
}
