// patcher.rs - Rewrite the solver input files of a staged case
//
// Parameters are located line by line through a `LineMatcher`. The default
// `SubstringMatcher` treats any line containing a key as that parameter;
// `KeyMatcher` only accepts lines whose first token is the key.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::case::{case_prefix, format_value, Velocity};
use crate::error::{CaseError, Result};
use crate::stager::{MAIN_INPUT, REFERENCE_INPUT};
use crate::utils::atomic::write_atomic;

/// Marker line; the line after it is the freestream record.
pub const RECORD_MARKER: &str = "#vals 6 title primitive_variables_2";

const RECORD_LABEL: &str = "values";

/// Decides whether a line carries a given parameter.
pub trait LineMatcher {
    fn matches(&self, line: &str, key: &str) -> bool;
}

/// Plain containment: `aero_u` also matches `xaero_u2 3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl LineMatcher for SubstringMatcher {
    fn matches(&self, line: &str, key: &str) -> bool {
        line.contains(key)
    }
}

/// Exact key: the first token must equal the key. Multi-word keys
/// (the record marker) must equal the whole trimmed line.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMatcher;

impl LineMatcher for KeyMatcher {
    fn matches(&self, line: &str, key: &str) -> bool {
        let key = key.trim();
        if key.contains(char::is_whitespace) {
            line.trim() == key
        } else {
            line.split_whitespace().next() == Some(key)
        }
    }
}

/// Pressure, temperature and velocity of the freestream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveRecord {
    pub pressure:    f64,
    pub temperature: f64,
    pub velocity:    Velocity,
}

impl PrimitiveRecord {
    /// Parse `values <p> <T> <vx> <vy> <vz>`. The label is skipped by position.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(format!(
                "primitive variable record needs 6 fields, found {}", fields.len()
            ));
        }
        let num = |i: usize| -> std::result::Result<f64, String> {
            fields[i]
                .parse::<f64>()
                .map_err(|_| format!("field {i} of primitive variable record is not a number: {:?}", fields[i]))
        };
        Ok(Self {
            pressure:    num(1)?,
            temperature: num(2)?,
            velocity:    Velocity::new(num(3)?, num(4)?, num(5)?),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{RECORD_LABEL} {} {} {} {} {}",
            format_value(self.pressure),
            format_value(self.temperature),
            format_value(self.velocity.x),
            format_value(self.velocity.y),
            format_value(self.velocity.z),
        )
    }

    /// Same state with the velocity turned to `alpha_deg`.
    pub fn rotated_to(&self, alpha_deg: f64) -> Self {
        Self { velocity: self.velocity.rotated_to(alpha_deg), ..*self }
    }
}

/// New run parameters for one case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchParams {
    pub is_restart: bool,
    pub step_count: u64,
    pub alpha_deg:  f64,
    pub cl_driver:  bool,
}

/// What a main-input rewrite did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchSummary {
    pub source:        PrimitiveRecord,
    pub patched:       PrimitiveRecord,
    pub lines_written: usize,
    pub lines_changed: usize,
}

/// Per-line parameter rules in application order.
#[derive(Debug, Clone, Copy)]
enum Rule {
    Restart,
    Steps,
    AeroU,
    AeroV,
    AeroW,
    AeroAlpha,
    ClDriver,
}

impl Rule {
    const ALL: [Rule; 7] = [
        Rule::Restart,
        Rule::Steps,
        Rule::AeroU,
        Rule::AeroV,
        Rule::AeroW,
        Rule::AeroAlpha,
        Rule::ClDriver,
    ];

    fn key(self) -> &'static str {
        match self {
            Rule::Restart   => "istart",
            Rule::Steps     => "ntstep",
            Rule::AeroU     => "aero_u",
            Rule::AeroV     => "aero_v",
            Rule::AeroW     => "aero_w",
            Rule::AeroAlpha => "aero_alpha",
            // trailing space keeps bare `cldriver...` keys out
            Rule::ClDriver  => "cldriver ",
        }
    }

    /// Replacement line, or `None` to keep the line as it is.
    fn rewrite(self, params: &PatchParams, velocity: &Velocity) -> Option<String> {
        let key = self.key().trim_end();
        match self {
            Rule::Restart   => Some(format!("{key} {}", u8::from(params.is_restart))),
            Rule::Steps     => Some(format!("{key} {}", params.step_count)),
            Rule::AeroU     => Some(format!("{key} {}", format_value(velocity.x))),
            Rule::AeroV     => Some(format!("{key} {}", format_value(velocity.y))),
            Rule::AeroW     => Some(format!("{key} {}", format_value(velocity.z))),
            Rule::AeroAlpha => Some(format!("{key} {}", format_value(params.alpha_deg))),
            Rule::ClDriver if params.cl_driver => None,
            Rule::ClDriver  => Some(format!("{key} 0")),
        }
    }
}

/// Rewrites `mcfd.inp` and `infout1f.inp` of a case directory.
#[derive(Debug, Clone, Default)]
pub struct InputPatcher<M = SubstringMatcher> {
    matcher: M,
}

impl InputPatcher<SubstringMatcher> {
    pub fn new() -> Self {
        Self { matcher: SubstringMatcher }
    }
}

impl<M: LineMatcher> InputPatcher<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    /// Patch both input files of `case_dir`. The main input goes first;
    /// a failure on the reference file leaves the main input rewritten.
    pub fn patch_case(&self, case_dir: &Path, params: &PatchParams) -> Result<PatchSummary> {
        let summary = self.patch_main_input(case_dir, params)?;
        self.patch_reference(case_dir, params.alpha_deg)?;
        Ok(summary)
    }

    pub fn patch_main_input(&self, case_dir: &Path, params: &PatchParams) -> Result<PatchSummary> {
        let path = case_dir.join(MAIN_INPUT);
        let text = fs::read_to_string(&path).map_err(|e| CaseError::io(&path, e))?;
        let (out, summary) = self.rewrite_main_input(&text, params, &path)?;
        write_atomic(&path, out.as_bytes())?;

        let prefix = case_prefix(&dir_name(case_dir));
        info!(
            "{prefix}{MAIN_INPUT}: velocity ({}, {}, {}) at alpha {}",
            format_value(summary.patched.velocity.x),
            format_value(summary.patched.velocity.y),
            format_value(summary.patched.velocity.z),
            format_value(params.alpha_deg),
        );
        debug!(
            "{prefix}{MAIN_INPUT}: {} lines written, {} rewritten",
            summary.lines_written, summary.lines_changed
        );
        Ok(summary)
    }

    /// Rewrite main-input text. `path` is only used in error messages.
    ///
    /// The velocity magnitude comes from the record currently in `text`, so
    /// patching an already patched file starts from the patched velocities.
    /// Blank lines are dropped.
    pub fn rewrite_main_input(
        &self,
        text: &str,
        params: &PatchParams,
        path: &Path,
    ) -> Result<(String, PatchSummary)> {
        let lines: Vec<&str> = text.lines().collect();

        // Records first, so aero_* lines above the record see the new velocity.
        let mut records: Vec<(usize, PrimitiveRecord, PrimitiveRecord)> = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if !self.matcher.matches(line, RECORD_MARKER) {
                continue;
            }
            let idx = i + 1;
            let record_line = lines
                .get(idx)
                .ok_or_else(|| CaseError::parse(path, i + 1, "record marker on last line"))?;
            let source = PrimitiveRecord::parse(record_line)
                .map_err(|msg| CaseError::parse(path, idx + 1, msg))?;
            records.push((idx, source, source.rotated_to(params.alpha_deg)));
        }

        let (source, patched) = match records.first() {
            Some(&(_, s, p)) => (s, p),
            None => return Err(CaseError::MissingRecord(path.to_path_buf())),
        };

        let mut out = String::with_capacity(text.len());
        let mut lines_written = 0usize;
        let mut lines_changed = 0usize;

        for (i, &line) in lines.iter().enumerate() {
            let new_line = match records.iter().find(|(idx, _, _)| *idx == i) {
                Some((_, _, rec)) => rec.render(),
                None => self.apply_rules(line, params, &patched.velocity),
            };
            if new_line.trim().is_empty() {
                continue;
            }
            if new_line != line {
                lines_changed += 1;
            }
            out.push_str(&new_line);
            out.push('\n');
            lines_written += 1;
        }

        Ok((out, PatchSummary { source, patched, lines_written, lines_changed }))
    }

    /// Later rules see the output of earlier ones, last match wins.
    fn apply_rules(&self, line: &str, params: &PatchParams, velocity: &Velocity) -> String {
        let mut current = line.to_string();
        for rule in Rule::ALL {
            if self.matcher.matches(&current, rule.key()) {
                if let Some(new_line) = rule.rewrite(params, velocity) {
                    current = new_line;
                }
            }
        }
        current
    }

    pub fn patch_reference(&self, case_dir: &Path, alpha_deg: f64) -> Result<()> {
        let path = case_dir.join(REFERENCE_INPUT);
        let text = fs::read_to_string(&path).map_err(|e| CaseError::io(&path, e))?;
        let out = self.rewrite_reference(&text, alpha_deg);
        write_atomic(&path, out.as_bytes())?;
        debug!("{}{REFERENCE_INPUT}: alpha {}", case_prefix(&dir_name(case_dir)), format_value(alpha_deg));
        Ok(())
    }

    /// Every `alpha` line becomes `alpha <angle>`; blank lines are kept.
    pub fn rewrite_reference(&self, text: &str, alpha_deg: f64) -> String {
        let mut out = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            if self.matcher.matches(line, "alpha") {
                out.push_str(&format!("alpha {}\n", format_value(alpha_deg)));
            } else {
                out.push_str(line);
            }
        }
        out
    }

    /// Is the case in `case_dir` running in cl-driver mode?
    pub fn detect_cl_driver(&self, case_dir: &Path) -> Result<bool> {
        let path = case_dir.join(MAIN_INPUT);
        let text = fs::read_to_string(&path).map_err(|e| CaseError::io(&path, e))?;
        Ok(self.cl_driver_level(&text, &path)?.map_or(false, |level| level > 0))
    }

    /// Integer after the first `cldriver` key, if any.
    pub fn cl_driver_level(&self, text: &str, path: &Path) -> Result<Option<i64>> {
        const KEY: &str = "cldriver";
        for (i, line) in text.lines().enumerate() {
            if !self.matcher.matches(line, KEY) {
                continue;
            }
            // `cldriver_cltarget 0.5` and friends are other keys
            let rest = line.match_indices(KEY).find_map(|(pos, _)| {
                let rest = &line[pos + KEY.len()..];
                match rest.chars().next() {
                    None => Some(rest),
                    Some(c) if c.is_whitespace() => Some(rest),
                    Some(_) => None,
                }
            });
            let Some(rest) = rest else { continue };
            let token = rest
                .split_whitespace()
                .next()
                .ok_or_else(|| CaseError::parse(path, i + 1, "cldriver without a value"))?;
            let level = token
                .parse::<i64>()
                .map_err(|_| CaseError::parse(path, i + 1, format!("cldriver value {token:?} is not an integer")))?;
            return Ok(Some(level));
        }
        Ok(None)
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
