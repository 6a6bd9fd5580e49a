//! Offline check of a seed snapshot before it is shipped.

use std::{collections::BTreeSet, path::Path, process::ExitCode};

use lotto_draw::{Draw, DrawRecord};

use super::SeedFile;

const MAX_REPORTED_ERRORS: usize = 50;
const MAX_REPORTED_MISSING: usize = 30;

/// Outcome of [`validate_seed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub count: usize,
    pub errors: Vec<String>,
    pub draw_nos: BTreeSet<u32>,
    pub missing: Vec<u32>,
}

impl SeedReport {
    pub fn range(&self) -> Option<(u32, u32)> {
        Some((*self.draw_nos.first()?, *self.draw_nos.last()?))
    }

    /// 0 when valid, 1 on schema or record errors, 2 on gaps.
    pub fn status(&self) -> u8 {
        if !self.errors.is_empty() {
            1
        } else if !self.missing.is_empty() {
            2
        } else {
            0
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.missing.is_empty()
    }

    /// Writes the report through the log facade.
    pub fn log(&self, path: &Path) {
        for error in self.errors.iter().take(MAX_REPORTED_ERRORS) {
            log::error!("{error}");
        }
        if self.errors.len() > MAX_REPORTED_ERRORS {
            log::error!("...and {} more errors", self.errors.len() - MAX_REPORTED_ERRORS);
        }
        if !self.errors.is_empty() {
            return;
        }

        log::info!("file={}", path.display());
        if let Some((min, max)) = self.range() {
            log::info!("draw count={}, range={min}..{max}", self.count);
        }
        if self.missing.is_empty() {
            log::info!("validation passed");
        } else {
            let sample = self
                .missing
                .iter()
                .take(MAX_REPORTED_MISSING)
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            log::error!("missing drawNo count={}, sample=[{sample}]", self.missing.len());
        }
    }
}

/// Checks every record strictly (no dropping) and the coverage between
/// the smallest and largest draw number.
pub fn validate_seed_text(text: &str) -> SeedReport {
    let mut report = SeedReport::default();

    let file = match serde_json::from_str::<SeedFile>(text) {
        Ok(file) => file,
        Err(e) => {
            report
                .errors
                .push(format!("schema invalid: expected array or {{ draws: [] }} ({e})"));
            return report;
        }
    };

    let records = file.into_records();
    report.count = records.len();
    for (index, value) in records.into_iter().enumerate() {
        let path = format!("draws[{index}]");
        let record = match serde_json::from_value::<DrawRecord>(value) {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(format!("{path}: {e}"));
                continue;
            }
        };
        match Draw::try_from(record) {
            Ok(draw) => {
                if !report.draw_nos.insert(draw.draw_no()) {
                    report
                        .errors
                        .push(format!("{path}.drawNo duplicated: {}", draw.draw_no()));
                }
            }
            Err(e) => report.errors.push(format!("{path}: {e}")),
        }
    }

    if report.errors.is_empty() {
        if let Some((min, max)) = report.range() {
            report.missing = (min..=max)
                .filter(|n| !report.draw_nos.contains(n))
                .collect();
        }
    }
    report
}

pub fn validate_seed(path: &Path) -> SeedReport {
    match std::fs::read_to_string(path) {
        Ok(text) => validate_seed_text(&text),
        Err(e) => SeedReport {
            errors: vec![format!("cannot read file: {} ({e})", path.display())],
            ..SeedReport::default()
        },
    }
}
