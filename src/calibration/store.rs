//! Append-only JSON-lines calibration store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::calibration::{CalibrationDefaults, CalibrationSink, CalibrationSource, ObservationRecord};
use crate::core::task::TaskType;
use crate::error::Result;
use crate::estimation::tables::DurationTables;
use crate::{alog_debug, alog_warn};

/// Coding observations needed before defaults are rescaled.
pub const K_FLOOR: usize = 5;
/// Bounds on the rescale factor.
pub const SCALE_BOUNDS: (f64, f64) = (0.5, 2.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub task_type: TaskType,
    pub count: usize,
    pub mean_error_ratio: f64,
    pub p10_error_ratio: f64,
    pub median_error_ratio: f64,
    pub p90_error_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationSummary {
    pub total: usize,
    /// Sorted by task type.
    pub by_type: Vec<TypeSummary>,
}

impl CalibrationSummary {
    pub fn for_type(&self, task_type: TaskType) -> Option<&TypeSummary> {
        self.by_type.iter().find(|s| s.task_type == task_type)
    }
}

pub struct JsonlCalibrationStore {
    path: PathBuf,
}

impl JsonlCalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored observation, oldest first. A missing file is empty.
    /// Lines that fail to parse are skipped with a warning.
    pub fn observations(&self) -> Result<Vec<ObservationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (lineno, bytes) in reader.split(b'\n').enumerate() {
            let bytes = bytes?;
            let line = match std::str::from_utf8(&bytes) {
                Ok(line) => line,
                Err(e) => {
                    alog_warn!(
                        "{}:{}: skipping observation that is not UTF-8: {}",
                        self.path.display(),
                        lineno + 1,
                        e
                    );
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ObservationRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => alog_warn!(
                    "{}:{}: skipping malformed observation: {}",
                    self.path.display(),
                    lineno + 1,
                    e
                ),
            }
        }
        Ok(records)
    }

    pub fn summary(&self) -> Result<CalibrationSummary> {
        let records = self.observations()?;
        let mut ratios: BTreeMap<TaskType, Vec<f64>> = BTreeMap::new();
        for record in &records {
            if let Some(ratio) = record.error_ratio() {
                ratios.entry(record.task_type).or_default().push(ratio);
            }
        }
        let by_type = ratios
            .into_iter()
            .map(|(task_type, mut values)| {
                values.sort_by(f64::total_cmp);
                TypeSummary {
                    task_type,
                    count: values.len(),
                    mean_error_ratio: values.iter().sum::<f64>() / values.len() as f64,
                    p10_error_ratio: percentile(&values, 10.0),
                    median_error_ratio: percentile(&values, 50.0),
                    p90_error_ratio: percentile(&values, 90.0),
                }
            })
            .collect();
        Ok(CalibrationSummary {
            total: records.len(),
            by_type,
        })
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty
/// and ascending.
fn percentile(sorted: &[f64], percent: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (sorted.len() - 1) as f64 * (percent / 100.0);
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

impl CalibrationSink for JsonlCalibrationStore {
    fn append(&mut self, mut record: ObservationRecord) -> Result<ObservationRecord> {
        record.validate()?;
        record.id = Some(record.id.unwrap_or_else(Uuid::new_v4));
        record.observed_at = Some(record.observed_at.unwrap_or_else(Utc::now));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        alog_debug!(
            "appended observation {} ({}) to {}",
            record.id.map(|id| id.to_string()).unwrap_or_default(),
            record.task_type,
            self.path.display()
        );
        Ok(record)
    }
}

impl CalibrationSource for JsonlCalibrationStore {
    /// `base` with its coding tiers rescaled by the mean coding error ratio
    /// once at least [`K_FLOOR`] coding observations exist. Category
    /// baselines are never touched.
    fn defaults_from(&self, base: &DurationTables) -> Result<CalibrationDefaults> {
        let mut defaults = CalibrationDefaults {
            tables: *base,
            ..CalibrationDefaults::default()
        };
        let summary = self.summary()?;
        if let Some(coding) = summary.for_type(TaskType::Coding) {
            if coding.count >= K_FLOOR {
                let factor = coding.mean_error_ratio.clamp(SCALE_BOUNDS.0, SCALE_BOUNDS.1);
                alog_debug!(
                    "calibrating coding tiers by {:.2} from {} observations",
                    factor,
                    coding.count
                );
                defaults.tables.tiers = defaults.tables.tiers.scaled(factor);
            }
        }
        Ok(defaults)
    }
}
