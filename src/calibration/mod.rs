//! Calibration interface.
//!
//! The engine reads its default tables through [`CalibrationSource`] and
//! reports real outcomes through [`CalibrationSink`]. [`JsonlCalibrationStore`]
//! implements both over an append-only JSON-lines file.

pub mod history;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::task::{Modifiers, ReviewMode, TaskType};
use crate::error::{Error, Result};
use crate::estimation::tables::DurationTables;

pub use history::{infer_warm_context, WarmContext, WarmContextSource};
pub use store::{CalibrationSummary, JsonlCalibrationStore, TypeSummary};

/// Current default tables and modifier values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalibrationDefaults {
    pub tables: DurationTables,
    /// Modifier values assumed when a task gives none. Observations carry
    /// modifiers but are not used to move these, so they stay neutral.
    pub modifiers: Modifiers,
}

pub trait CalibrationSource {
    /// Defaults derived from `base`, e.g. the tables of the loaded config.
    fn defaults_from(&self, base: &DurationTables) -> Result<CalibrationDefaults>;

    /// Defaults derived from the built-in tables.
    fn defaults(&self) -> Result<CalibrationDefaults> {
        self.defaults_from(&DurationTables::default())
    }
}

pub trait CalibrationSink {
    /// Append one observation. Returns the record as stored.
    fn append(&mut self, record: ObservationRecord) -> Result<ObservationRecord>;
}

/// The base tables unchanged, no history.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDefaults;

impl CalibrationSource for StaticDefaults {
    fn defaults_from(&self, base: &DurationTables) -> Result<CalibrationDefaults> {
        Ok(CalibrationDefaults {
            tables: *base,
            ..CalibrationDefaults::default()
        })
    }
}

fn default_execution_mode() -> String {
    "sequential".to_string()
}

/// One observed-vs-estimated outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Assigned by the store on append.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Stamped by the store on append when absent.
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
    pub task_type: TaskType,
    pub estimated_minutes: f64,
    pub actual_work_minutes: f64,
    pub actual_total_minutes: f64,
    #[serde(default)]
    pub file_count: u32,
    #[serde(default)]
    pub line_count: u32,
    #[serde(default)]
    pub test_count: u32,
    #[serde(default = "default_execution_mode")]
    pub execution_mode: String,
    #[serde(default)]
    pub review_mode: ReviewMode,
    #[serde(default)]
    pub review_overhead_minutes: f64,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl ObservationRecord {
    pub fn new(task_type: TaskType, estimated_minutes: f64, actual_work_minutes: f64) -> Self {
        Self {
            id: None,
            observed_at: None,
            task_type,
            estimated_minutes,
            actual_work_minutes,
            actual_total_minutes: actual_work_minutes,
            file_count: 0,
            line_count: 0,
            test_count: 0,
            execution_mode: default_execution_mode(),
            review_mode: ReviewMode::None,
            review_overhead_minutes: 0.0,
            modifiers: Modifiers::default(),
        }
    }

    /// Actual work over estimate. `None` when nothing was estimated.
    pub fn error_ratio(&self) -> Option<f64> {
        (self.estimated_minutes > 0.0).then(|| self.actual_work_minutes / self.estimated_minutes)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("estimated_minutes", self.estimated_minutes),
            ("actual_work_minutes", self.actual_work_minutes),
            ("actual_total_minutes", self.actual_total_minutes),
            ("review_overhead_minutes", self.review_overhead_minutes),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::range(name, format!("must be >= 0, got {}", value)));
            }
        }
        if self.execution_mode.trim().is_empty() {
            return Err(Error::Validation("execution_mode must be non-empty".into()));
        }
        self.modifiers.validate()
    }
}
