//! Per-model p80 reliability thresholds.
//!
//! Advisory only: a task over its agent's threshold is flagged and reported,
//! never held back from scheduling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::task::{Annotation, TaskEstimate, TaskNode};
use crate::alog_warn;

/// Which figure is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdBasis {
    #[default]
    Expected,
    Pessimistic,
}

impl ThresholdBasis {
    pub fn pick(&self, estimate: &TaskEstimate) -> f64 {
        match self {
            ThresholdBasis::Expected => estimate.expected_minutes,
            ThresholdBasis::Pessimistic => estimate.pessimistic_minutes,
        }
    }
}

impl std::str::FromStr for ThresholdBasis {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expected" => Ok(ThresholdBasis::Expected),
            "pessimistic" => Ok(ThresholdBasis::Pessimistic),
            other => Err(crate::Error::Validation(format!(
                "unknown threshold basis: {}",
                other
            ))),
        }
    }
}

/// Model tier → p80 minutes. Keys are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable(BTreeMap<String, f64>);

impl Default for ThresholdTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            ("opus".to_string(), 90.0),
            ("sonnet".to_string(), 30.0),
        ]))
    }
}

impl ThresholdTable {
    pub fn new(entries: BTreeMap<String, f64>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect())
    }

    pub fn get(&self, model_tier: &str) -> Option<f64> {
        self.0.get(&model_tier.to_ascii_lowercase()).copied().or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(model_tier))
                .map(|(_, v)| *v)
        })
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Result of one threshold comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub model_tier: String,
    pub threshold_minutes: f64,
    pub compared_minutes: f64,
    pub exceeds: bool,
}

pub struct ThresholdChecker<'a> {
    table: &'a ThresholdTable,
    fallback_minutes: f64,
    basis: ThresholdBasis,
}

impl<'a> ThresholdChecker<'a> {
    pub fn new(table: &'a ThresholdTable, fallback_minutes: f64, basis: ThresholdBasis) -> Self {
        Self {
            table,
            fallback_minutes,
            basis,
        }
    }

    pub fn threshold_for(&self, model_tier: &str) -> f64 {
        self.table.get(model_tier).unwrap_or(self.fallback_minutes)
    }

    /// Compare an estimate against `model_tier`'s threshold. Strictly greater
    /// exceeds; equal does not.
    pub fn check(&self, estimate: &TaskEstimate, model_tier: &str) -> ThresholdCheck {
        let threshold_minutes = self.threshold_for(model_tier);
        let compared_minutes = self.basis.pick(estimate);
        ThresholdCheck {
            model_tier: model_tier.to_string(),
            threshold_minutes,
            compared_minutes,
            exceeds: compared_minutes > threshold_minutes,
        }
    }

    /// Check a task and record the flag on it. Tasks without an estimate are
    /// left unflagged.
    pub fn apply(&self, task: &mut TaskNode, model_tier: &str) -> Option<ThresholdCheck> {
        let check = self.check(task.estimate()?, model_tier);
        task.flag_threshold(check.exceeds);
        if check.exceeds {
            alog_warn!(
                "task {}: {:.0}m exceeds {} threshold {:.0}m",
                task.id,
                check.compared_minutes,
                check.model_tier,
                check.threshold_minutes
            );
            task.annotate(Annotation::ThresholdExceeded {
                model_tier: check.model_tier.clone(),
                threshold_minutes: check.threshold_minutes,
                compared_minutes: check.compared_minutes,
            });
        }
        Some(check)
    }
}
