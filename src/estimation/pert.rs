//! PERT duration estimation.
//!
//! Turns a task's three-point durations and modifiers into an expected
//! duration with uncertainty:
//!
//! - `expected = (O + 4M + P) / 6`, `sigma = (P - O) / 6`
//! - the modifier product is floored at [`MODIFIER_FLOOR`]
//! - the PERT figures are scaled by `modifier_product * friction_multiplier`
//! - review minutes are looked up by review mode and kept separate

use serde::{Deserialize, Serialize};

use crate::config::PlanSettings;
use crate::core::task::{Annotation, Modifiers, TaskEstimate, TaskNode, ThreePoint};
use crate::error::Result;
use crate::estimation::human;
use crate::{alog_trace, alog_warn};

/// Minimum combined modifier.
pub const MODIFIER_FLOOR: f64 = 0.10;

/// Raw PERT statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PertResult {
    pub expected: f64,
    pub sigma: f64,
}

pub fn compute_pert(durations: &ThreePoint) -> Result<PertResult> {
    durations.validate()?;
    let ThreePoint {
        optimistic: o,
        likely: m,
        pessimistic: p,
    } = *durations;
    Ok(PertResult {
        expected: (o + 4.0 * m + p) / 6.0,
        sigma: (p - o) / 6.0,
    })
}

/// Combined modifier after the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierFactor {
    pub raw: f64,
    pub effective: f64,
    pub floor_fired: bool,
}

pub fn modifier_factor(modifiers: &Modifiers) -> Result<ModifierFactor> {
    modifiers.validate()?;
    let raw = modifiers.product();
    let floor_fired = raw < MODIFIER_FLOOR;
    Ok(ModifierFactor {
        raw,
        effective: if floor_fired { MODIFIER_FLOOR } else { raw },
        floor_fired,
    })
}

/// Fills a task's estimate. Holds the run-wide settings only.
#[derive(Debug, Clone, Copy)]
pub struct Estimator<'a> {
    settings: &'a PlanSettings,
}

impl<'a> Estimator<'a> {
    pub fn new(settings: &'a PlanSettings) -> Self {
        Self { settings }
    }

    /// Compute the estimate without touching the task.
    pub fn compute(&self, task: &TaskNode) -> Result<TaskEstimate> {
        let pert = compute_pert(&task.durations)?;
        let factor = modifier_factor(&task.modifiers)?;
        let scale = factor.effective * self.settings.friction_multiplier;
        let expected_minutes = pert.expected * scale;

        Ok(TaskEstimate {
            expected_minutes,
            std_dev_minutes: pert.sigma * scale,
            optimistic_minutes: task.durations.optimistic * scale,
            pessimistic_minutes: task.durations.pessimistic * scale,
            review_minutes: task.review_mode.minutes(),
            raw_modifier_product: factor.raw,
            modifier_product: factor.effective,
            floor_fired: factor.floor_fired,
            human_equivalent_minutes: human::human_equivalent(expected_minutes, task.task_type),
        })
    }

    /// Compute and store the estimate, annotating the task if the floor fired.
    pub fn estimate(&self, task: &mut TaskNode) -> Result<()> {
        let estimate = self.compute(task)?;
        if estimate.floor_fired {
            alog_warn!(
                "task {}: modifier product {:.3} below floor, using {:.2}",
                task.id,
                estimate.raw_modifier_product,
                MODIFIER_FLOOR
            );
            task.annotate(Annotation::ModifierFloorFired {
                raw_product: estimate.raw_modifier_product,
                floor: MODIFIER_FLOOR,
            });
        }
        alog_trace!(
            "task {}: expected={:.2}m sigma={:.2}m review={}m",
            task.id,
            estimate.expected_minutes,
            estimate.std_dev_minutes,
            estimate.review_minutes
        );
        task.set_estimate(estimate);
        Ok(())
    }
}
