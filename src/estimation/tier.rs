//! Size-tier auto-correction from scope signals.
//!
//! Upgrade to L when `test_count > 20`, `line_count > 200` or
//! `concern_count >= 3`. Otherwise downgrade to XS when upstream flagged the
//! task trivial. Tasks already at L or XL are never moved by the upgrade rule.

use crate::core::task::{Annotation, ScopeSignals, SizeTier, TaskNode, TaskType};
use crate::estimation::tables::DurationTables;
use crate::alog_warn;

pub const TEST_COUNT_LIMIT: u32 = 20;
pub const LINE_COUNT_LIMIT: u32 = 200;
pub const CONCERN_COUNT_LIMIT: u32 = 3;

/// Outcome of a tier check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDecision {
    pub tier: SizeTier,
    pub previous: SizeTier,
    /// Human-readable explanation, present only when the tier changed.
    pub reason: Option<String>,
}

impl TierDecision {
    pub fn changed(&self) -> bool {
        self.tier != self.previous
    }

    fn unchanged(tier: SizeTier) -> Self {
        Self {
            tier,
            previous: tier,
            reason: None,
        }
    }
}

fn upgrade_signal(signals: &ScopeSignals) -> Option<String> {
    if let Some(tests) = signals.test_count.filter(|t| *t > TEST_COUNT_LIMIT) {
        return Some(format!("{} estimated tests (>{})", tests, TEST_COUNT_LIMIT));
    }
    if let Some(lines) = signals.line_count.filter(|l| *l > LINE_COUNT_LIMIT) {
        return Some(format!("{} estimated lines (>{})", lines, LINE_COUNT_LIMIT));
    }
    if let Some(concerns) = signals.concern_count.filter(|c| *c >= CONCERN_COUNT_LIMIT) {
        return Some(format!("{} concerns (>={})", concerns, CONCERN_COUNT_LIMIT));
    }
    None
}

/// Decide the tier for `declared` given `signals`. Pure.
pub fn classify_tier(declared: SizeTier, signals: &ScopeSignals, auto_tier: bool) -> TierDecision {
    if !auto_tier {
        return TierDecision::unchanged(declared);
    }
    if let Some(why) = upgrade_signal(signals) {
        if declared < SizeTier::L {
            return TierDecision {
                tier: SizeTier::L,
                previous: declared,
                reason: Some(format!("Upgraded {}\u{2192}L: {}", declared, why)),
            };
        }
        return TierDecision::unchanged(declared);
    }
    if signals.trivial && declared != SizeTier::XS {
        return TierDecision {
            tier: SizeTier::XS,
            previous: declared,
            reason: Some(format!("Downgraded {}\u{2192}XS: flagged trivial", declared)),
        };
    }
    TierDecision::unchanged(declared)
}

/// Apply auto-correction to a coding task, re-deriving its baseline triple
/// from `tables` when the tier changes. Non-coding tasks are left alone.
pub fn apply_tier_correction(task: &mut TaskNode, tables: &DurationTables, auto_tier: bool) -> TierDecision {
    if task.task_type != TaskType::Coding {
        return TierDecision::unchanged(task.tier);
    }
    let decision = classify_tier(task.tier, &task.scope, auto_tier);
    if let Some(reason) = &decision.reason {
        alog_warn!("task {}: {}", task.id, reason);
        task.tier = decision.tier;
        task.durations = tables.tiers.get(decision.tier);
        task.annotate(Annotation::TierCorrected {
            from: decision.previous,
            to: decision.tier,
            reason: reason.clone(),
        });
    }
    decision
}
