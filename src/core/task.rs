//! Task data model for estimation and wave planning.
//!
//! A [`TaskNode`] is created fully formed from caller input. Its input fields
//! are public; the derived fields (estimate, placement, threshold flag) are
//! private and written only by the engine stage that owns them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stable task identifier, unique within a planning run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Category of work. Selects the duration model and the capability tags an
/// agent needs to run the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    #[default]
    Coding,
    Brainstorm,
    Research,
    Config,
    Documentation,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Coding,
        TaskType::Brainstorm,
        TaskType::Research,
        TaskType::Config,
        TaskType::Documentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Coding => "coding",
            TaskType::Brainstorm => "brainstorm",
            TaskType::Research => "research",
            TaskType::Config => "config",
            TaskType::Documentation => "documentation",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation(format!("unknown task type: {}", s)))
    }
}

/// Coarse size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum SizeTier {
    XS,
    S,
    #[default]
    M,
    L,
    XL,
}

impl SizeTier {
    pub const ORDER: [SizeTier; 5] = [
        SizeTier::XS,
        SizeTier::S,
        SizeTier::M,
        SizeTier::L,
        SizeTier::XL,
    ];

    /// Move up by `steps`, clamping at XL.
    pub fn bump(self, steps: usize) -> SizeTier {
        let idx = Self::ORDER.iter().position(|t| *t == self).unwrap_or(2);
        Self::ORDER[(idx + steps).min(Self::ORDER.len() - 1)]
    }
}

impl std::fmt::Display for SizeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SizeTier::XS => "XS",
            SizeTier::S => "S",
            SizeTier::M => "M",
            SizeTier::L => "L",
            SizeTier::XL => "XL",
        };
        write!(f, "{}", s)
    }
}

/// Review overhead model, charged as additive minutes.
///
/// `self` and `2x-lgtm` are accepted as legacy spellings of `none` and
/// `standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    #[default]
    #[serde(alias = "self")]
    None,
    #[serde(alias = "2x-lgtm")]
    Standard,
    Complex,
}

impl ReviewMode {
    pub fn minutes(&self) -> f64 {
        match self {
            ReviewMode::None => 0.0,
            ReviewMode::Standard => 15.0,
            ReviewMode::Complex => 25.0,
        }
    }
}

impl std::fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewMode::None => write!(f, "none"),
            ReviewMode::Standard => write!(f, "standard"),
            ReviewMode::Complex => write!(f, "complex"),
        }
    }
}

impl std::str::FromStr for ReviewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "self" => Ok(ReviewMode::None),
            "standard" | "2x-lgtm" => Ok(ReviewMode::Standard),
            "complex" => Ok(ReviewMode::Complex),
            other => Err(Error::Validation(format!("unknown review mode: {}", other))),
        }
    }
}

/// Optimistic / most-likely / pessimistic durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreePoint {
    pub optimistic: f64,
    pub likely: f64,
    pub pessimistic: f64,
}

impl ThreePoint {
    pub const fn new(optimistic: f64, likely: f64, pessimistic: f64) -> Self {
        Self {
            optimistic,
            likely,
            pessimistic,
        }
    }

    /// Require `0 < optimistic <= likely <= pessimistic`, all finite.
    pub fn validate(&self) -> Result<()> {
        let ThreePoint {
            optimistic: o,
            likely: m,
            pessimistic: p,
        } = *self;
        if !(o.is_finite() && m.is_finite() && p.is_finite()) {
            return Err(Error::range("duration", "durations must be finite"));
        }
        if !(0.0 < o && o <= m && m <= p) {
            return Err(Error::range(
                "duration",
                format!("requires 0 < O <= M <= P, got O={}, M={}, P={}", o, m, p),
            ));
        }
        Ok(())
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.optimistic * factor,
            self.likely * factor,
            self.pessimistic * factor,
        )
    }
}

fn one() -> f64 {
    1.0
}

/// Contextual multipliers. Missing keys default to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default = "one")]
    pub spec_clarity: f64,
    #[serde(default = "one")]
    pub warm_context: f64,
    #[serde(default = "one")]
    pub agent_fit: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            spec_clarity: 1.0,
            warm_context: 1.0,
            agent_fit: 1.0,
        }
    }
}

impl Modifiers {
    pub const SPEC_CLARITY_RANGE: (f64, f64) = (0.3, 1.3);
    pub const WARM_CONTEXT_RANGE: (f64, f64) = (0.3, 1.15);
    pub const AGENT_FIT_RANGE: (f64, f64) = (0.9, 1.2);

    pub fn validate(&self) -> Result<()> {
        check_bound("spec_clarity", self.spec_clarity, Self::SPEC_CLARITY_RANGE)?;
        check_bound("warm_context", self.warm_context, Self::WARM_CONTEXT_RANGE)?;
        check_bound("agent_fit", self.agent_fit, Self::AGENT_FIT_RANGE)
    }

    /// Raw product of the three factors, before the floor is applied.
    pub fn product(&self) -> f64 {
        self.spec_clarity * self.warm_context * self.agent_fit
    }
}

fn check_bound(name: &str, value: f64, (lo, hi): (f64, f64)) -> Result<()> {
    if !(lo..=hi).contains(&value) {
        return Err(Error::range(
            name,
            format!("must be between {} and {}, got {}", lo, hi, value),
        ));
    }
    Ok(())
}

/// Raw scope signals used by tier auto-correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScopeSignals {
    pub test_count: Option<u32>,
    pub line_count: Option<u32>,
    pub concern_count: Option<u32>,
    /// Set by upstream classification; never re-derived by the engine.
    #[serde(default)]
    pub trivial: bool,
}

/// Non-fatal conditions surfaced in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Annotation {
    ModifierFloorFired { raw_product: f64, floor: f64 },
    TierCorrected { from: SizeTier, to: SizeTier, reason: String },
    ThresholdExceeded {
        model_tier: String,
        threshold_minutes: f64,
        compared_minutes: f64,
    },
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Annotation::ModifierFloorFired { raw_product, floor } => write!(
                f,
                "modifier floor fired: product {:.3} raised to {:.2}",
                raw_product, floor
            ),
            Annotation::TierCorrected { reason, .. } => write!(f, "{}", reason),
            Annotation::ThresholdExceeded {
                model_tier,
                threshold_minutes,
                compared_minutes,
            } => write!(
                f,
                "estimate ({:.0}m) exceeds {} p80 threshold ({:.0}m); consider splitting the task",
                compared_minutes, model_tier, threshold_minutes
            ),
        }
    }
}

/// Planning lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    #[default]
    Unplaced,
    Ready,
    Assigned,
    Final,
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPhase::Unplaced => write!(f, "unplaced"),
            TaskPhase::Ready => write!(f, "ready"),
            TaskPhase::Assigned => write!(f, "assigned"),
            TaskPhase::Final => write!(f, "final"),
        }
    }
}

/// Derived duration figures, written by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskEstimate {
    pub expected_minutes: f64,
    pub std_dev_minutes: f64,
    pub optimistic_minutes: f64,
    pub pessimistic_minutes: f64,
    pub review_minutes: f64,
    pub raw_modifier_product: f64,
    pub modifier_product: f64,
    pub floor_fired: bool,
    pub human_equivalent_minutes: f64,
}

/// Wave placement, written by the wave planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub wave_index: usize,
    pub agent: String,
    /// Work minutes this task contributes to its wave, after any
    /// co-dispatch discount.
    pub work_minutes: f64,
    pub co_dispatched: bool,
}

/// One unit of estimable work.
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub description: String,
    pub task_type: TaskType,
    pub tier: SizeTier,
    pub durations: ThreePoint,
    pub dependencies: Vec<TaskId>,
    pub modifiers: Modifiers,
    pub review_mode: ReviewMode,
    pub scope: ScopeSignals,
    pub priority: Option<u32>,
    pub pinned_agent: Option<String>,
    /// Position in the caller's input sequence.
    pub sequence: usize,

    estimate: Option<TaskEstimate>,
    placement: Option<Placement>,
    exceeds_threshold: bool,
    annotations: Vec<Annotation>,
    phase: TaskPhase,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, task_type: TaskType, tier: SizeTier, durations: ThreePoint) -> Self {
        Self {
            id: TaskId::new(id),
            description: String::new(),
            task_type,
            tier,
            durations,
            dependencies: Vec::new(),
            modifiers: Modifiers::default(),
            review_mode: ReviewMode::None,
            scope: ScopeSignals::default(),
            priority: None,
            pinned_agent: None,
            sequence: 0,
            estimate: None,
            placement: None,
            exceeds_threshold: false,
            annotations: Vec::new(),
            phase: TaskPhase::Unplaced,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = deps.iter().map(|d| TaskId::from(*d)).collect();
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_review_mode(mut self, review_mode: ReviewMode) -> Self {
        self.review_mode = review_mode;
        self
    }

    pub fn with_sequence(mut self, sequence: usize) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn estimate(&self) -> Option<&TaskEstimate> {
        self.estimate.as_ref()
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn expected_minutes(&self) -> Option<f64> {
        self.estimate.map(|e| e.expected_minutes)
    }

    pub fn std_dev_minutes(&self) -> Option<f64> {
        self.estimate.map(|e| e.std_dev_minutes)
    }

    pub fn review_minutes(&self) -> Option<f64> {
        self.estimate.map(|e| e.review_minutes)
    }

    pub fn wave_index(&self) -> Option<usize> {
        self.placement.as_ref().map(|p| p.wave_index)
    }

    pub fn assigned_agent(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.agent.as_str())
    }

    pub fn exceeds_threshold(&self) -> bool {
        self.exceeds_threshold
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub(crate) fn set_estimate(&mut self, estimate: TaskEstimate) {
        self.estimate = Some(estimate);
    }

    pub(crate) fn annotate(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub(crate) fn flag_threshold(&mut self, exceeds: bool) {
        self.exceeds_threshold = exceeds;
    }

    pub(crate) fn place(&mut self, placement: Placement) -> Result<()> {
        self.advance(TaskPhase::Assigned)?;
        self.placement = Some(placement);
        Ok(())
    }

    pub(crate) fn advance(&mut self, to: TaskPhase) -> Result<()> {
        if to < self.phase {
            return Err(Error::Validation(format!(
                "task {} cannot move from {} back to {}",
                self.id, self.phase, to
            )));
        }
        self.phase = to;
        Ok(())
    }
}
