//! Default duration tables.
//!
//! Loaded once per run (from config or calibration) and passed into the
//! estimator and tier classifier explicitly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::core::task::{SizeTier, TaskType, ThreePoint};
use crate::error::Result;

static RESEARCH_DEPTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(deep|thorough|comprehensive|in[-\s]?depth|extensive|detailed|literature review|systematic)\b",
    )
    .unwrap()
});

/// Coding baselines per size tier, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(rename = "XS")]
    pub xs: ThreePoint,
    #[serde(rename = "S")]
    pub s: ThreePoint,
    #[serde(rename = "M")]
    pub m: ThreePoint,
    #[serde(rename = "L")]
    pub l: ThreePoint,
    #[serde(rename = "XL")]
    pub xl: ThreePoint,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            xs: ThreePoint::new(5.0, 10.0, 20.0),
            s: ThreePoint::new(12.0, 23.0, 40.0),
            m: ThreePoint::new(25.0, 50.0, 90.0),
            l: ThreePoint::new(45.0, 95.0, 180.0),
            xl: ThreePoint::new(90.0, 180.0, 360.0),
        }
    }
}

impl TierTable {
    pub fn get(&self, tier: SizeTier) -> ThreePoint {
        match tier {
            SizeTier::XS => self.xs,
            SizeTier::S => self.s,
            SizeTier::M => self.m,
            SizeTier::L => self.l,
            SizeTier::XL => self.xl,
        }
    }

    /// Every triple scaled by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            xs: self.xs.scaled(factor),
            s: self.s.scaled(factor),
            m: self.m.scaled(factor),
            l: self.l.scaled(factor),
            xl: self.xl.scaled(factor),
        }
    }
}

/// Flat baselines for the non-coding task types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBaselines {
    pub brainstorm: ThreePoint,
    pub research: ThreePoint,
    pub research_deep: ThreePoint,
    pub config: ThreePoint,
    pub documentation: ThreePoint,
}

impl Default for CategoryBaselines {
    fn default() -> Self {
        Self {
            brainstorm: ThreePoint::new(5.0, 10.0, 15.0),
            research: ThreePoint::new(10.0, 20.0, 30.0),
            research_deep: ThreePoint::new(25.0, 35.0, 50.0),
            config: ThreePoint::new(10.0, 20.0, 35.0),
            documentation: ThreePoint::new(10.0, 25.0, 45.0),
        }
    }
}

/// The tier and category tables together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DurationTables {
    pub tiers: TierTable,
    pub categories: CategoryBaselines,
}

impl DurationTables {
    /// Baseline triple for a task of `task_type` and `tier`.
    ///
    /// Coding reads the tier table; other types use their flat baseline and
    /// ignore the tier. Research switches to the deep band when the
    /// description asks for depth.
    pub fn baseline(&self, task_type: TaskType, tier: SizeTier, description: &str) -> ThreePoint {
        match task_type {
            TaskType::Coding => self.tiers.get(tier),
            TaskType::Brainstorm => self.categories.brainstorm,
            TaskType::Research if RESEARCH_DEPTH_RE.is_match(description) => {
                self.categories.research_deep
            }
            TaskType::Research => self.categories.research,
            TaskType::Config => self.categories.config,
            TaskType::Documentation => self.categories.documentation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for tier in SizeTier::ORDER {
            self.tiers.get(tier).validate()?;
        }
        let c = &self.categories;
        for triple in [c.brainstorm, c.research, c.research_deep, c.config, c.documentation] {
            triple.validate()?;
        }
        Ok(())
    }
}
