use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::estimation::tables::DurationTables;
use crate::estimation::threshold::{ThresholdBasis, ThresholdTable};
use crate::fleet::{AgentProfile, CapabilityMap, Fleet};
use crate::{alog_debug, Error, Result};

const DATA_DIR: &str = ".agent-estimate";
const CONFIG_FILE: &str = "config.toml";

fn default_friction() -> f64 {
    1.0
}

fn default_inter_wave_overhead() -> f64 {
    15.0
}

fn default_metr_fallback() -> f64 {
    40.0
}

fn default_auto_tier() -> bool {
    true
}

/// Run-wide constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSettings {
    /// Inflates every estimate for real-world overhead. At least 1.0.
    #[serde(default = "default_friction")]
    pub friction_multiplier: f64,
    /// Minutes charged between consecutive waves.
    #[serde(default = "default_inter_wave_overhead")]
    pub inter_wave_overhead: f64,
    /// Legacy percentage; superseded by per-task review minutes and only
    /// carried through to the report.
    #[serde(default)]
    pub review_overhead: f64,
    /// Threshold for model tiers missing from the threshold table.
    #[serde(default = "default_metr_fallback")]
    pub metr_fallback_threshold: f64,
    #[serde(default)]
    pub threshold_basis: ThresholdBasis,
    #[serde(default = "default_auto_tier")]
    pub auto_tier: bool,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            friction_multiplier: default_friction(),
            inter_wave_overhead: default_inter_wave_overhead(),
            review_overhead: 0.0,
            metr_fallback_threshold: default_metr_fallback(),
            threshold_basis: ThresholdBasis::default(),
            auto_tier: default_auto_tier(),
        }
    }
}

impl PlanSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.friction_multiplier.is_finite() && self.friction_multiplier >= 1.0) {
            return Err(Error::range(
                "friction_multiplier",
                format!("must be >= 1.0, got {}", self.friction_multiplier),
            ));
        }
        if !(self.inter_wave_overhead.is_finite() && self.inter_wave_overhead >= 0.0) {
            return Err(Error::range(
                "inter_wave_overhead",
                format!("must be >= 0, got {}", self.inter_wave_overhead),
            ));
        }
        if !(self.review_overhead.is_finite() && self.review_overhead >= 0.0) {
            return Err(Error::range(
                "review_overhead",
                format!("must be >= 0, got {}", self.review_overhead),
            ));
        }
        if !(self.metr_fallback_threshold.is_finite() && self.metr_fallback_threshold > 0.0) {
            return Err(Error::range(
                "metr_fallback_threshold",
                format!("must be > 0, got {}", self.metr_fallback_threshold),
            ));
        }
        Ok(())
    }
}

/// Fleet and settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateConfig {
    pub agents: Vec<AgentProfile>,
    #[serde(default)]
    pub settings: PlanSettings,
    #[serde(default)]
    pub thresholds: ThresholdTable,
    #[serde(default)]
    pub tables: DurationTables,
    #[serde(default)]
    pub capabilities: CapabilityMap,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        let mut claude = AgentProfile::new(
            "claude",
            &["planning", "implementation", "review", "research", "documentation"],
            2,
            "opus",
        );
        claude.cost_per_turn = 0.12;
        let mut codex = AgentProfile::new("codex", &["implementation", "review", "config"], 2, "sonnet");
        codex.cost_per_turn = 0.08;
        Self {
            agents: vec![claude, codex],
            settings: PlanSettings::default(),
            thresholds: ThresholdTable::default(),
            tables: DurationTables::default(),
            capabilities: CapabilityMap::default(),
        }
    }
}

impl EstimateConfig {
    pub fn data_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(DATA_DIR))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        alog_debug!("EstimateConfig::load path={}", path.display());
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        alog_debug!(
            "Config loaded: agents={}, friction={}, basis={:?}",
            config.agents.len(),
            config.settings.friction_multiplier,
            config.settings.threshold_basis
        );
        Ok(config)
    }

    /// Load `~/.agent-estimate/config.toml`, or the built-in defaults when it
    /// does not exist.
    pub fn load_default() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            alog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                alog_debug!("Creating config directory: {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        alog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn fleet(&self) -> Fleet {
        Fleet::new(self.agents.clone())
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        self.tables.validate()?;
        self.fleet().validate()
    }
}
