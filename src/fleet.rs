//! Agent fleet configuration and capability matching.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::task::TaskType;
use crate::error::{Error, Result};

/// One member of the executing fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub capabilities: Vec<String>,
    /// Max tasks this agent may run within one wave.
    pub parallelism: u32,
    #[serde(default)]
    pub cost_per_turn: f64,
    pub model_tier: String,
}

impl AgentProfile {
    pub fn new(name: &str, capabilities: &[&str], parallelism: u32, model_tier: &str) -> Self {
        Self {
            name: name.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            parallelism,
            cost_per_turn: 0.0,
            model_tier: model_tier.to_string(),
        }
    }

    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(tag))
    }

    /// True when the agent holds at least one tag `task_type` accepts.
    pub fn can_run(&self, task_type: TaskType, map: &CapabilityMap) -> bool {
        map.tags_for(task_type).iter().any(|tag| self.has_capability(tag))
    }
}

/// Which capability tags qualify an agent for each task type (any-of).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityMap {
    pub coding: Vec<String>,
    pub brainstorm: Vec<String>,
    pub research: Vec<String>,
    pub config: Vec<String>,
    pub documentation: Vec<String>,
}

impl Default for CapabilityMap {
    fn default() -> Self {
        let tags = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            coding: tags(&["implementation", "coding"]),
            brainstorm: tags(&["planning", "brainstorm"]),
            research: tags(&["research", "planning"]),
            config: tags(&["config", "implementation"]),
            documentation: tags(&["documentation", "implementation"]),
        }
    }
}

impl CapabilityMap {
    pub fn tags_for(&self, task_type: TaskType) -> &[String] {
        match task_type {
            TaskType::Coding => &self.coding,
            TaskType::Brainstorm => &self.brainstorm,
            TaskType::Research => &self.research,
            TaskType::Config => &self.config,
            TaskType::Documentation => &self.documentation,
        }
    }
}

/// The full fleet, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fleet {
    agents: Vec<AgentProfile>,
}

impl Fleet {
    pub fn new(agents: Vec<AgentProfile>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &[AgentProfile] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Positions of agents able to run `task_type`, in declaration order.
    pub fn qualifying(&self, task_type: TaskType, map: &CapabilityMap) -> Vec<usize> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.can_run(task_type, map))
            .map(|(i, _)| i)
            .collect()
    }

    /// Total concurrent slots across the fleet.
    pub fn total_slots(&self) -> u32 {
        self.agents.iter().map(|a| a.parallelism).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("fleet must contain at least one agent".into()));
        }
        let mut names = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(Error::Validation("agent name must not be empty".into()));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(Error::Validation(format!("duplicate agent name: {}", agent.name)));
            }
            if agent.parallelism == 0 {
                return Err(Error::range(
                    "parallelism",
                    format!("agent {} must have parallelism >= 1", agent.name),
                ));
            }
            if !(agent.cost_per_turn >= 0.0) {
                return Err(Error::range(
                    "cost_per_turn",
                    format!("agent {} must have cost_per_turn >= 0", agent.name),
                ));
            }
            if agent.capabilities.is_empty() {
                return Err(Error::Validation(format!(
                    "agent {} must declare at least one capability",
                    agent.name
                )));
            }
        }
        Ok(())
    }
}
