//! Task input documents.
//!
//! A task file is TOML with one `[[tasks]]` entry per task. Entries may
//! leave out `task_type`, `tier` and the duration triple; the classifier and
//! the duration tables fill those in.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::alog_debug;
use crate::core::task::{Modifiers, ReviewMode, ScopeSignals, SizeTier, TaskId, TaskNode, TaskType, ThreePoint};
use crate::error::{Error, Result};
use crate::estimation::classifier::{Classification, Classifier};
use crate::estimation::tables::DurationTables;

/// One task as written by the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub task_type: Option<TaskType>,
    pub tier: Option<SizeTier>,
    pub optimistic: Option<f64>,
    pub likely: Option<f64>,
    pub pessimistic: Option<f64>,
    #[serde(default, alias = "depends_on")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub review_mode: ReviewMode,
    pub test_count: Option<u32>,
    pub line_count: Option<u32>,
    pub concern_count: Option<u32>,
    pub trivial: Option<bool>,
    pub priority: Option<u32>,
    /// Pin the task to this agent.
    pub agent: Option<String>,
}

impl TaskSpec {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    fn explicit_durations(&self) -> Result<Option<ThreePoint>> {
        match (self.optimistic, self.likely, self.pessimistic) {
            (Some(o), Some(m), Some(p)) => Ok(Some(ThreePoint::new(o, m, p))),
            (None, None, None) => Ok(None),
            _ => Err(Error::Validation(format!(
                "task {}: optimistic, likely and pessimistic must be given together",
                self.id
            ))),
        }
    }

    /// Build the engine's task node. `sequence` is the entry's position in
    /// the input.
    pub fn to_node(
        &self,
        sequence: usize,
        classifier: &dyn Classifier,
        tables: &DurationTables,
    ) -> Result<TaskNode> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation(format!("task #{} has an empty id", sequence + 1)));
        }

        let inferred: Option<Classification> = if self.task_type.is_none() || self.tier.is_none() {
            let c = classifier.classify(&self.description);
            alog_debug!("task {}: classified as {:?} ({})", self.id, c, c.signals.join(", "));
            Some(c)
        } else {
            None
        };

        let task_type = self
            .task_type
            .or(inferred.as_ref().map(|c| c.task_type))
            .unwrap_or_default();
        let tier = self
            .tier
            .or(inferred.as_ref().map(|c| c.tier))
            .unwrap_or_default();
        let trivial = self
            .trivial
            .unwrap_or_else(|| self.tier.is_none() && inferred.as_ref().is_some_and(|c| c.trivial));
        let durations = match self.explicit_durations()? {
            Some(triple) => triple,
            None => tables.baseline(task_type, tier, &self.description),
        };

        let mut node = TaskNode::new(self.id.trim(), task_type, tier, durations)
            .with_description(&self.description)
            .with_modifiers(self.modifiers)
            .with_review_mode(self.review_mode)
            .with_sequence(sequence);
        node.dependencies = self.dependencies.iter().map(|d| TaskId::new(d.trim())).collect();
        node.scope = ScopeSignals {
            test_count: self.test_count,
            line_count: self.line_count,
            concern_count: self.concern_count,
            trivial,
        };
        node.priority = self.priority;
        node.pinned_agent = self.agent.clone();
        Ok(node)
    }
}

/// A `[[tasks]]` document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl TaskFile {
    pub fn load(path: &Path) -> Result<Self> {
        alog_debug!("TaskFile::load path={}", path.display());
        let file: Self = toml::from_str(&fs::read_to_string(path)?)?;
        alog_debug!("Loaded {} task entries", file.tasks.len());
        Ok(file)
    }

    pub fn to_nodes(&self, classifier: &dyn Classifier, tables: &DurationTables) -> Result<Vec<TaskNode>> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.to_node(i, classifier, tables))
            .collect()
    }
}
