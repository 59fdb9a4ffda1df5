//! Plan output consumed by rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calibration::WarmContext;
use crate::config::PlanSettings;
use crate::core::task::{SizeTier, TaskEstimate, TaskNode, TaskType};
use crate::planning::metrics::PlanMetrics;
use crate::planning::waves::WavePlan;

/// Per-task output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub id: String,
    pub description: String,
    pub task_type: TaskType,
    pub tier: SizeTier,
    pub expected_minutes: f64,
    pub std_dev_minutes: f64,
    pub optimistic_minutes: f64,
    pub pessimistic_minutes: f64,
    pub review_minutes: f64,
    pub human_equivalent_minutes: f64,
    pub exceeds_threshold: bool,
    pub wave_index: Option<usize>,
    pub assigned_agent: Option<String>,
    /// Minutes charged to the wave after the co-dispatch discount.
    pub work_minutes: Option<f64>,
    pub annotations: Vec<String>,
}

impl From<&TaskNode> for TaskReport {
    fn from(task: &TaskNode) -> Self {
        let est = task.estimate();
        let get = |f: fn(&TaskEstimate) -> f64| est.map(f).unwrap_or(0.0);
        Self {
            id: task.id.to_string(),
            description: task.description.clone(),
            task_type: task.task_type,
            tier: task.tier,
            expected_minutes: get(|e| e.expected_minutes),
            std_dev_minutes: get(|e| e.std_dev_minutes),
            optimistic_minutes: get(|e| e.optimistic_minutes),
            pessimistic_minutes: get(|e| e.pessimistic_minutes),
            review_minutes: get(|e| e.review_minutes),
            human_equivalent_minutes: get(|e| e.human_equivalent_minutes),
            exceeds_threshold: task.exceeds_threshold(),
            wave_index: task.wave_index(),
            assigned_agent: task.assigned_agent().map(str::to_string),
            work_minutes: task.placement().map(|p| p.work_minutes),
            annotations: task.annotations().iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Everything a planning run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// In input order.
    pub tasks: Vec<TaskReport>,
    pub plan: WavePlan,
    pub metrics: PlanMetrics,
    pub settings: PlanSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warm_context: Option<WarmContext>,
}

impl PlanReport {
    pub fn total_minutes(&self) -> f64 {
        self.plan.total_minutes
    }

    pub fn task(&self, id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn flagged(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.exceeds_threshold)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plain-text summary.
impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Plan: {} tasks in {} waves, {:.0}m total ({:.1}h)",
            self.tasks.len(),
            self.plan.wave_count(),
            self.total_minutes(),
            self.total_minutes() / 60.0
        )?;
        if self.plan.is_empty() {
            return writeln!(f, "No tasks to schedule.");
        }
        for wave in &self.plan.waves {
            writeln!(f)?;
            writeln!(
                f,
                "Wave {} ({:.0}m, {:.0}m to {:.0}m)",
                wave.index + 1,
                wave.duration_minutes,
                wave.start_minutes,
                wave.end_minutes
            )?;
            for a in &wave.assignments {
                let marker = self
                    .task(a.task.as_str())
                    .filter(|t| t.exceeds_threshold)
                    .map(|_| " !")
                    .unwrap_or("");
                writeln!(
                    f,
                    "  {:<12} -> {:<10} {:>6.1}m{}{}",
                    a.task.as_str(),
                    a.agent,
                    a.work_minutes,
                    if a.co_dispatched { " (co-dispatched)" } else { "" },
                    marker
                )?;
            }
        }

        let m = &self.metrics;
        writeln!(f)?;
        writeln!(
            f,
            "Critical path: {} ({:.0}m)",
            m.critical_path
                .tasks
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(" -> "),
            m.critical_path.minutes
        )?;
        writeln!(
            f,
            "Timeline: best {:.0}m / expected {:.0}m / worst {:.0}m",
            m.timeline.best_case_minutes, m.timeline.expected_minutes, m.timeline.worst_case_minutes
        )?;
        writeln!(f, "Parallel efficiency: {:.0}%", m.parallel_efficiency * 100.0)?;
        for load in &m.agent_loads {
            writeln!(
                f,
                "  {:<10} {} tasks, {:.0}m work, {:.0}% utilized, ~${:.2}",
                load.agent,
                load.task_count,
                load.work_minutes,
                load.utilization * 100.0,
                load.estimated_cost
            )?;
        }

        let notes: Vec<(&str, &String)> = self
            .tasks
            .iter()
            .flat_map(|t| t.annotations.iter().map(move |n| (t.id.as_str(), n)))
            .collect();
        if !notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for (id, note) in notes {
                writeln!(f, "  {}: {}", id, note)?;
            }
        }
        if let Some(warm) = &self.warm_context {
            if let Some(detail) = &warm.detail {
                writeln!(f, "warm_context {:.1} ({})", warm.value, detail)?;
            }
        }
        Ok(())
    }
}
