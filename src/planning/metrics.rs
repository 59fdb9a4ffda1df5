//! Derived plan metrics: critical path, per-agent load, utilization and
//! the best/expected/worst timeline.

use serde::{Deserialize, Serialize};

use crate::core::dag::TaskDAG;
use crate::core::task::{TaskId, TaskNode};
use crate::error::Result;
use crate::fleet::Fleet;
use crate::planning::waves::WavePlan;

/// Agent minutes per billed turn when converting work into cost.
pub const MINUTES_PER_TURN: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub tasks: Vec<TaskId>,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLoad {
    pub agent: String,
    pub task_count: usize,
    pub work_minutes: f64,
    pub review_minutes: f64,
    pub estimated_cost: f64,
    /// Busy minutes over total plan minutes.
    pub utilization: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub best_case_minutes: f64,
    pub expected_minutes: f64,
    pub worst_case_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub critical_path: CriticalPath,
    pub agent_loads: Vec<AgentLoad>,
    /// Work plus review minutes if every task ran back to back.
    pub sequential_minutes: f64,
    pub parallel_efficiency: f64,
    pub timeline: Timeline,
}

impl PlanMetrics {
    /// `tasks` must be estimated and placed, and in the order `dag` was
    /// built from.
    pub fn compute(tasks: &[TaskNode], dag: &TaskDAG, fleet: &Fleet, plan: &WavePlan) -> Result<Self> {
        let weights: Vec<f64> = tasks.iter().map(task_minutes).collect();
        let (path, path_minutes) = dag.critical_path(&weights)?;
        let critical_path = CriticalPath {
            tasks: path.into_iter().map(|i| tasks[i].id.clone()).collect(),
            minutes: path_minutes,
        };

        let total = plan.total_minutes;
        let agent_loads = fleet
            .agents()
            .iter()
            .map(|profile| {
                let mut load = AgentLoad {
                    agent: profile.name.clone(),
                    task_count: 0,
                    work_minutes: 0.0,
                    review_minutes: 0.0,
                    estimated_cost: 0.0,
                    utilization: 0.0,
                };
                for wave_load in plan.waves.iter().flat_map(|w| &w.agents) {
                    if wave_load.agent == profile.name {
                        load.task_count += wave_load.tasks.len();
                        load.work_minutes += wave_load.work_minutes;
                        load.review_minutes += wave_load.review_minutes;
                    }
                }
                load.estimated_cost = load.work_minutes / MINUTES_PER_TURN * profile.cost_per_turn;
                if total > 0.0 {
                    load.utilization = (load.work_minutes + load.review_minutes) / total;
                }
                load
            })
            .collect();

        let sequential_minutes: f64 = weights.iter().sum();
        let slots = fleet.total_slots() as f64;
        let parallel_efficiency = if total > 0.0 && slots > 0.0 {
            (sequential_minutes / (slots * total)).min(1.0)
        } else {
            0.0
        };

        Ok(Self {
            critical_path,
            agent_loads,
            sequential_minutes,
            parallel_efficiency,
            timeline: timeline(tasks, sequential_minutes, total),
        })
    }
}

fn task_minutes(task: &TaskNode) -> f64 {
    task.estimate()
        .map(|e| e.expected_minutes + e.review_minutes)
        .unwrap_or(0.0)
}

/// Best and worst cases scale the sequential optimistic and pessimistic
/// sums by the plan's wall-clock/sequential ratio.
fn timeline(tasks: &[TaskNode], sequential_minutes: f64, total: f64) -> Timeline {
    let ratio = if sequential_minutes > 0.0 {
        total / sequential_minutes
    } else {
        0.0
    };
    let (best, worst) = tasks
        .iter()
        .filter_map(|t| t.estimate())
        .fold((0.0, 0.0), |(b, w), e| {
            (
                b + e.optimistic_minutes + e.review_minutes,
                w + e.pessimistic_minutes + e.review_minutes,
            )
        });
    Timeline {
        best_case_minutes: best * ratio,
        expected_minutes: total,
        worst_case_minutes: worst * ratio,
    }
}
