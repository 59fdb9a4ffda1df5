//! Wave planner for dependency-aware parallel scheduling.
//!
//! The planner walks the DAG wave by wave. Each wave takes the tasks whose
//! dependencies were all placed in earlier waves, orders them by a stable
//! key and hands each one to the least-loaded qualifying agent with spare
//! capacity. Tasks that find no free agent roll into the next wave.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::core::dag::TaskDAG;
use crate::core::task::{Placement, TaskId, TaskNode, TaskPhase};
use crate::error::{Error, ReferenceKind, Result};
use crate::fleet::{CapabilityMap, Fleet};
use crate::{alog_debug, alog_trace};

/// Work multiplier for every task after an agent's first in the same wave.
pub const CO_DISPATCH_FACTOR: f64 = 0.5;

/// One task placed on one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveAssignment {
    /// The placed task.
    pub task: TaskId,
    /// Name of the agent running it.
    pub agent: String,
    /// Work minutes charged to the wave, after the co-dispatch discount.
    pub work_minutes: f64,
    /// The task's own review minutes (the wave charges the agent's max).
    pub review_minutes: f64,
    /// True when this was not the agent's first task in the wave.
    pub co_dispatched: bool,
}

/// What one agent does in one wave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentWaveLoad {
    pub agent: String,
    pub tasks: Vec<TaskId>,
    pub work_minutes: f64,
    /// Single review cycle covering all of the agent's tasks in the wave.
    pub review_minutes: f64,
}

impl AgentWaveLoad {
    pub fn total_minutes(&self) -> f64 {
        self.work_minutes + self.review_minutes
    }
}

/// A scheduling round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Zero-based position in the plan.
    pub index: usize,
    /// Assignments in placement order.
    pub assignments: Vec<WaveAssignment>,
    /// Per-agent totals, in fleet declaration order. Idle agents are omitted.
    pub agents: Vec<AgentWaveLoad>,
    pub duration_minutes: f64,
    /// Plan-clock minute the wave starts at, after preceding overheads.
    pub start_minutes: f64,
    pub end_minutes: f64,
}

impl Wave {
    pub fn task_count(&self) -> usize {
        self.assignments.len()
    }
}

/// Ordered waves plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    pub waves: Vec<Wave>,
    pub inter_wave_overhead: f64,
    /// Sum of wave durations plus overhead between consecutive waves.
    pub total_minutes: f64,
}

impl WavePlan {
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Stamp each wave's start and end and return the plan's end. Waves
    /// run back to back with `inter_wave_overhead` between consecutive ones.
    fn schedule(waves: &mut [Wave], inter_wave_overhead: f64) -> f64 {
        let mut clock = 0.0;
        for (i, wave) in waves.iter_mut().enumerate() {
            if i > 0 {
                clock += inter_wave_overhead;
            }
            wave.start_minutes = clock;
            clock += wave.duration_minutes;
            wave.end_minutes = clock;
        }
        clock
    }
}

/// Greedy wave planner over a fixed fleet.
pub struct WavePlanner<'a> {
    fleet: &'a Fleet,
    capabilities: &'a CapabilityMap,
    inter_wave_overhead: f64,
}

impl<'a> WavePlanner<'a> {
    pub fn new(fleet: &'a Fleet, capabilities: &'a CapabilityMap, inter_wave_overhead: f64) -> Self {
        Self {
            fleet,
            capabilities,
            inter_wave_overhead,
        }
    }

    /// Agents allowed to run `task`, in declaration order.
    ///
    /// # Errors
    /// - `UnknownReference` if the task is pinned to an agent not in the fleet
    /// - `CapabilityMismatch` if no allowed agent holds a matching capability
    pub fn candidates(&self, task: &TaskNode) -> Result<Vec<usize>> {
        let candidates = match &task.pinned_agent {
            Some(name) => {
                let position = self.fleet.position(name).ok_or_else(|| Error::UnknownReference {
                    kind: ReferenceKind::Agent,
                    id: name.clone(),
                    referenced_by: task.id.to_string(),
                })?;
                let agent = &self.fleet.agents()[position];
                if agent.can_run(task.task_type, self.capabilities) {
                    vec![position]
                } else {
                    Vec::new()
                }
            }
            None => self.fleet.qualifying(task.task_type, self.capabilities),
        };
        if candidates.is_empty() {
            return Err(Error::CapabilityMismatch {
                task: task.id.to_string(),
                task_type: task.task_type.to_string(),
            });
        }
        Ok(candidates)
    }

    /// Place every task and write each task's placement.
    ///
    /// `dag` must have been built from `tasks` so node positions line up
    /// with the slice. Every task must already carry an estimate.
    pub fn plan(&self, tasks: &mut [TaskNode], dag: &TaskDAG) -> Result<WavePlan> {
        if dag.task_count() != tasks.len() {
            return Err(Error::Validation(format!(
                "graph has {} tasks but {} were given",
                dag.task_count(),
                tasks.len()
            )));
        }
        let mut candidates = Vec::with_capacity(tasks.len());
        for task in tasks.iter() {
            if task.estimate().is_none() {
                return Err(Error::Validation(format!("task {} has no estimate", task.id)));
            }
            candidates.push(self.candidates(task)?);
        }

        let mut placed: HashSet<usize> = HashSet::new();
        let mut waves = Vec::new();

        while !dag.all_placed(&placed) {
            let index = waves.len();
            let mut ready = dag.ready_tasks(&placed);
            for &pos in &ready {
                tasks[pos].advance(TaskPhase::Ready)?;
            }
            ready.sort_by(|&a, &b| dispatch_order(&tasks[a], &tasks[b]));

            let mut load = vec![0u32; self.fleet.len()];
            let mut assignments = Vec::new();
            let mut placed_now = Vec::new();

            for pos in ready {
                let Some(agent_pos) = self.least_loaded(&candidates[pos], &load) else {
                    alog_trace!("wave {}: task {} waits for capacity", index, tasks[pos].id);
                    continue;
                };
                let co_dispatched = load[agent_pos] > 0;
                load[agent_pos] += 1;

                let task = &mut tasks[pos];
                let (expected, review) = match task.estimate() {
                    Some(e) => (e.expected_minutes, e.review_minutes),
                    None => (0.0, 0.0),
                };
                let work_minutes = if co_dispatched {
                    expected * CO_DISPATCH_FACTOR
                } else {
                    expected
                };
                let agent = self.fleet.agents()[agent_pos].name.clone();
                alog_trace!(
                    "wave {}: {} -> {} ({:.1}m{})",
                    index,
                    task.id,
                    agent,
                    work_minutes,
                    if co_dispatched { ", co-dispatched" } else { "" }
                );
                task.place(Placement {
                    wave_index: index,
                    agent: agent.clone(),
                    work_minutes,
                    co_dispatched,
                })?;
                assignments.push(WaveAssignment {
                    task: task.id.clone(),
                    agent,
                    work_minutes,
                    review_minutes: review,
                    co_dispatched,
                });
                placed_now.push(pos);
            }

            if placed_now.is_empty() {
                return Err(Error::Validation(format!(
                    "wave {} could not place any ready task",
                    index
                )));
            }
            placed.extend(placed_now);

            let wave = self.close_wave(index, assignments);
            alog_debug!(
                "wave {}: {} tasks across {} agents, {:.1}m",
                index,
                wave.task_count(),
                wave.agents.len(),
                wave.duration_minutes
            );
            waves.push(wave);
        }

        let total_minutes = WavePlan::schedule(&mut waves, self.inter_wave_overhead);
        Ok(WavePlan {
            waves,
            inter_wave_overhead: self.inter_wave_overhead,
            total_minutes,
        })
    }

    /// Fewest tasks this wave wins; ties go to declaration order. Agents at
    /// their parallelism limit are skipped.
    fn least_loaded(&self, candidates: &[usize], load: &[u32]) -> Option<usize> {
        let agents = self.fleet.agents();
        candidates
            .iter()
            .copied()
            .filter(|&i| load[i] < agents[i].parallelism)
            .min_by_key(|&i| (load[i], i))
    }

    fn close_wave(&self, index: usize, assignments: Vec<WaveAssignment>) -> Wave {
        let mut agents = Vec::new();
        for profile in self.fleet.agents() {
            let mine: Vec<&WaveAssignment> =
                assignments.iter().filter(|a| a.agent == profile.name).collect();
            if mine.is_empty() {
                continue;
            }
            agents.push(AgentWaveLoad {
                agent: profile.name.clone(),
                tasks: mine.iter().map(|a| a.task.clone()).collect(),
                work_minutes: mine.iter().map(|a| a.work_minutes).sum(),
                review_minutes: mine.iter().map(|a| a.review_minutes).fold(0.0, f64::max),
            });
        }
        let duration_minutes = agents
            .iter()
            .map(AgentWaveLoad::total_minutes)
            .fold(0.0, f64::max);
        Wave {
            index,
            assignments,
            agents,
            duration_minutes,
            start_minutes: 0.0,
            end_minutes: 0.0,
        }
    }
}

/// Prioritized tasks first (lower number sooner), then input order, then id.
fn dispatch_order(a: &TaskNode, b: &TaskNode) -> Ordering {
    let key = |t: &TaskNode| (t.priority.is_none(), t.priority.unwrap_or(0), t.sequence);
    key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
}
