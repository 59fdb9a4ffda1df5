//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Temporary workspaces holding config and task files
//! - Fleet builders
//! - Predefined task sets (chain, diamond, independent, generated)
//! - Plan invariant checks

use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

use agent_estimate::core::{SizeTier, TaskNode, TaskType, ThreePoint};
use agent_estimate::fleet::AgentProfile;
use agent_estimate::{EstimateConfig, PlanReport};

/// A temporary directory with helpers for writing input files.
pub struct TestWorkspace {
    /// Keeps the directory alive for the test's duration.
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().to_path_buf();
        Self { temp_dir, path }
    }

    /// Write `contents` to `name` inside the workspace.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        std::fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }
}

/// An agent with the given capabilities.
pub fn agent(name: &str, capabilities: &[&str], parallelism: u32, model_tier: &str) -> AgentProfile {
    AgentProfile::new(name, capabilities, parallelism, model_tier)
}

/// A config with `agents` and default settings and tables.
pub fn config_with(agents: Vec<AgentProfile>) -> EstimateConfig {
    EstimateConfig {
        agents,
        ..EstimateConfig::default()
    }
}

/// `n` coding agents named `agent-0..n`, each with `parallelism` slots.
pub fn coding_fleet(n: usize, parallelism: u32) -> EstimateConfig {
    config_with(
        (0..n)
            .map(|i| agent(&format!("agent-{}", i), &["implementation"], parallelism, "opus"))
            .collect(),
    )
}

/// A coding task whose expected duration is exactly `minutes`.
pub fn flat_task(id: &str, minutes: f64, deps: &[&str], sequence: usize) -> TaskNode {
    TaskNode::new(
        id,
        TaskType::Coding,
        SizeTier::M,
        ThreePoint::new(minutes, minutes, minutes),
    )
    .with_dependencies(deps)
    .with_sequence(sequence)
}

/// Tasks `t0 <- t1 <- ... <- t(n-1)`.
pub fn chain_tasks(n: usize) -> Vec<TaskNode> {
    (0..n)
        .map(|i| {
            let dep = format!("t{}", i.wrapping_sub(1));
            let deps: Vec<&str> = if i == 0 { vec![] } else { vec![dep.as_str()] };
            flat_task(&format!("t{}", i), 10.0, &deps, i)
        })
        .collect()
}

/// `root -> {left, right} -> join`.
pub fn diamond_tasks() -> Vec<TaskNode> {
    vec![
        flat_task("root", 10.0, &[], 0),
        flat_task("left", 20.0, &["root"], 1),
        flat_task("right", 30.0, &["root"], 2),
        flat_task("join", 5.0, &["left", "right"], 3),
    ]
}

pub fn independent_tasks(n: usize) -> Vec<TaskNode> {
    (0..n)
        .map(|i| flat_task(&format!("t{}", i), 10.0 + i as f64, &[], i))
        .collect()
}

/// Deterministic pseudo-random layered DAG. Dependencies always point at
/// earlier tasks, so the result is acyclic.
pub fn generated_tasks(n: usize, seed: u64) -> Vec<TaskNode> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let mut tasks = Vec::with_capacity(n);
    for i in 0..n {
        let mut deps: Vec<String> = Vec::new();
        if i > 0 {
            for _ in 0..(next() % 3) {
                let dep = format!("g{}", next() % i);
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
        let o = 5.0 + (next() % 30) as f64;
        let m = o + (next() % 30) as f64;
        let p = m + (next() % 60) as f64;
        let mut task = TaskNode::new(format!("g{}", i), TaskType::Coding, SizeTier::M, ThreePoint::new(o, m, p))
            .with_sequence(i);
        task.dependencies = deps.iter().map(|d| d.as_str().into()).collect();
        if next() % 4 == 0 {
            task.priority = Some((next() % 3) as u32);
        }
        tasks.push(task);
    }
    tasks
}

/// Assert dependency, capacity and total-duration invariants on a report.
pub fn assert_plan_invariants(report: &PlanReport, tasks: &[TaskNode], config: &EstimateConfig) {
    let waves: HashMap<&str, usize> = report
        .tasks
        .iter()
        .map(|t| (t.id.as_str(), t.wave_index.expect("every task is placed")))
        .collect();

    for task in tasks {
        for dep in &task.dependencies {
            assert!(
                waves[task.id.as_str()] > waves[dep.as_str()],
                "{} (wave {}) must come after {} (wave {})",
                task.id,
                waves[task.id.as_str()],
                dep,
                waves[dep.as_str()]
            );
        }
    }

    for wave in &report.plan.waves {
        for load in &wave.agents {
            let profile = config
                .agents
                .iter()
                .find(|a| a.name == load.agent)
                .expect("assigned agent is in the fleet");
            assert!(
                load.tasks.len() as u32 <= profile.parallelism,
                "agent {} over capacity in wave {}",
                load.agent,
                wave.index
            );
        }
    }

    let busy: f64 = report.plan.waves.iter().map(|w| w.duration_minutes).sum();
    let gaps = report.plan.waves.len().saturating_sub(1) as f64;
    let expected_total = busy + gaps * config.settings.inter_wave_overhead;
    assert!((report.total_minutes() - expected_total).abs() < 1e-9);

    let mut previous_end: Option<f64> = None;
    for wave in &report.plan.waves {
        let gap = previous_end.map_or(0.0, |end| end + config.settings.inter_wave_overhead);
        assert!((wave.start_minutes - gap).abs() < 1e-9, "wave {} starts late", wave.index);
        assert!((wave.end_minutes - wave.start_minutes - wave.duration_minutes).abs() < 1e-9);
        previous_end = Some(wave.end_minutes);
    }
    assert!((previous_end.unwrap_or(0.0) - report.total_minutes()).abs() < 1e-9);
}
