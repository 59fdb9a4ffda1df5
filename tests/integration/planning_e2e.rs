//! End-to-end planning tests from TOML input to report.

use agent_estimate::core::{SizeTier, TaskFile, TaskType};
use agent_estimate::{Engine, EstimateConfig};

use crate::fixtures::{agent, assert_plan_invariants, config_with, diamond_tasks, TestWorkspace};

const FLEET: &str = r#"
[[agents]]
name = "X"
capabilities = ["implementation", "brainstorm"]
parallelism = 1
cost_per_turn = 0.10
model_tier = "opus"

[[agents]]
name = "Y"
capabilities = ["implementation", "research"]
parallelism = 1
model_tier = "sonnet"

[settings]
inter_wave_overhead = 10.0
"#;

/// Test: Three-task scenario from files
/// Given T1, T2 (after T1) and T3 with two single-slot agents
/// When the plan runs
/// Then wave 1 is T1->X, T3->Y and wave 2 is T2->X
#[test]
fn test_three_task_scenario_from_files() {
    let ws = TestWorkspace::new();
    let config_path = ws.write("fleet.toml", FLEET);
    let tasks_path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "T1"
task_type = "coding"
tier = "S"

[[tasks]]
id = "T2"
task_type = "coding"
tier = "XS"
dependencies = ["T1"]

[[tasks]]
id = "T3"
task_type = "coding"
tier = "XS"
"#,
    );

    let config = EstimateConfig::load(&config_path).unwrap();
    let engine = Engine::new(&config);
    let tasks = engine.load_tasks(&TaskFile::load(&tasks_path).unwrap()).unwrap();
    let report = engine.plan(tasks.clone()).unwrap();

    let placed = |id: &str| {
        let t = report.task(id).unwrap();
        (t.wave_index.unwrap(), t.assigned_agent.clone().unwrap())
    };
    assert_eq!(placed("T1"), (0, "X".to_string()));
    assert_eq!(placed("T3"), (0, "Y".to_string()));
    assert_eq!(placed("T2"), (1, "X".to_string()));

    // S = (12, 23, 40) -> 24.0; XS = (5, 10, 20) -> 10.833...
    let w = &report.plan.waves;
    assert!((w[0].duration_minutes - 24.0).abs() < 1e-9);
    assert!((report.total_minutes() - (24.0 + 10.0 + 65.0 / 6.0)).abs() < 1e-9);
    assert_plan_invariants(&report, &tasks, &config);
}

/// Test: Mixed task types route by capability
/// Given research, brainstorm and coding tasks
/// When the plan runs
/// Then research lands on Y and brainstorm on X
#[test]
fn test_mixed_types_route_by_capability() {
    let ws = TestWorkspace::new();
    let config = EstimateConfig::load(&ws.write("fleet.toml", FLEET)).unwrap();
    let tasks_path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "survey"
description = "Research caching libraries"

[[tasks]]
id = "names"
description = "Brainstorm names for the new module"

[[tasks]]
id = "build"
description = "Implement the cache layer"
depends_on = ["survey", "names"]
"#,
    );

    let engine = Engine::new(&config);
    let tasks = engine.load_tasks(&TaskFile::load(&tasks_path).unwrap()).unwrap();
    assert_eq!(tasks[0].task_type, TaskType::Research);
    assert_eq!(tasks[1].task_type, TaskType::Brainstorm);

    let report = engine.plan(tasks.clone()).unwrap();
    assert_eq!(report.task("survey").unwrap().assigned_agent.as_deref(), Some("Y"));
    assert_eq!(report.task("names").unwrap().assigned_agent.as_deref(), Some("X"));
    assert_eq!(report.task("build").unwrap().wave_index, Some(1));
    assert_plan_invariants(&report, &tasks, &config);
}

/// Test: Diamond dependency
/// Given root -> {left, right} -> join on two agents
/// When the plan runs
/// Then there are three waves and the critical path runs through right
#[test]
fn test_diamond_plan() {
    let config = config_with(vec![
        agent("A", &["coding"], 1, "opus"),
        agent("B", &["coding"], 1, "opus"),
    ]);
    let tasks = diamond_tasks();
    let report = Engine::new(&config).plan(tasks.clone()).unwrap();

    assert_eq!(report.plan.wave_count(), 3);
    assert_eq!(report.plan.waves[1].duration_minutes, 30.0);
    let path: Vec<&str> = report
        .metrics
        .critical_path
        .tasks
        .iter()
        .map(|t| t.as_str())
        .collect();
    assert_eq!(path, vec!["root", "right", "join"]);
    assert_eq!(report.metrics.critical_path.minutes, 45.0);
    assert_plan_invariants(&report, &tasks, &config);
}

/// Test: Review batching across a wave
/// Given one agent with two slots and two reviewed tasks
/// When both run in the same wave
/// Then the wave pays one review cycle at the larger review size
#[test]
fn test_review_batching_end_to_end() {
    let ws = TestWorkspace::new();
    let config = config_with(vec![agent("solo", &["implementation"], 2, "opus")]);
    let tasks_path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "a"
task_type = "coding"
optimistic = 20.0
likely = 20.0
pessimistic = 20.0
review_mode = "standard"

[[tasks]]
id = "b"
task_type = "coding"
optimistic = 20.0
likely = 20.0
pessimistic = 20.0
review_mode = "complex"
"#,
    );
    let engine = Engine::new(&config);
    let tasks = engine.load_tasks(&TaskFile::load(&tasks_path).unwrap()).unwrap();
    let report = engine.plan(tasks).unwrap();

    let wave = &report.plan.waves[0];
    assert_eq!(wave.agents[0].work_minutes, 30.0);
    assert_eq!(wave.agents[0].review_minutes, 25.0);
    assert_eq!(report.total_minutes(), 55.0);
    assert_eq!(report.task("b").unwrap().work_minutes, Some(10.0));
    assert_eq!(report.task("b").unwrap().expected_minutes, 20.0);
}

/// Test: Scope signals upgrade a coding task
/// Given a small task that declares 44 tests
/// When the plan runs
/// Then it is re-tiered to L and the report carries the reason
#[test]
fn test_scope_upgrade_reported() {
    let ws = TestWorkspace::new();
    let config = config_with(vec![agent("big", &["implementation"], 1, "opus")]);
    let tasks_path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "suite"
task_type = "coding"
tier = "M"
test_count = 44
"#,
    );
    let engine = Engine::new(&config);
    let tasks = engine.load_tasks(&TaskFile::load(&tasks_path).unwrap()).unwrap();
    let report = engine.plan(tasks).unwrap();

    let suite = report.task("suite").unwrap();
    assert_eq!(suite.tier, SizeTier::L);
    assert!(suite
        .annotations
        .iter()
        .any(|n| n == "Upgraded M\u{2192}L: 44 estimated tests (>20)"));
}

/// Test: JSON report
/// Given a planned run
/// When the report is serialized
/// Then it exposes per-task, per-wave and total figures
#[test]
fn test_json_report_shape() {
    let config = config_with(vec![agent("A", &["coding"], 2, "opus")]);
    let report = Engine::new(&config).plan(diamond_tasks()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["tasks"].as_array().unwrap().len(), 4);
    assert!(json["tasks"][0]["expected_minutes"].is_number());
    assert!(json["tasks"][0]["exceeds_threshold"].is_boolean());
    assert_eq!(json["plan"]["waves"].as_array().unwrap().len(), 3);
    assert!(json["plan"]["total_minutes"].is_number());
    assert!(json.get("warm_context").is_none());

    let text = report.to_string();
    assert!(text.starts_with("Plan: 4 tasks in 3 waves"));
    assert!(text.contains("Critical path: root -> right -> join"));
}
