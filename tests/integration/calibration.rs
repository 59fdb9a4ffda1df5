//! Observation store and dispatch history feeding back into planning.

use chrono::{Duration, Utc};

use agent_estimate::calibration::{
    infer_warm_context, CalibrationSink, CalibrationSource, JsonlCalibrationStore, ObservationRecord,
    WarmContextSource,
};
use agent_estimate::core::{Modifiers, SizeTier, TaskFile, TaskType, ThreePoint};
use agent_estimate::Engine;

use crate::fixtures::{coding_fleet, flat_task, TestWorkspace};

fn record_many(store: &mut JsonlCalibrationStore, n: usize, estimated: f64, actual: f64) {
    for _ in 0..n {
        store
            .append(ObservationRecord::new(TaskType::Coding, estimated, actual))
            .expect("append observation");
    }
}

/// Test: Calibrated tiers flow into estimates
/// Given five coding observations that ran 1.5x over estimate
/// When defaults are loaded from the store and used for an M task
/// Then the task's expected minutes are 1.5x the built-in value
#[test]
fn test_calibrated_tables_scale_estimates() {
    let ws = TestWorkspace::new();
    let mut store = JsonlCalibrationStore::new(ws.path.join("obs.jsonl"));
    record_many(&mut store, 5, 20.0, 30.0);

    let defaults = store.defaults().unwrap();
    assert_eq!(defaults.tables.tiers.get(SizeTier::M).likely, 75.0);

    let tasks_path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "feature"
task_type = "coding"
tier = "M"
"#,
    );
    let config = coding_fleet(1, 1);
    let engine = Engine::new(&config).with_tables(defaults.tables);
    let tasks = engine.load_tasks(&TaskFile::load(&tasks_path).unwrap()).unwrap();
    let report = engine.plan(tasks).unwrap();

    // Built-in M: (25 + 4*50 + 90) / 6 = 52.5
    let expected = report.task("feature").unwrap().expected_minutes;
    assert!((expected - 52.5 * 1.5).abs() < 1e-9, "got {}", expected);
}

/// Test: Calibration keeps customized category baselines
/// Given a config overriding the config-category baseline and a store
/// with five coding observations running 1.5x over
/// When the engine is calibrated from the store
/// Then coding tiers scale while the custom config baseline is untouched
#[test]
fn test_calibration_keeps_config_categories() {
    let ws = TestWorkspace::new();
    let mut store = JsonlCalibrationStore::new(ws.path.join("obs.jsonl"));
    record_many(&mut store, 5, 20.0, 30.0);

    let mut config = coding_fleet(1, 1);
    config.tables.categories.config = ThreePoint::new(30.0, 40.0, 60.0);
    let tasks_path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "feature"
task_type = "coding"
tier = "M"

[[tasks]]
id = "settings"
task_type = "config"
tier = "M"
"#,
    );

    let engine = Engine::new(&config).with_calibration(&store).unwrap();
    assert_eq!(engine.tables().categories.config, ThreePoint::new(30.0, 40.0, 60.0));
    let tasks = engine.load_tasks(&TaskFile::load(&tasks_path).unwrap()).unwrap();
    let report = engine.plan(tasks).unwrap();

    let feature = report.task("feature").unwrap().expected_minutes;
    assert!((feature - 52.5 * 1.5).abs() < 1e-9, "got {}", feature);
    // (30 + 4*40 + 60) / 6
    let settings = report.task("settings").unwrap().expected_minutes;
    assert!((settings - 250.0 / 6.0).abs() < 1e-9, "got {}", settings);
}

/// Test: Calibration needs enough history
/// Given four coding observations
/// When defaults are loaded
/// Then the built-in tiers are returned unchanged
#[test]
fn test_calibration_below_floor_is_ignored() {
    let ws = TestWorkspace::new();
    let mut store = JsonlCalibrationStore::new(ws.path.join("obs.jsonl"));
    record_many(&mut store, 4, 20.0, 60.0);

    let defaults = store.defaults().unwrap();
    assert_eq!(defaults.tables.tiers.get(SizeTier::M).likely, 50.0);
}

/// Test: Calibration factor is clamped
/// Given observations running 4x over
/// When defaults are loaded
/// Then tiers scale by at most 2x
#[test]
fn test_calibration_factor_clamped() {
    let ws = TestWorkspace::new();
    let mut store = JsonlCalibrationStore::new(ws.path.join("obs.jsonl"));
    record_many(&mut store, 6, 10.0, 40.0);

    let defaults = store.defaults().unwrap();
    assert_eq!(defaults.tables.tiers.get(SizeTier::M).likely, 100.0);
}

/// Test: Summary statistics survive a reopen
/// Given observations with ratios 1.0, 2.0 and 3.0
/// When a fresh store handle reads the same file
/// Then mean and median are 2.0
#[test]
fn test_summary_from_reopened_store() {
    let ws = TestWorkspace::new();
    let path = ws.path.join("nested").join("obs.jsonl");
    {
        let mut store = JsonlCalibrationStore::new(&path);
        for actual in [10.0, 20.0, 30.0] {
            store
                .append(ObservationRecord::new(TaskType::Coding, 10.0, actual))
                .unwrap();
        }
    }

    let summary = JsonlCalibrationStore::new(&path).summary().unwrap();
    assert_eq!(summary.total, 3);
    let coding = summary.for_type(TaskType::Coding).unwrap();
    assert_eq!(coding.count, 3);
    assert!((coding.mean_error_ratio - 2.0).abs() < 1e-9);
    assert!((coding.median_error_ratio - 2.0).abs() < 1e-9);
    assert!(summary.for_type(TaskType::Research).is_none());
}

/// Test: Recent dispatch warms untouched tasks
/// Given a dispatch one hour ago and two tasks, one with an explicit
/// warm_context
/// When the plan runs with the inferred context
/// Then only the untouched task picks up 0.3
#[test]
fn test_warm_context_from_history() {
    let ws = TestWorkspace::new();
    let completed = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let history = ws.write(
        "history.json",
        &format!(
            r#"{{"dispatches": [{{"agent": "agent-0", "project": "api", "completed_at": "{}"}}]}}"#,
            completed
        ),
    );

    let warm = infer_warm_context(Some(&history), Some("agent-0"), None, Utc::now());
    assert_eq!(warm.source, WarmContextSource::Auto);
    assert_eq!(warm.value, 0.3);

    let config = coding_fleet(2, 1);
    let tasks = vec![
        flat_task("cold", 60.0, &[], 0),
        flat_task("pinned", 60.0, &[], 1).with_modifiers(Modifiers {
            warm_context: 0.5,
            ..Modifiers::default()
        }),
    ];
    let report = Engine::new(&config).with_warm_context(warm).plan(tasks).unwrap();

    assert!((report.task("cold").unwrap().expected_minutes - 18.0).abs() < 1e-9);
    assert!((report.task("pinned").unwrap().expected_minutes - 30.0).abs() < 1e-9);
    assert!(report.warm_context.is_some());
}

/// Test: Malformed history falls back to cold
/// Given a history file that is not JSON
/// When warm context is inferred and used
/// Then the value is 1.0 and estimates are unchanged
#[test]
fn test_malformed_history_is_cold() {
    let ws = TestWorkspace::new();
    let history = ws.write("history.json", "not json at all");

    let warm = infer_warm_context(Some(&history), None, None, Utc::now());
    assert_eq!(warm.source, WarmContextSource::Default);
    assert_eq!(warm.value, 1.0);

    let config = coding_fleet(1, 1);
    let report = Engine::new(&config)
        .with_warm_context(warm)
        .plan(vec![flat_task("a", 40.0, &[], 0)])
        .unwrap();
    assert_eq!(report.task("a").unwrap().expected_minutes, 40.0);
}
