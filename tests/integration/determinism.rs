//! Repeatability and plan invariants over generated inputs.

use agent_estimate::Engine;

use crate::fixtures::{
    assert_plan_invariants, chain_tasks, coding_fleet, generated_tasks, independent_tasks,
};

/// Test: Identical input gives an identical plan
/// Given a generated 40-task graph
/// When it is planned twice with separate engines
/// Then the JSON reports are byte-identical
#[test]
fn test_repeated_runs_are_identical() {
    let config = coding_fleet(3, 2);
    let tasks = generated_tasks(40, 7);

    let first = Engine::new(&config).plan(tasks.clone()).unwrap().to_json().unwrap();
    let second = Engine::new(&config).plan(tasks).unwrap().to_json().unwrap();

    assert_eq!(first, second, "plans must not depend on run-to-run state");
}

/// Test: Invariants hold across many generated graphs
/// Given graphs from several seeds and fleet shapes
/// When each is planned
/// Then dependencies, capacity and the total-duration formula all hold
#[test]
fn test_invariants_over_generated_graphs() {
    for seed in 0..12u64 {
        let agents = 1 + (seed as usize % 4);
        let parallelism = 1 + (seed as u32 % 3);
        let config = coding_fleet(agents, parallelism);
        let tasks = generated_tasks(25, seed);

        let report = Engine::new(&config)
            .plan(tasks.clone())
            .unwrap_or_else(|e| panic!("seed {} failed: {}", seed, e));

        assert_eq!(report.tasks.len(), 25, "seed {}: every task reported", seed);
        assert_plan_invariants(&report, &tasks, &config);
        assert!(
            report.metrics.parallel_efficiency > 0.0 && report.metrics.parallel_efficiency <= 1.0,
            "seed {}: efficiency out of range",
            seed
        );
        assert!(report.metrics.timeline.best_case_minutes <= report.metrics.timeline.expected_minutes);
        assert!(report.metrics.timeline.expected_minutes <= report.metrics.timeline.worst_case_minutes);
    }
}

/// Test: A chain never parallelizes
/// Given a 6-task chain and a wide fleet
/// When it is planned
/// Then there is one task per wave
#[test]
fn test_chain_one_task_per_wave() {
    let config = coding_fleet(4, 2);
    let report = Engine::new(&config).plan(chain_tasks(6)).unwrap();

    assert_eq!(report.plan.wave_count(), 6);
    for wave in &report.plan.waves {
        assert_eq!(wave.task_count(), 1);
    }
    // 6 x 10m work plus 5 gaps at the default 15m overhead.
    assert_eq!(report.total_minutes(), 60.0 + 5.0 * 15.0);
}

/// Test: Capacity spills into later waves
/// Given 7 independent tasks and 3 total slots
/// When they are planned
/// Then they take ceil(7 / 3) = 3 waves
#[test]
fn test_capacity_spill() {
    let config = coding_fleet(3, 1);
    let tasks = independent_tasks(7);
    let report = Engine::new(&config).plan(tasks.clone()).unwrap();

    assert_eq!(report.plan.wave_count(), 3);
    let sizes: Vec<usize> = report.plan.waves.iter().map(|w| w.task_count()).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    assert_plan_invariants(&report, &tasks, &config);
}

/// Test: Input order does not leak through ids
/// Given the same tasks with sequence numbers reversed
/// When planned on a single slot
/// Then dispatch follows sequence, not id
#[test]
fn test_sequence_drives_dispatch_order() {
    let config = coding_fleet(1, 1);
    let mut tasks = independent_tasks(3);
    for (i, task) in tasks.iter_mut().enumerate() {
        task.sequence = 2 - i;
    }
    let report = Engine::new(&config).plan(tasks).unwrap();

    let order: Vec<&str> = report
        .plan
        .waves
        .iter()
        .map(|w| w.assignments[0].task.as_str())
        .collect();
    assert_eq!(order, vec!["t2", "t1", "t0"]);
}
