//! Fail-fast validation: every input error surfaces before any planning.

use agent_estimate::core::{TaskFile, TaskSpec, ThreePoint};
use agent_estimate::error::ReferenceKind;
use agent_estimate::{Engine, Error};

use crate::fixtures::{agent, coding_fleet, config_with, diamond_tasks, flat_task, TestWorkspace};

/// Test: Cycle is reported with its members
/// Given a -> b -> c -> a
/// When the plan runs
/// Then CyclicDependency names all three tasks
#[test]
fn test_cycle_rejected() {
    let config = coding_fleet(2, 1);
    let tasks = vec![
        flat_task("a", 10.0, &["c"], 0),
        flat_task("b", 10.0, &["a"], 1),
        flat_task("c", 10.0, &["b"], 2),
    ];
    match Engine::new(&config).plan(tasks) {
        Err(Error::CyclicDependency { cycle }) => {
            for id in ["a", "b", "c"] {
                assert!(cycle.iter().any(|c| c == id), "cycle should include {}", id);
            }
        }
        other => panic!("Expected CyclicDependency, got {:?}", other.map(|r| r.total_minutes())),
    }
}

/// Test: Unknown dependency
/// Given a task depending on an id that is not in the input
/// When the plan runs
/// Then UnknownReference names the missing task and who referenced it
#[test]
fn test_unknown_dependency_rejected() {
    let config = coding_fleet(1, 1);
    let tasks = vec![flat_task("a", 10.0, &["ghost"], 0)];
    match Engine::new(&config).plan(tasks) {
        Err(Error::UnknownReference {
            kind,
            id,
            referenced_by,
        }) => {
            assert_eq!(kind, ReferenceKind::Task);
            assert_eq!(id, "ghost");
            assert_eq!(referenced_by, "a");
        }
        other => panic!("Expected UnknownReference, got {:?}", other.is_ok()),
    }
}

/// Test: Pinned to an agent outside the fleet
/// Given a task file pinning a task to "nobody"
/// When the file is loaded and planned
/// Then UnknownReference points at the agent
#[test]
fn test_pinned_unknown_agent_rejected() {
    let ws = TestWorkspace::new();
    let path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "a"
task_type = "coding"
tier = "S"
agent = "nobody"
"#,
    );
    let config = coding_fleet(1, 1);
    let engine = Engine::new(&config);
    let tasks = engine.load_tasks(&TaskFile::load(&path).unwrap()).unwrap();
    assert!(matches!(
        engine.plan(tasks),
        Err(Error::UnknownReference {
            kind: ReferenceKind::Agent,
            ..
        })
    ));
}

/// Test: No agent holds the needed capability
/// Given a research task and a coding-only fleet
/// When validation runs
/// Then CapabilityMismatch names the task
#[test]
fn test_capability_mismatch_rejected() {
    let config = config_with(vec![agent("coder", &["implementation"], 1, "sonnet")]);
    let engine = Engine::new(&config);
    let file = TaskFile {
        tasks: vec![TaskSpec::new("dig", "Research prior art on rate limiters")],
    };
    let tasks = engine.load_tasks(&file).unwrap();
    match engine.validate(&tasks) {
        Err(Error::CapabilityMismatch { task, task_type }) => {
            assert_eq!(task, "dig");
            assert_eq!(task_type, "research");
        }
        other => panic!("Expected CapabilityMismatch, got ok={}", other.is_ok()),
    }
}

/// Test: Out-of-order triple
/// Given optimistic > likely
/// When the plan runs
/// Then a Range error is returned and nothing is planned
#[test]
fn test_bad_triple_rejected() {
    let config = coding_fleet(1, 1);
    let mut tasks = diamond_tasks();
    tasks[2].durations = ThreePoint::new(30.0, 20.0, 40.0);
    assert!(matches!(Engine::new(&config).plan(tasks), Err(Error::Range { .. })));
}

/// Test: Partial duration triple in a task file
/// Given an entry with optimistic and likely but no pessimistic
/// When the file is turned into tasks
/// Then loading fails with a validation error
#[test]
fn test_partial_triple_rejected() {
    let ws = TestWorkspace::new();
    let path = ws.write(
        "tasks.toml",
        r#"
[[tasks]]
id = "a"
optimistic = 10.0
likely = 20.0
"#,
    );
    let config = coding_fleet(1, 1);
    let engine = Engine::new(&config);
    assert!(matches!(
        engine.load_tasks(&TaskFile::load(&path).unwrap()),
        Err(Error::Validation(_))
    ));
}

/// Test: Duplicate ids
/// Given two tasks with the same id
/// When validation runs
/// Then it fails before planning
#[test]
fn test_duplicate_ids_rejected() {
    let config = coding_fleet(1, 1);
    let tasks = vec![flat_task("a", 10.0, &[], 0), flat_task("a", 20.0, &[], 1)];
    assert!(Engine::new(&config).validate(&tasks).is_err());
}

/// Test: Empty fleet
/// Given no agents
/// When validation runs
/// Then it fails
#[test]
fn test_empty_fleet_rejected() {
    let config = config_with(Vec::new());
    let tasks = vec![flat_task("a", 10.0, &[], 0)];
    assert!(Engine::new(&config).validate(&tasks).is_err());
}
