//! Human-speed equivalents, reported alongside agent estimates.

use crate::core::task::TaskType;

/// How many times longer a human takes than an agent, as a (low, high) range.
pub fn multiplier_range(task_type: TaskType) -> (f64, f64) {
    match task_type {
        TaskType::Coding => (2.0, 4.0),
        TaskType::Brainstorm => (2.0, 4.0),
        TaskType::Research => (2.5, 4.5),
        TaskType::Config => (2.0, 3.5),
        TaskType::Documentation => (3.0, 6.0),
    }
}

/// Geometric mean of the range.
pub fn multiplier(task_type: TaskType) -> f64 {
    let (lo, hi) = multiplier_range(task_type);
    (lo * hi).sqrt()
}

pub fn human_equivalent(agent_minutes: f64, task_type: TaskType) -> f64 {
    agent_minutes * multiplier(task_type)
}
