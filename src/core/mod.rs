//! Core domain models: tasks, their input form, and the dependency graph.

pub mod dag;
pub mod input;
pub mod task;

pub use dag::TaskDAG;
pub use input::{TaskFile, TaskSpec};
pub use task::{
    Annotation, Modifiers, Placement, ReviewMode, ScopeSignals, SizeTier, TaskEstimate, TaskId,
    TaskNode, TaskPhase, TaskType, ThreePoint,
};
