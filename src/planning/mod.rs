//! Wave planning and plan metrics.

pub mod metrics;
pub mod waves;

pub use metrics::{AgentLoad, CriticalPath, PlanMetrics, Timeline};
pub use waves::{AgentWaveLoad, Wave, WaveAssignment, WavePlan, WavePlanner};
