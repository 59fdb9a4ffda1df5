pub mod calibration;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod estimation;
pub mod fleet;
pub mod log;
pub mod planning;
pub mod report;

pub use config::{EstimateConfig, PlanSettings};
pub use engine::Engine;
pub use error::{Error, Result};
pub use report::{PlanReport, TaskReport};
