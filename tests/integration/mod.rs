//! Integration test suite for agent-estimate.
//!
//! These tests drive the engine the way the CLI does: task and fleet files
//! on disk, loaded, validated, estimated and planned end to end.
//!
//! # Test Categories
//!
//! - `planning_e2e`: Full runs from TOML input to report
//! - `determinism`: Repeatability and plan invariants over generated inputs
//! - `validation`: Fail-fast error taxonomy, no partial plans
//! - `calibration`: Observation store feeding back into planning

mod fixtures;

mod calibration;
mod determinism;
mod planning_e2e;
mod validation;
