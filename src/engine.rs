//! End-to-end planning run.
//!
//! Stages run in a fixed order over one owned task arena:
//!
//! 1. validate the whole input (fails before anything is computed)
//! 2. inferred warm context for tasks left at the neutral 1.0
//! 3. tier auto-correction
//! 4. duration estimation
//! 5. wave planning
//! 6. threshold checks against each task's assigned agent
//! 7. finalize and report
//!
//! Each derived field on a task is written by exactly one stage.

use crate::calibration::{CalibrationSource, WarmContext, WarmContextSource};
use crate::config::EstimateConfig;
use crate::core::dag::TaskDAG;
use crate::core::input::TaskFile;
use crate::core::task::{TaskNode, TaskPhase};
use crate::error::Result;
use crate::estimation::classifier::{Classifier, KeywordClassifier};
use crate::estimation::pert::Estimator;
use crate::estimation::tables::DurationTables;
use crate::estimation::threshold::ThresholdChecker;
use crate::estimation::tier::apply_tier_correction;
use crate::fleet::Fleet;
use crate::planning::metrics::PlanMetrics;
use crate::planning::waves::WavePlanner;
use crate::report::{PlanReport, TaskReport};
use crate::{alog, alog_debug};

pub struct Engine<'a> {
    config: &'a EstimateConfig,
    fleet: Fleet,
    tables: DurationTables,
    classifier: Box<dyn Classifier>,
    warm_context: Option<WarmContext>,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a EstimateConfig) -> Self {
        Self {
            config,
            fleet: config.fleet(),
            tables: config.tables,
            classifier: Box::new(KeywordClassifier),
            warm_context: None,
        }
    }

    /// Use these tables instead of the config's, e.g. calibrated defaults.
    pub fn with_tables(mut self, tables: DurationTables) -> Self {
        self.tables = tables;
        self
    }

    /// Rebuild the current tables through a calibration source. Category
    /// baselines and anything else the config customized are kept.
    pub fn with_calibration(mut self, source: &dyn CalibrationSource) -> Result<Self> {
        let defaults = source.defaults_from(&self.tables)?;
        alog_debug!("calibrated M tier: {:?}", defaults.tables.tiers.m);
        self.tables = defaults.tables;
        Ok(self)
    }

    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Apply an inferred warm_context to tasks that leave it at 1.0.
    pub fn with_warm_context(mut self, warm: WarmContext) -> Self {
        self.warm_context = Some(warm);
        self
    }

    pub fn tables(&self) -> &DurationTables {
        &self.tables
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Turn a task file into task nodes, classifying entries that leave out
    /// their type or tier.
    pub fn load_tasks(&self, file: &TaskFile) -> Result<Vec<TaskNode>> {
        file.to_nodes(self.classifier.as_ref(), &self.tables)
    }

    /// Up-front validation over the complete input.
    ///
    /// # Errors
    /// - `Validation` / `Range` for bad settings, tables or fleet
    /// - `Range` for a bad duration triple or modifier
    /// - `Validation` for a duplicate task id
    /// - `UnknownReference` for a missing dependency or pinned agent
    /// - `CyclicDependency` when the graph is not a DAG
    /// - `CapabilityMismatch` when no agent can run a task
    pub fn validate(&self, tasks: &[TaskNode]) -> Result<TaskDAG> {
        self.config.settings.validate()?;
        self.tables.validate()?;
        self.fleet.validate()?;
        for task in tasks {
            task.durations.validate()?;
            task.modifiers.validate()?;
        }
        let dag = TaskDAG::from_tasks(tasks)?;
        let planner = self.planner();
        for task in tasks {
            planner.candidates(task)?;
        }
        Ok(dag)
    }

    fn planner(&self) -> WavePlanner<'_> {
        WavePlanner::new(
            &self.fleet,
            &self.config.capabilities,
            self.config.settings.inter_wave_overhead,
        )
    }

    pub fn plan(&self, mut tasks: Vec<TaskNode>) -> Result<PlanReport> {
        let settings = &self.config.settings;
        alog!(
            "Planning {} tasks across {} agents",
            tasks.len(),
            self.fleet.len()
        );
        let dag = self.validate(&tasks)?;

        if let Some(warm) = self.warm_context.as_ref().filter(|w| w.source == WarmContextSource::Auto) {
            for task in tasks.iter_mut().filter(|t| t.modifiers.warm_context == 1.0) {
                task.modifiers.warm_context = warm.value;
            }
        }

        let estimator = Estimator::new(settings);
        for task in tasks.iter_mut() {
            apply_tier_correction(task, &self.tables, settings.auto_tier);
            estimator.estimate(task)?;
        }

        let plan = self.planner().plan(&mut tasks, &dag)?;

        let checker = ThresholdChecker::new(
            &self.config.thresholds,
            settings.metr_fallback_threshold,
            settings.threshold_basis,
        );
        for task in tasks.iter_mut() {
            let model_tier = task
                .assigned_agent()
                .and_then(|name| self.fleet.get(name))
                .map(|agent| agent.model_tier.clone());
            if let Some(model_tier) = model_tier {
                checker.apply(task, &model_tier);
            }
            task.advance(TaskPhase::Final)?;
        }

        let metrics = PlanMetrics::compute(&tasks, &dag, &self.fleet, &plan)?;
        alog_debug!(
            "critical path {:.1}m, efficiency {:.2}",
            metrics.critical_path.minutes,
            metrics.parallel_efficiency
        );
        alog!(
            "Plan complete: {} waves, {:.1}m total",
            plan.wave_count(),
            plan.total_minutes
        );

        Ok(PlanReport {
            tasks: tasks.iter().map(TaskReport::from).collect(),
            plan,
            metrics,
            settings: settings.clone(),
            warm_context: self.warm_context.clone(),
        })
    }
}
