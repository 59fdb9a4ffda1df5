use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use agent_estimate::calibration::{
    infer_warm_context, CalibrationSink, CalibrationSource, JsonlCalibrationStore, ObservationRecord,
};
use agent_estimate::core::{SizeTier, TaskFile};
use agent_estimate::estimation::{SessionRequest, ThresholdBasis, DEFAULT_COORDINATION_OVERHEAD};
use agent_estimate::{alog, alog_error, Engine, Error, EstimateConfig, Result};

/// agent-estimate - PERT estimates and wave plans for AI agent fleets
#[derive(Parser, Debug)]
#[command(name = "agent-estimate")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    AGENT_ESTIMATE_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.agent-estimate/agent-estimate.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Estimate tasks and plan them into waves
    Plan {
        /// Task file (TOML, [[tasks]] entries)
        #[arg(long)]
        tasks: PathBuf,

        /// Fleet/settings file (defaults to ~/.agent-estimate/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Compare thresholds against expected or pessimistic minutes
        #[arg(long, value_parser = parse_basis)]
        threshold_basis: Option<ThresholdBasis>,

        /// Keep declared tiers even when scope signals disagree
        #[arg(long)]
        no_auto_tier: bool,

        /// Calibration store whose observations rescale default tiers
        #[arg(long)]
        calibration: Option<PathBuf>,

        /// Dispatch history used to infer warm_context
        #[arg(long)]
        history: Option<PathBuf>,

        /// Only consider history for this agent
        #[arg(long, requires = "history")]
        agent: Option<String>,

        /// Only consider history for this project
        #[arg(long, requires = "history")]
        project: Option<String>,
    },

    /// Run the validation pass only
    Validate {
        #[arg(long)]
        tasks: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Append an observed outcome to a calibration store
    Record {
        /// Calibration store (JSON lines)
        #[arg(long)]
        store: PathBuf,

        /// Observation file (TOML)
        #[arg(long)]
        observation: PathBuf,
    },

    /// Show per-type calibration statistics and the tiers they produce
    Calibration {
        #[arg(long)]
        store: PathBuf,

        /// Config whose tables the calibrated tiers are built on
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Estimate a coordinated multi-agent session
    Session {
        /// Parallel agents in the session
        #[arg(short, long, default_value_t = 2)]
        agents: u32,

        /// Sequential rounds
        #[arg(short, long, default_value_t = 1)]
        rounds: u32,

        /// Session type: brainstorm, coding, config, documentation, research, review
        #[arg(short = 't', long = "type", default_value = "brainstorm")]
        task_type: String,

        /// Coordination overhead per round in minutes (default 5)
        #[arg(long)]
        coordination_overhead: Option<f64>,

        /// Per-agent round duration in minutes; skips the type lookup
        #[arg(long)]
        per_round_minutes: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Write the default config to ~/.agent-estimate/config.toml
    Init {
        /// Write here instead of the default location
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_basis(s: &str) -> std::result::Result<ThresholdBasis, String> {
    s.parse().map_err(|e: agent_estimate::Error| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    agent_estimate::log::init(cli.debug);
    alog!("agent-estimate starting: {:?}", cli.command);

    if let Err(e) = run(cli.command) {
        alog_error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Plan {
            tasks,
            config,
            json,
            threshold_basis,
            no_auto_tier,
            calibration,
            history,
            agent,
            project,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(basis) = threshold_basis {
                config.settings.threshold_basis = basis;
            }
            if no_auto_tier {
                config.settings.auto_tier = false;
            }

            let mut engine = Engine::new(&config);
            if let Some(path) = calibration {
                engine = engine.with_calibration(&JsonlCalibrationStore::new(path))?;
            }
            if history.is_some() {
                let warm = infer_warm_context(
                    history.as_deref(),
                    agent.as_deref(),
                    project.as_deref(),
                    chrono::Utc::now(),
                );
                engine = engine.with_warm_context(warm);
            }

            let nodes = engine.load_tasks(&TaskFile::load(&tasks)?)?;
            let report = engine.plan(nodes)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report);
            }
            Ok(())
        }
        Command::Validate { tasks, config } => {
            let config = load_config(config.as_deref())?;
            let engine = Engine::new(&config);
            let nodes = engine.load_tasks(&TaskFile::load(&tasks)?)?;
            let dag = engine.validate(&nodes)?;
            println!(
                "OK: {} tasks, {} dependencies, {} agents",
                dag.task_count(),
                dag.dependency_count(),
                engine.fleet().len()
            );
            Ok(())
        }
        Command::Record { store, observation } => {
            let record: ObservationRecord = toml::from_str(&std::fs::read_to_string(&observation)?)?;
            let stored = JsonlCalibrationStore::new(store).append(record)?;
            println!(
                "Recorded {} observation {}",
                stored.task_type,
                stored.id.map(|id| id.to_string()).unwrap_or_default()
            );
            Ok(())
        }
        Command::Calibration { store, config } => {
            let config = load_config(config.as_deref())?;
            let store = JsonlCalibrationStore::new(store);
            let summary = store.summary()?;
            println!("{} observations", summary.total);
            for s in &summary.by_type {
                println!(
                    "  {:<14} n={:<4} mean {:.2}x  p10 {:.2}x  median {:.2}x  p90 {:.2}x",
                    s.task_type.as_str(),
                    s.count,
                    s.mean_error_ratio,
                    s.p10_error_ratio,
                    s.median_error_ratio,
                    s.p90_error_ratio
                );
            }
            let defaults = store.defaults_from(&config.tables)?;
            println!("Coding tiers:");
            for tier in SizeTier::ORDER {
                let t = defaults.tables.tiers.get(tier);
                println!(
                    "  {:<3} {:.1} / {:.1} / {:.1}",
                    tier.to_string(),
                    t.optimistic,
                    t.likely,
                    t.pessimistic
                );
            }
            let m = &defaults.modifiers;
            println!(
                "Default modifiers: spec_clarity {:.2}  warm_context {:.2}  agent_fit {:.2}",
                m.spec_clarity, m.warm_context, m.agent_fit
            );
            Ok(())
        }
        Command::Session {
            agents,
            rounds,
            task_type,
            coordination_overhead,
            per_round_minutes,
            json,
        } => {
            let estimate = SessionRequest {
                agents,
                rounds,
                task_type,
                coordination_overhead_minutes: coordination_overhead
                    .unwrap_or(DEFAULT_COORDINATION_OVERHEAD),
                per_round_minutes,
            }
            .estimate()?;
            if json {
                println!("{}", estimate.to_json()?);
            } else {
                print!("{}", estimate);
            }
            Ok(())
        }
        Command::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => EstimateConfig::config_path()?,
            };
            if path.exists() && !force {
                return Err(Error::Validation(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            EstimateConfig::default().save(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EstimateConfig> {
    match path {
        Some(path) => EstimateConfig::load(path),
        None => EstimateConfig::load_default(),
    }
}
