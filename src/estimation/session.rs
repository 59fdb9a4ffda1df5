//! Coordinated multi-agent sessions.
//!
//! A session is `agents` agents working the same kind of task in parallel for
//! `rounds` sequential rounds, with a coordination gap after every round.
//! Wall-clock and agent-minutes diverge as soon as more than one agent runs.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::alog_debug;
use crate::error::{Error, Result};

/// Minutes of synchronization charged per round when none is given.
pub const DEFAULT_COORDINATION_OVERHEAD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Coding,
    Brainstorm,
    Research,
    Config,
    Documentation,
    Review,
}

impl SessionKind {
    /// Sorted by name, the order used in error messages.
    pub const ALL: [SessionKind; 6] = [
        SessionKind::Brainstorm,
        SessionKind::Coding,
        SessionKind::Config,
        SessionKind::Documentation,
        SessionKind::Research,
        SessionKind::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Coding => "coding",
            SessionKind::Brainstorm => "brainstorm",
            SessionKind::Research => "research",
            SessionKind::Config => "config",
            SessionKind::Documentation => "documentation",
            SessionKind::Review => "review",
        }
    }

    /// Per-agent minutes for one round.
    pub fn round_minutes(&self) -> f64 {
        match self {
            SessionKind::Coding => 50.0,
            SessionKind::Brainstorm => 10.0,
            SessionKind::Research => 30.0,
            SessionKind::Config => 20.0,
            SessionKind::Documentation => 30.0,
            SessionKind::Review => 15.0,
        }
    }
}

impl FromStr for SessionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        SessionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| {
                let known: Vec<&str> = SessionKind::ALL.iter().map(|k| k.as_str()).collect();
                Error::Validation(format!(
                    "unknown session type '{}'. Known types: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Inputs to [`SessionRequest::estimate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub agents: u32,
    pub rounds: u32,
    pub task_type: String,
    pub coordination_overhead_minutes: f64,
    /// Replaces the per-type round duration; the type is then not looked up.
    pub per_round_minutes: Option<f64>,
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self {
            agents: 2,
            rounds: 1,
            task_type: SessionKind::Brainstorm.as_str().to_string(),
            coordination_overhead_minutes: DEFAULT_COORDINATION_OVERHEAD,
            per_round_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEstimate {
    pub agents: u32,
    pub rounds: u32,
    pub task_type: String,
    pub per_agent_round_minutes: f64,
    pub coordination_overhead_minutes: f64,
    /// Sum over rounds of round duration plus coordination overhead.
    pub wall_clock_minutes: f64,
    /// Compute consumed: every agent for every round.
    pub agent_minutes: f64,
    /// Wall-clock per round, without the overhead.
    pub rounds_breakdown: Vec<f64>,
}

impl SessionRequest {
    /// # Errors
    /// - `Range` when agents or rounds is zero, or a duration is negative
    /// - `Validation` for an unknown task type without a per-round override
    pub fn estimate(&self) -> Result<SessionEstimate> {
        if self.agents < 1 {
            return Err(Error::range("agents", format!("must be >= 1, got {}", self.agents)));
        }
        if self.rounds < 1 {
            return Err(Error::range("rounds", format!("must be >= 1, got {}", self.rounds)));
        }
        let overhead = self.coordination_overhead_minutes;
        if !(overhead.is_finite() && overhead >= 0.0) {
            return Err(Error::range(
                "coordination_overhead_minutes",
                format!("must be >= 0, got {}", overhead),
            ));
        }

        let (task_type, round_minutes) = match self.per_round_minutes {
            Some(minutes) if !(minutes.is_finite() && minutes >= 0.0) => {
                return Err(Error::range(
                    "per_round_minutes",
                    format!("must be >= 0, got {}", minutes),
                ));
            }
            Some(minutes) => (self.task_type.clone(), minutes),
            None => {
                let kind: SessionKind = self.task_type.parse()?;
                (kind.as_str().to_string(), kind.round_minutes())
            }
        };

        let rounds_breakdown = vec![round_minutes; self.rounds as usize];
        let wall_clock_minutes = rounds_breakdown.iter().map(|r| r + overhead).sum();
        let agent_minutes = f64::from(self.rounds) * f64::from(self.agents) * round_minutes;
        alog_debug!(
            "session {} x{} agents x{} rounds: {:.1}m wall, {:.1} agent-min",
            task_type,
            self.agents,
            self.rounds,
            wall_clock_minutes,
            agent_minutes
        );

        Ok(SessionEstimate {
            agents: self.agents,
            rounds: self.rounds,
            task_type,
            per_agent_round_minutes: round_minutes,
            coordination_overhead_minutes: overhead,
            wall_clock_minutes,
            agent_minutes,
            rounds_breakdown,
        })
    }
}

impl SessionEstimate {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn hours_minutes(minutes: f64) -> String {
    let total = minutes as u64;
    match (total / 60, total % 60) {
        (0, m) => format!("{}m", m),
        (h, m) => format!("{}h {}m", h, m),
    }
}

impl fmt::Display for SessionEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session: {} agents x {} rounds ({})", self.agents, self.rounds, self.task_type)?;
        writeln!(f, "  Per-agent round:  {:.0}m", self.per_agent_round_minutes)?;
        writeln!(f, "  Coordination:     {:.0}m / round", self.coordination_overhead_minutes)?;
        writeln!(f, "  Wall-clock:       {}", hours_minutes(self.wall_clock_minutes))?;
        writeln!(f, "  Agent-minutes:    {}", hours_minutes(self.agent_minutes))?;
        if self.rounds_breakdown.len() > 1 {
            for (i, round) in self.rounds_breakdown.iter().enumerate() {
                writeln!(
                    f,
                    "  Round {}: {} wall-clock",
                    i + 1,
                    hours_minutes(round + self.coordination_overhead_minutes)
                )?;
            }
        }
        Ok(())
    }
}
