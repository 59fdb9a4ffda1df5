//! Warm-context inference from dispatch history.
//!
//! History is a JSON document `{"dispatches": [{"agent", "project",
//! "completed_at"}, ...]}`. The most recent matching dispatch decides how
//! warm the agent still is. Missing or malformed history never fails a run;
//! it yields a cold default.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::alog_warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmContextSource {
    Auto,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmContext {
    pub value: f64,
    pub source: WarmContextSource,
    pub detail: Option<String>,
}

impl WarmContext {
    fn cold() -> Self {
        Self {
            value: 1.0,
            source: WarmContextSource::Default,
            detail: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DispatchHistory {
    dispatches: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Dispatch {
    agent: Option<String>,
    project: Option<String>,
    completed_at: Option<String>,
}

/// Map hours since the last dispatch to a warm_context value.
pub fn decay(hours_ago: f64) -> f64 {
    if hours_ago < 2.0 {
        0.3
    } else if hours_ago < 12.0 {
        0.5
    } else if hours_ago < 24.0 {
        0.7
    } else {
        1.0
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn load_dispatches(path: &Path) -> Vec<Dispatch> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            alog_warn!("history file {} unreadable: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<DispatchHistory>(&text) {
        // Entries that are not objects are dropped individually.
        Ok(history) => history
            .dispatches
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        Err(e) => {
            alog_warn!("history file {} malformed: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Infer warm_context from dispatch history, optionally filtered by agent
/// and project. `now` is the reference time for recency.
pub fn infer_warm_context(
    history_path: Option<&Path>,
    agent: Option<&str>,
    project: Option<&str>,
    now: DateTime<Utc>,
) -> WarmContext {
    let Some(path) = history_path else {
        return WarmContext::cold();
    };

    let latest = load_dispatches(path)
        .into_iter()
        .filter(|d| agent.map_or(true, |a| d.agent.as_deref() == Some(a)))
        .filter(|d| project.map_or(true, |p| d.project.as_deref() == Some(p)))
        .filter_map(|d| {
            let at = d.completed_at.as_deref().and_then(parse_timestamp)?;
            Some((at, d))
        })
        .max_by_key(|(at, _)| *at);

    let Some((at, dispatch)) = latest else {
        return WarmContext::cold();
    };

    let hours_ago = (now - at).num_seconds() as f64 / 3600.0;
    let ago = if hours_ago < 1.0 {
        format!("{}m ago", (hours_ago * 60.0) as i64)
    } else {
        format!("{:.0}h ago", hours_ago)
    };
    WarmContext {
        value: decay(hours_ago),
        source: WarmContextSource::Auto,
        detail: Some(format!(
            "{} active {} on {}",
            dispatch.agent.as_deref().unwrap_or("unknown"),
            ago,
            dispatch.project.as_deref().unwrap_or("unknown")
        )),
    }
}
