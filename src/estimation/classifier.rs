//! Text classification of task descriptions.
//!
//! Classification sits upstream of estimation: it fills in `task_type`,
//! `tier` and the trivial flag for task entries that leave them out. The
//! [`Classifier`] trait keeps the heuristic swappable.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::core::task::{SizeTier, TaskType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub task_type: TaskType,
    pub tier: SizeTier,
    pub trivial: bool,
    /// Names of the heuristics that fired, for reporting.
    pub signals: Vec<String>,
}

pub trait Classifier {
    fn classify(&self, text: &str) -> Classification;
}

static SIZE_SIGNALS: LazyLock<Vec<(Regex, SizeTier, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(trivial|typo|one[- ]?liner|rename)\b").unwrap(),
            SizeTier::XS,
            "trivial-keyword",
        ),
        (
            Regex::new(r"(?i)\b(small|simple|quick|minor|stub)\b").unwrap(),
            SizeTier::S,
            "small-keyword",
        ),
        (
            Regex::new(r"(?i)\b(medium|moderate|standard|typical)\b").unwrap(),
            SizeTier::M,
            "medium-keyword",
        ),
        (
            Regex::new(r"(?i)\b(large|complex|multi[- ]?file|significant)\b").unwrap(),
            SizeTier::L,
            "large-keyword",
        ),
        (
            Regex::new(r"(?i)\b(epic|massive|rewrite|overhaul|redesign)\b").unwrap(),
            SizeTier::XL,
            "epic-keyword",
        ),
    ]
});

static COMPLEXITY_SIGNALS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)\b(database|migration|schema)\b").unwrap(), "database-change"),
        (Regex::new(r"(?i)\b(security|auth|encrypt|token)\b").unwrap(), "security-concern"),
        (Regex::new(r"(?i)\b(api|endpoint|rest|graphql)\b").unwrap(), "api-surface"),
        (Regex::new(r"(?i)\b(test|coverage|ci|pipeline)\b").unwrap(), "test-infra"),
        (
            Regex::new(r"(?i)\b(refactor|restructure|architecture)\b").unwrap(),
            "structural-change",
        ),
    ]
});

// First match wins; anything unmatched is coding.
static CATEGORY_PATTERNS: LazyLock<Vec<(Regex, TaskType)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(brainstorm|ideate|ideas|explore options)\b").unwrap(),
            TaskType::Brainstorm,
        ),
        (
            Regex::new(r"(?i)\b(research|investigate|survey|compare|evaluate)\b").unwrap(),
            TaskType::Research,
        ),
        (
            Regex::new(r"(?i)\b(config|configure|configuration|settings|env vars?|ci config)\b").unwrap(),
            TaskType::Config,
        ),
        (
            Regex::new(r"(?i)\b(docs?|documentation|readme|changelog|guide)\b").unwrap(),
            TaskType::Documentation,
        ),
    ]
});

/// Regex keyword heuristics.
///
/// Size keywords vote for a tier and the median vote wins (M when none
/// match). Every two complexity signals bump the tier up by one.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn detect_type(text: &str) -> TaskType {
        CATEGORY_PATTERNS
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, t)| *t)
            .unwrap_or(TaskType::Coding)
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification {
                task_type: TaskType::Coding,
                tier: SizeTier::M,
                trivial: false,
                signals: vec!["no-description-default-M".to_string()],
            };
        }

        let mut signals = Vec::new();
        let mut votes = Vec::new();
        for (re, tier, name) in SIZE_SIGNALS.iter() {
            if re.is_match(text) {
                votes.push(*tier);
                signals.push(name.to_string());
            }
        }
        let trivial = votes.contains(&SizeTier::XS);

        let base = if votes.is_empty() {
            signals.push("no-size-signals-default-M".to_string());
            SizeTier::M
        } else {
            votes.sort();
            votes[votes.len() / 2]
        };

        let mut complexity = 0;
        for (re, name) in COMPLEXITY_SIGNALS.iter() {
            if re.is_match(text) {
                complexity += 1;
                signals.push(name.to_string());
            }
        }

        Classification {
            task_type: Self::detect_type(text),
            tier: base.bump(complexity / 2),
            trivial,
            signals,
        }
    }
}
