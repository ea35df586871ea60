use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::level::LogLevel;

// ── Parsed entries ────────────────────────────────────────────

/// A single log record, consumed by pattern detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedLogEntry {
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Emitting component (servlet, job step, custom category).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub content: String,
}

// ── Summary ───────────────────────────────────────────────────

/// Level counts and key issues over a set of log files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub date: String,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub debug_count: usize,
    /// Deduplicated issue signatures, first-seen order.
    pub key_issues: Vec<String>,
    pub files: Vec<String>,
}

impl LogSummary {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    /// Drop repeated key issues, keeping the first occurrence.
    pub fn dedup_key_issues(&mut self) {
        let mut seen = HashSet::new();
        self.key_issues.retain(|issue| seen.insert(issue.clone()));
    }
}

// ── Health ────────────────────────────────────────────────────

/// Categorical health label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            75..=89 => Self::Good,
            50..=74 => Self::Warning,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 0–100 health score with the deductions that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: u8,
    pub level: HealthLevel,
    pub factors: Vec<String>,
}

// ── Patterns & trends ─────────────────────────────────────────

/// Frequency maps produced by pattern detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    /// Normalized error signature → occurrences.
    pub frequent_errors: BTreeMap<String, usize>,
    /// `"<h>:00-<h+1>:00"` → entries logged in that hour.
    pub time_patterns: BTreeMap<String, usize>,
    /// Source → entries logged by it.
    pub source_patterns: BTreeMap<String, usize>,
}

/// Change of the current period against earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingIssues {
    pub increasing: Vec<String>,
    pub decreasing: Vec<String>,
    #[serde(rename = "new")]
    pub new_issues: Vec<String>,
}

/// Everything derived from one set of log files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: LogSummary,
    pub patterns: PatternAnalysis,
    pub health: HealthScore,
    pub recommendations: Vec<String>,
}
