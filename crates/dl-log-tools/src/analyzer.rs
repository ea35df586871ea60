//! Analysis over fetched log content.
//!
//! Pure functions over plain data: nothing here touches the store.

use chrono::Timelike;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use dl_protocol::{
    AnalysisReport, HealthLevel, HealthScore, LogFileMetadata, LogLevel, LogSummary,
    PatternAnalysis, ProcessedLogEntry, TrendingIssues,
};

use crate::config::LogToolsConfig;
use crate::parser;

// ── Patterns ──────────────────────────────────────────────────

static RE_LEVEL_TOKENS: LazyLock<[(LogLevel, Regex); 4]> = LazyLock::new(|| {
    [
        (LogLevel::Error, Regex::new(r"\bERROR\b").unwrap()),
        (LogLevel::Warn, Regex::new(r"\bWARN\b").unwrap()),
        (LogLevel::Info, Regex::new(r"\bINFO\b").unwrap()),
        (LogLevel::Debug, Regex::new(r"\bDEBUG\b").unwrap()),
    ]
});

// Priority order: the first match wins.
static RE_SIGNATURES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"Exception: (.+)").unwrap(),
        Regex::new(r"Error: (.+)").unwrap(),
        Regex::new(r"Failed to (.+)").unwrap(),
        Regex::new(r"Cannot (.+)").unwrap(),
    ]
});

const SIGNATURE_FALLBACK_CHARS: usize = 50;

// ── Analyzer ──────────────────────────────────────────────────

/// Summarizes log content and derives patterns, health and advice from it.
#[derive(Debug, Clone)]
pub struct LogAnalyzer {
    max_key_issues_per_file: usize,
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::new(&LogToolsConfig::default())
    }
}

impl LogAnalyzer {
    pub fn new(config: &LogToolsConfig) -> Self {
        Self {
            max_key_issues_per_file: config.max_key_issues_per_file,
        }
    }

    /// Level counts over every file with content, plus key issues from error files.
    ///
    /// Files missing from `contents` are skipped with a warning.
    pub fn analyze_logs(
        &self,
        files: &[LogFileMetadata],
        contents: &HashMap<String, String>,
        date: &str,
    ) -> LogSummary {
        let mut summary = LogSummary::new(date);

        for file in files {
            summary.files.push(file.filename.clone());
            let Some(content) = contents.get(&file.filename) else {
                tracing::warn!(file = %file.filename, "no content available, skipping");
                continue;
            };

            // Every occurrence counts, including several on one line.
            for (level, re) in RE_LEVEL_TOKENS.iter() {
                let hits = re.find_iter(content).count();
                match level {
                    LogLevel::Error => summary.error_count += hits,
                    LogLevel::Warn => summary.warning_count += hits,
                    LogLevel::Info => summary.info_count += hits,
                    LogLevel::Debug => summary.debug_count += hits,
                }
            }

            if is_error_file(&file.filename) {
                summary
                    .key_issues
                    .extend(self.extract_key_issues(content));
            }
        }

        summary.dedup_key_issues();
        tracing::debug!(
            date,
            files = summary.files.len(),
            errors = summary.error_count,
            key_issues = summary.key_issues.len(),
            "logs analyzed"
        );
        summary
    }

    /// Summary, patterns, health and recommendations in one pass.
    pub fn summarize(
        &self,
        files: &[LogFileMetadata],
        contents: &HashMap<String, String>,
        date: &str,
    ) -> AnalysisReport {
        let summary = self.analyze_logs(files, contents, date);
        let entries: Vec<ProcessedLogEntry> = files
            .iter()
            .filter_map(|f| contents.get(&f.filename))
            .flat_map(|content| parser::parse_entries(content))
            .collect();
        let patterns = detect_patterns(&entries);
        let health = calculate_health_score(&summary);
        let recommendations = generate_recommendations(&summary, &patterns);

        AnalysisReport {
            summary,
            patterns,
            health,
            recommendations,
        }
    }

    /// Error signatures of one error file, capped per file.
    ///
    /// Uses parsed error records when the file has headers, raw `ERROR`
    /// lines otherwise.
    fn extract_key_issues(&self, content: &str) -> Vec<String> {
        let entries = parser::parse_entries(content);
        let issues: Vec<String> = if entries.is_empty() {
            content
                .lines()
                .filter(|line| RE_LEVEL_TOKENS[0].1.is_match(line))
                .map(error_signature)
                .collect()
        } else {
            entries
                .iter()
                .filter(|e| e.level == LogLevel::Error)
                .map(|e| error_signature(first_line(&e.content)))
                .collect()
        };

        let mut seen = HashSet::new();
        issues
            .into_iter()
            .filter(|issue| !issue.is_empty() && seen.insert(issue.clone()))
            .take(self.max_key_issues_per_file)
            .collect()
    }
}

// ── Pure analysis ─────────────────────────────────────────────

/// Frequency maps over parsed entries.
///
/// Error signatures are counted over error entries only; hour and source
/// buckets count every entry that carries a timestamp or source.
pub fn detect_patterns(entries: &[ProcessedLogEntry]) -> PatternAnalysis {
    let mut patterns = PatternAnalysis::default();

    for entry in entries {
        if entry.level == LogLevel::Error {
            *patterns
                .frequent_errors
                .entry(error_signature(&entry.content))
                .or_default() += 1;
        }
        if let Some(ts) = entry.timestamp {
            let hour = ts.hour();
            *patterns
                .time_patterns
                .entry(format!("{hour}:00-{}:00", hour + 1))
                .or_default() += 1;
        }
        if let Some(source) = &entry.source {
            *patterns.source_patterns.entry(source.clone()).or_default() += 1;
        }
    }
    patterns
}

/// 0–100 score from error, warning and key issue counts.
pub fn calculate_health_score(summary: &LogSummary) -> HealthScore {
    let mut score = 100.0_f64;
    let mut factors = Vec::new();

    if summary.error_count > 0 {
        let deduction = (summary.error_count as f64 * 2.0).min(30.0);
        score -= deduction;
        factors.push(format!("{} errors (-{deduction})", summary.error_count));
    }
    if summary.warning_count > 10 {
        let deduction = ((summary.warning_count - 10) as f64 * 0.5).min(15.0);
        score -= deduction;
        factors.push(format!("{} warnings (-{deduction})", summary.warning_count));
    }
    if !summary.key_issues.is_empty() {
        let deduction = (summary.key_issues.len() as f64 * 5.0).min(25.0);
        score -= deduction;
        factors.push(format!("{} key issues (-{deduction})", summary.key_issues.len()));
    }

    // Floored so a fractional score never reaches the next level.
    let score = score.max(0.0).floor() as u8;
    HealthScore {
        score,
        level: HealthLevel::from_score(score),
        factors,
    }
}

/// Compare the current period against earlier ones.
pub fn find_trending_issues(current: &LogSummary, previous: &[LogSummary]) -> TrendingIssues {
    let mut trends = TrendingIssues::default();

    let average = if previous.is_empty() {
        0.0
    } else {
        previous.iter().map(|s| s.error_count as f64).sum::<f64>() / previous.len() as f64
    };
    let current_errors = current.error_count as f64;
    if current_errors > average * 1.5 {
        trends.increasing.push("Overall error rate".into());
    } else if current_errors < average * 0.5 {
        trends.decreasing.push("Overall error rate".into());
    }

    let seen: HashSet<&str> = previous
        .iter()
        .flat_map(|s| s.key_issues.iter().map(String::as_str))
        .collect();
    trends.new_issues = current
        .key_issues
        .iter()
        .filter(|issue| !seen.contains(issue.as_str()))
        .cloned()
        .collect();
    trends
}

/// Rule-based advice, in a fixed order.
pub fn generate_recommendations(summary: &LogSummary, patterns: &PatternAnalysis) -> Vec<String> {
    let mut recommendations = Vec::new();

    if summary.error_count > 10 {
        recommendations.push(format!(
            "High error count ({}): review the error logs for recurring failures",
            summary.error_count
        ));
    }
    if summary.warning_count > 50 {
        recommendations.push(format!(
            "Many warnings ({}): address them before they escalate into errors",
            summary.warning_count
        ));
    }
    if let Some((pattern, count)) = most_frequent(&patterns.frequent_errors) {
        recommendations.push(format!(
            "Most frequent error: \"{pattern}\" ({count} occurrences)"
        ));
    }
    if let Some((bucket, count)) = most_frequent(&patterns.time_patterns) {
        recommendations.push(format!("Busiest hour: {bucket} ({count} entries)"));
    }
    if summary.error_count == 0 && summary.key_issues.is_empty() {
        recommendations.push("No errors or key issues found; no action needed".into());
    }
    recommendations
}

// ── Helpers ───────────────────────────────────────────────────

/// Normalized signature of an error message.
pub fn error_signature(content: &str) -> String {
    for re in RE_SIGNATURES.iter() {
        if let Some(caps) = re.captures(content) {
            return caps[1].trim().to_string();
        }
    }
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SIGNATURE_FALLBACK_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn is_error_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.contains("error-") || lower.contains("customerror-")
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or_default()
}

/// Highest count; ties go to the key that sorts first.
fn most_frequent(map: &BTreeMap<String, usize>) -> Option<(&str, usize)> {
    map.iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(k, v)| (k.as_str(), *v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn meta(name: &str) -> LogFileMetadata {
        LogFileMetadata {
            filename: name.into(),
            lastmod: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            size: 0,
        }
    }

    fn entry(level: LogLevel, hour: u32, source: Option<&str>, content: &str) -> ProcessedLogEntry {
        ProcessedLogEntry {
            level,
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 15, hour, 30, 0).unwrap()),
            source: source.map(String::from),
            content: content.into(),
        }
    }

    fn summary(errors: usize, warnings: usize, issues: &[&str]) -> LogSummary {
        LogSummary {
            error_count: errors,
            warning_count: warnings,
            key_issues: issues.iter().map(|s| s.to_string()).collect(),
            ..LogSummary::new("20240115")
        }
    }

    #[test]
    fn perfect_health() {
        let health = calculate_health_score(&summary(0, 0, &[]));
        assert_eq!(
            health,
            HealthScore {
                score: 100,
                level: HealthLevel::Excellent,
                factors: vec![],
            }
        );
    }

    #[test]
    fn error_deduction_is_capped() {
        let health = calculate_health_score(&summary(20, 0, &[]));
        assert_eq!(health.score, 70);
        assert_eq!(health.level, HealthLevel::Warning);
        assert_eq!(health.factors, vec!["20 errors (-30)"]);
    }

    #[test]
    fn warning_deduction_floors() {
        // 100 - (13 - 10) * 0.5 = 98.5
        let health = calculate_health_score(&summary(0, 13, &[]));
        assert_eq!(health.score, 98);
        assert_eq!(health.factors, vec!["13 warnings (-1.5)"]);
    }

    #[test]
    fn fractional_score_stays_below_level_boundary() {
        // 100 - (31 - 10) * 0.5 = 89.5, still short of excellent
        let health = calculate_health_score(&summary(0, 31, &[]));
        assert_eq!(health.score, 89);
        assert_eq!(health.level, HealthLevel::Good);
    }

    #[test]
    fn all_deductions_floor_at_critical() {
        let issues = ["a", "b", "c", "d", "e", "f"];
        let health = calculate_health_score(&summary(100, 500, &issues));
        assert_eq!(health.score, 30);
        assert_eq!(health.level, HealthLevel::Critical);
        assert_eq!(health.factors.len(), 3);
    }

    #[test]
    fn signatures_follow_priority() {
        assert_eq!(error_signature("java.io.IOException: Timeout "), "Timeout");
        assert_eq!(error_signature("Error: Product not found"), "Product not found");
        assert_eq!(error_signature("Failed to connect to host"), "connect to host");
        assert_eq!(error_signature("Cannot read property 'x'"), "read property 'x'");
        assert_eq!(error_signature("short message"), "short message");
        let long = "x".repeat(60);
        assert_eq!(error_signature(&long), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn patterns_count_repeated_errors() {
        let entries = vec![
            entry(LogLevel::Error, 10, Some("Checkout"), "Exception: Timeout"),
            entry(LogLevel::Error, 10, Some("Checkout"), "Exception: Timeout"),
            entry(LogLevel::Info, 23, Some("Cart"), "Exception: Timeout"),
        ];
        let patterns = detect_patterns(&entries);
        assert_eq!(patterns.frequent_errors.get("Timeout"), Some(&2));
        assert_eq!(patterns.time_patterns.get("10:00-11:00"), Some(&2));
        assert_eq!(patterns.time_patterns.get("23:00-24:00"), Some(&1));
        assert_eq!(patterns.source_patterns.get("Checkout"), Some(&2));
        assert_eq!(patterns.source_patterns.get("Cart"), Some(&1));
    }

    #[test]
    fn trends_against_history() {
        let history = vec![summary(4, 0, &["Timeout"]), summary(6, 0, &["Disk full"])];

        let rising = find_trending_issues(&summary(16, 0, &["Timeout", "Null basket"]), &history);
        assert_eq!(rising.increasing, vec!["Overall error rate"]);
        assert!(rising.decreasing.is_empty());
        assert_eq!(rising.new_issues, vec!["Null basket"]);

        let falling = find_trending_issues(&summary(2, 0, &[]), &history);
        assert_eq!(falling.decreasing, vec!["Overall error rate"]);

        let steady = find_trending_issues(&summary(5, 0, &[]), &history);
        assert!(steady.increasing.is_empty() && steady.decreasing.is_empty());
    }

    #[test]
    fn trends_without_history() {
        let trends = find_trending_issues(&summary(1, 0, &["Timeout"]), &[]);
        assert_eq!(trends.increasing, vec!["Overall error rate"]);
        assert_eq!(trends.new_issues, vec!["Timeout"]);

        let quiet = find_trending_issues(&summary(0, 0, &[]), &[]);
        assert_eq!(quiet, TrendingIssues::default());
    }

    #[test]
    fn recommendations_in_order() {
        let mut patterns = PatternAnalysis::default();
        patterns.frequent_errors.insert("Timeout".into(), 3);
        patterns.frequent_errors.insert("Disk full".into(), 3);
        patterns.frequent_errors.insert("Null basket".into(), 1);
        patterns.time_patterns.insert("9:00-10:00".into(), 12);

        let recs = generate_recommendations(&summary(11, 51, &["Timeout"]), &patterns);
        assert_eq!(recs.len(), 4);
        assert!(recs[0].starts_with("High error count (11)"));
        assert!(recs[1].starts_with("Many warnings (51)"));
        assert_eq!(recs[2], "Most frequent error: \"Disk full\" (3 occurrences)");
        assert_eq!(recs[3], "Busiest hour: 9:00-10:00 (12 entries)");
    }

    #[test]
    fn all_clear_recommendation() {
        let recs = generate_recommendations(&summary(0, 3, &[]), &PatternAnalysis::default());
        assert_eq!(recs, vec!["No errors or key issues found; no action needed"]);
    }

    #[test]
    fn analyze_counts_levels_and_extracts_issues() {
        let files = vec![
            meta("error-blade1-20240115-000000.log"),
            meta("customerror-blade1-20240115-000000.log"),
            meta("info-blade1-20240115-000000.log"),
            meta("warn-blade1-20240115-000000.log"),
        ];
        let mut contents = HashMap::new();
        contents.insert(
            files[0].filename.clone(),
            "\
[2024-01-15 10:00:00.000 GMT] ERROR PipelineCallServlet|1|Sites-Site [] Error: Product not found
[2024-01-15 10:05:00.000 GMT] ERROR PipelineCallServlet|2|Sites-Site [] Error: Product not found
[2024-01-15 10:06:00.000 GMT] ERROR JobThread|3 [] java.net.SocketException: Connection reset
\tat java.net.Socket.read(Socket.java:1)
"
            .to_string(),
        );
        contents.insert(
            files[1].filename.clone(),
            "[2024-01-15 11:00:00.000 GMT] ERROR PipelineCallServlet|4 custom.Checkout [] Cannot place order\n"
                .to_string(),
        );
        contents.insert(
            files[2].filename.clone(),
            "[2024-01-15 11:00:00.000 GMT] INFO x [] started\n[2024-01-15 11:00:01.000 GMT] INFO x [] Error: looks bad but is info\n"
                .to_string(),
        );

        let analyzer = LogAnalyzer::default();
        let summary = analyzer.analyze_logs(&files, &contents, "20240115");

        assert_eq!(summary.error_count, 4);
        assert_eq!(summary.info_count, 2);
        assert_eq!(summary.warning_count, 0);
        assert_eq!(summary.files.len(), 4);
        assert_eq!(
            summary.key_issues,
            vec!["Product not found", "Connection reset", "place order"]
        );
    }

    #[test]
    fn level_tokens_are_case_sensitive() {
        let files = vec![meta("info-a-20240115.log")];
        let mut contents = HashMap::new();
        contents.insert(
            files[0].filename.clone(),
            "error in lowercase\nERRORS plural\nWARN real\nINFO real\n".to_string(),
        );
        let summary = LogAnalyzer::default().analyze_logs(&files, &contents, "20240115");
        assert_eq!(summary.error_count, 0);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.info_count, 1);
    }

    #[test]
    fn every_token_occurrence_counts() {
        let files = vec![meta("error-a-20240115.log")];
        let mut contents = HashMap::new();
        contents.insert(
            files[0].filename.clone(),
            "[2024-01-15 10:00:00.000 GMT] ERROR x [] upstream replied ERROR twice
WARN WARN
".to_string(),
        );
        let summary = LogAnalyzer::default().analyze_logs(&files, &contents, "20240115");
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 2);
    }

    #[test]
    fn raw_error_lines_when_no_headers() {
        let files = vec![meta("error-legacy.log")];
        let mut contents = HashMap::new();
        contents.insert(
            files[0].filename.clone(),
            "ERROR Failed to sync inventory\nERROR Failed to sync inventory\nok line\n".to_string(),
        );
        let summary = LogAnalyzer::default().analyze_logs(&files, &contents, "20240115");
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.key_issues, vec!["sync inventory"]);
    }

    #[test]
    fn key_issues_are_capped_per_file() {
        let files = vec![meta("error-a.log")];
        let content: String = (0..20)
            .map(|i| format!("[2024-01-15 10:00:00.000 GMT] ERROR x [] Error: issue {i}\n"))
            .collect();
        let mut contents = HashMap::new();
        contents.insert(files[0].filename.clone(), content);

        let config = LogToolsConfig {
            max_key_issues_per_file: 3,
            ..Default::default()
        };
        let summary = LogAnalyzer::new(&config).analyze_logs(&files, &contents, "20240115");
        assert_eq!(summary.key_issues, vec!["issue 0", "issue 1", "issue 2"]);
    }

    #[test]
    fn summarize_builds_full_report() {
        let files = vec![meta("error-a.log")];
        let mut contents = HashMap::new();
        contents.insert(
            files[0].filename.clone(),
            "[2024-01-15 14:00:00.000 GMT] ERROR Servlet|1 [] Exception: Timeout\n\
             [2024-01-15 14:10:00.000 GMT] ERROR Servlet|1 [] Exception: Timeout\n"
                .to_string(),
        );
        let report = LogAnalyzer::default().summarize(&files, &contents, "20240115");
        assert_eq!(report.summary.error_count, 2);
        assert_eq!(report.patterns.frequent_errors.get("Timeout"), Some(&2));
        assert_eq!(report.patterns.source_patterns.get("Servlet"), Some(&2));
        // 100 - 4 (errors) - 5 (one key issue)
        assert_eq!(report.health.score, 91);
        assert!(report
            .recommendations
            .contains(&"Busiest hour: 14:00-15:00 (2 entries)".to_string()));
    }
}
