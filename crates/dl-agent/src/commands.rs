//! Command parsing and execution: one command in, one JSON document out.
//!
//! - `summary [date]`: read the day's logs and report summary, patterns,
//!   health, recommendations and the trend against the previous day
//! - `levels [date]`, `stats [date]`, `files`: discovery only
//! - `jobs [name]`: latest job logs, optionally matching a job name
//! - `tail <file>`, `head <file>`: bounded content reads

use anyhow::{Context, bail};
use chrono::NaiveDate;
use serde_json::{Value, json};

use dl_log_tools::analyzer::find_trending_issues;
use dl_log_tools::discovery::today_token;
use dl_log_tools::{
    FetchOutcome, LogAnalyzer, LogDiscovery, LogReader, LogToolsConfig, ReadOptions,
};
use dl_protocol::{LogFileMetadata, LogSummary};
use dl_webdav::WebDavClient;

pub const USAGE: &str = "usage: dl-agent <config.toml> <summary|levels|stats [date]> | files | jobs [name] | <tail|head> <file>";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Summary { date: Option<String> },
    Levels { date: Option<String> },
    Stats { date: Option<String> },
    Files,
    Jobs { name: Option<String> },
    Tail { file: String },
    Head { file: String },
}

impl Command {
    /// Parse the arguments that follow the config path.
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let name = args.next().context(USAGE)?;
        let arg = args.next().map(String::from);
        if args.next().is_some() {
            bail!("too many arguments\n{USAGE}");
        }

        let command = match name {
            "summary" => Self::Summary { date: arg },
            "levels" => Self::Levels { date: arg },
            "stats" => Self::Stats { date: arg },
            "files" => {
                if arg.is_some() {
                    bail!("files takes no argument\n{USAGE}");
                }
                Self::Files
            }
            "jobs" => Self::Jobs { name: arg },
            "tail" => Self::Tail {
                file: arg.context("tail needs a file name")?,
            },
            "head" => Self::Head {
                file: arg.context("head needs a file name")?,
            },
            other => bail!("unknown command: {other}\n{USAGE}"),
        };

        if let Self::Summary { date: Some(d) } | Self::Levels { date: Some(d) } | Self::Stats { date: Some(d) } =
            &command
        {
            parse_date_token(d)?;
        }
        Ok(command)
    }
}

/// Runs commands against a store.
pub struct CommandExecutor<'a> {
    client: &'a dyn WebDavClient,
    tools: &'a LogToolsConfig,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(client: &'a dyn WebDavClient, tools: &'a LogToolsConfig) -> Self {
        Self { client, tools }
    }

    pub async fn execute(&self, command: &Command) -> anyhow::Result<Value> {
        let discovery = LogDiscovery::new(self.client, self.tools);
        let reader = LogReader::new(self.client, self.tools);

        let value = match command {
            Command::Summary { date } => {
                let date = date.clone().unwrap_or_else(today_token);
                self.summary(&discovery, &reader, &date).await?
            }
            Command::Levels { date } => {
                let levels = discovery.get_available_log_levels(date.as_deref()).await?;
                serde_json::to_value(levels)?
            }
            Command::Stats { date } => {
                serde_json::to_value(discovery.get_log_file_stats(date.as_deref()).await?)?
            }
            Command::Files => serde_json::to_value(discovery.get_all_log_files().await?)?,
            Command::Jobs { name: None } => {
                serde_json::to_value(discovery.get_latest_job_log_files(None).await?)?
            }
            Command::Jobs { name: Some(name) } => {
                serde_json::to_value(discovery.search_job_logs_by_name(name, None).await?)?
            }
            Command::Tail { file } => {
                let outcome = reader.get_file_contents_tail(file, None).await?;
                content_json(file, outcome)
            }
            Command::Head { file } => {
                let outcome = reader
                    .get_file_contents_head(file, Some(self.tools.default_tail_bytes))
                    .await?;
                content_json(file, outcome)
            }
        };
        Ok(value)
    }

    async fn summary(
        &self,
        discovery: &LogDiscovery<'_>,
        reader: &LogReader<'_>,
        date: &str,
    ) -> anyhow::Result<Value> {
        let analyzer = LogAnalyzer::new(self.tools);

        let files = discovery.get_log_files(Some(date)).await?;
        let contents = read_all(reader, &files).await;
        let report = analyzer.summarize(&files, &contents, date);

        let previous_date = previous_day(date)?;
        let previous = match discovery.get_log_files(Some(&previous_date)).await {
            Ok(prev_files) => {
                let prev_contents = read_all(reader, &prev_files).await;
                vec![analyzer.analyze_logs(&prev_files, &prev_contents, &previous_date)]
            }
            Err(e) => {
                tracing::warn!(date = %previous_date, error = %e, "no previous day to compare against");
                Vec::<LogSummary>::new()
            }
        };
        let trends = find_trending_issues(&report.summary, &previous);

        tracing::info!(
            date,
            files = files.len(),
            score = report.health.score,
            level = %report.health.level,
            "summary computed"
        );
        Ok(json!({
            "report": report,
            "trends": trends,
        }))
    }
}

async fn read_all(
    reader: &LogReader<'_>,
    files: &[LogFileMetadata],
) -> std::collections::HashMap<String, String> {
    let names: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();
    reader.read_multiple_files(&names, ReadOptions::default()).await
}

fn content_json(file: &str, outcome: FetchOutcome) -> Value {
    match outcome {
        FetchOutcome::Complete(content) => json!({
            "file": file,
            "content": content,
            "degraded": false,
        }),
        FetchOutcome::Degraded { content, reason } => json!({
            "file": file,
            "content": content,
            "degraded": true,
            "reason": reason,
        }),
    }
}

fn parse_date_token(token: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(token, "%Y%m%d")
        .with_context(|| format!("invalid date {token:?}, expected YYYYMMDD"))
}

fn previous_day(token: &str) -> anyhow::Result<String> {
    let date = parse_date_token(token)?;
    let prev = date.pred_opt().context("date out of range")?;
    Ok(prev.format("%Y%m%d").to_string())
}
