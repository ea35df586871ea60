//! davlog agent: discovers, reads and analyzes logs on a WebDAV log store.
//!
//! Runs one command per invocation and prints its result as JSON.

use tracing_subscriber::EnvFilter;

use dl_agent::commands::{Command, CommandExecutor, USAGE};
use dl_agent::config::AgentConfig;
use dl_webdav::HttpWebDavClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((config_path, command_args)) = args.split_first() else {
        anyhow::bail!("{USAGE}");
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dl-agent starting");

    // ── Load config ─────────────────────────────────────────────
    let config = AgentConfig::from_file(config_path)?;
    tracing::info!(
        base_url = %config.webdav.base_url,
        batch_size = config.tools.batch_size,
        "config loaded"
    );

    let command = Command::parse(command_args)?;

    // ── Remote store ────────────────────────────────────────────
    let client = HttpWebDavClient::new(config.webdav.clone())?;
    let executor = CommandExecutor::new(&client, &config.tools);

    let output = executor.execute(&command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
