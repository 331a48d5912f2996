use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use modscope_k8s::{KubeClient, fetch_snippets};
use modscope_logs::{LogQuery, LogScanner};
use modscope_render::{
    DEFAULT_MAX_SNIPPET, DEFAULT_MAX_URI, TableOptions, explain, render_json,
    render_snippets_json, render_snippets_table, render_table,
};
use modscope_types::{DEFAULT_SELECTOR, DEFAULT_SINCE, parse_duration};

mod config;

use config::Config;

/// Modscope - extract ModSecurity WAF information from Kubernetes
#[derive(Parser, Debug)]
#[command(name = "modscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Kubernetes context name (defaults to the current context)
    #[arg(long, global = true)]
    context: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ModSecurity logs from nginx ingress controllers
    Logs(LogsArgs),

    /// ModSecurity snippets from nginx ingresses
    Snippets(SnippetsArgs),
}

#[derive(clap::Args, Debug)]
struct LogsArgs {
    /// JSON output with ModSecurity message details
    #[arg(long)]
    json: bool,

    /// Show matched data next to each rule ID
    #[arg(long)]
    details: bool,

    /// Only logs newer than a relative duration like 5s, 2m or 3h (0 for all) [default: 24h]
    #[arg(long, value_parser = parse_duration)]
    since: Option<Duration>,

    /// Only logs with this HTTP response code (0 for all)
    #[arg(long, default_value_t = 0)]
    code: u16,

    /// Label selector for the ingress controller pods [default: app=ingress-nginx-controller]
    #[arg(short = 'l', long)]
    selector: Option<String>,

    /// Maximum URI length in the table [default: 30]
    #[arg(long)]
    max_uri: Option<usize>,
}

#[derive(clap::Args, Debug)]
struct SnippetsArgs {
    /// JSON output
    #[arg(long)]
    json: bool,

    /// Explain ModSecurity and ingress annotations
    #[arg(long)]
    explain: bool,

    /// Maximum length of each snippet line in the table [default: 50]
    #[arg(long)]
    max_snippet: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so rendered output stays clean on stdout
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run_app(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(args: Args) -> Result<()> {
    let config = Config::load()?;
    let context = args.context.or_else(|| config.context.clone());

    let output = match args.command {
        Command::Logs(logs) => run_logs(&logs, &config, context.as_deref()).await?,
        Command::Snippets(snippets) => {
            run_snippets(&snippets, &config, context.as_deref()).await?
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

async fn run_logs(args: &LogsArgs, config: &Config, context: Option<&str>) -> Result<String> {
    let query = log_query(args, config)?;
    debug!(?query, "resolved log query");

    let client = KubeClient::new(context).await?;
    let records = LogScanner::new(query).scan(&client).await?.into_records();

    if args.json {
        Ok(render_json(&records)?)
    } else {
        let options = TableOptions {
            max_uri: args.max_uri.or(config.max_uri).unwrap_or(DEFAULT_MAX_URI),
            details: args.details,
        };
        Ok(render_table(&records, &options))
    }
}

async fn run_snippets(
    args: &SnippetsArgs,
    config: &Config,
    context: Option<&str>,
) -> Result<String> {
    if args.explain {
        return Ok(explain().to_string());
    }

    let client = KubeClient::new(context).await?;
    let entries = fetch_snippets(&client).await?;

    if args.json {
        Ok(render_snippets_json(&entries)?)
    } else {
        let max_line = args
            .max_snippet
            .or(config.max_snippet)
            .unwrap_or(DEFAULT_MAX_SNIPPET);
        Ok(render_snippets_table(&entries, max_line))
    }
}

/// Merge flags over the settings file over built-in defaults
fn log_query(args: &LogsArgs, config: &Config) -> Result<LogQuery> {
    let selector = args
        .selector
        .clone()
        .or_else(|| config.selector.clone())
        .unwrap_or_else(|| DEFAULT_SELECTOR.to_string());

    let since = match (args.since, config.since.as_deref()) {
        (Some(since), _) => since,
        (None, Some(raw)) => parse_duration(raw).context("Invalid since in config file")?,
        (None, None) => DEFAULT_SINCE,
    };

    Ok(LogQuery::new(selector)
        .with_since(since)
        .with_code(args.code))
}
