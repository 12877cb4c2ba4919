use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use solvefeed::config::Config;
use solvefeed::feed::FeedBuilder;
use solvefeed::serve::AggregateFeed;
use solvefeed::upstream::{parse_subject_list, UpstreamClient};

#[derive(Parser, Debug)]
#[command(name = "solvefeed", about = "Render an RSS feed of solution articles")]
struct Args {
    /// Config file path
    #[arg(long, value_name = "FILE", default_value = "solvefeed.toml")]
    config: PathBuf,

    /// Comma-separated subjects, overriding the config file
    #[arg(long, value_name = "LIST")]
    subjects: Option<String>,

    /// Articles per subject, overriding the config file
    #[arg(long, value_name = "N")]
    limit: Option<i64>,

    /// Write the feed here instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load configuration")?;

    let subjects = match &args.subjects {
        Some(list) => parse_subject_list(list).context("Invalid --subjects list")?,
        None => config.subjects.clone(),
    };
    if subjects.is_empty() {
        anyhow::bail!(
            "No subjects configured. Pass --subjects or set `subjects` in {}",
            args.config.display()
        );
    }
    let limit = args.limit.unwrap_or(config.limit_per_subject);

    let upstream_url = url::Url::parse(&config.upstream_url)
        .with_context(|| format!("Invalid upstream_url: {}", config.upstream_url))?;
    if let Some(self_url) = &config.self_url {
        url::Url::parse(self_url).with_context(|| format!("Invalid self_url: {self_url}"))?;
    }

    let (cookie, csrf) = config.session();
    let client = UpstreamClient::new(upstream_url.as_str(), reqwest::Client::new())
        .with_timeout(Duration::from_secs(config.fetch_timeout_seconds))
        .with_session(cookie.map(SecretString::from), csrf.map(SecretString::from));
    let builder = Arc::new(FeedBuilder::new(Arc::new(client)));

    let mut aggregate = AggregateFeed::new(
        builder,
        subjects,
        limit,
        Duration::from_secs(config.cache_ttl_seconds),
    );
    if let Some(self_url) = &config.self_url {
        aggregate = aggregate.with_self_url(self_url.as_str());
    }

    let xml = aggregate.serve().await.context("Failed to build feed")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &xml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = xml.len(), "Feed written");
        }
        None => {
            std::io::stdout()
                .write_all(&xml)
                .context("Failed to write feed to stdout")?;
        }
    }

    Ok(())
}
