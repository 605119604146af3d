use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use netscore::config::Config;
use netscore::error_handling::ErrorReporter;
use netscore::fetcher::RepoDataFetcher;
use netscore::file_utils::read_urls_from_file;
use netscore::github::GitHubClient;
use netscore::logging::init_logging;
use netscore::metrics::NetScoreAggregator;
use netscore::npm::{NpmRegistryClient, NpmResolver};
use netscore::persistence::ResultsPersistence;
use netscore::processor::BatchProcessor;
use netscore::rate_limiter::RateLimiter;
use netscore::repo_cache::RepoCloneManager;

#[derive(Parser, Debug)]
#[command(author, version, about = "NetScore - Rates GitHub and npm packages on ramp-up, correctness, bus factor, responsiveness and license", long_about = None)]
struct Args {
    /// File with one GitHub or npm URL per line
    url_file: PathBuf,

    /// Pretty-print each JSON record
    #[arg(long)]
    pretty: bool,

    /// Directory for temporary clones (overrides NETSCORE_SCRATCH_DIR)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            ErrorReporter::report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = args.scratch_dir.clone() {
        config.scratch_root = dir;
    }
    if let Err(e) = init_logging(&config) {
        ErrorReporter::report_config_error(&e);
        return ExitCode::FAILURE;
    }

    match run(&args, config).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Evaluates every URL in the input file, returning how many failed.
async fn run(args: &Args, config: Config) -> anyhow::Result<usize> {
    info!(
        "Starting NetScore: scratch_root={:?}, requests_per_hour={}",
        config.scratch_root, config.requests_per_hour
    );

    let urls = read_urls_from_file(&args.url_file)
        .await
        .with_context(|| format!("Error reading file {}", args.url_file.display()))?;
    if urls.is_empty() {
        ErrorReporter::report_warning("No URLs found in input file");
        return Ok(0);
    }

    let limiter = Arc::new(RateLimiter::new(config.min_request_interval()));
    let github = GitHubClient::new(&config.api_base_url, config.github_token.clone())
        .context("Failed to build GitHub client")?;
    let fetcher = RepoDataFetcher::new(github, limiter, config.fetch.clone());
    let cloner = RepoCloneManager::new(&config.scratch_root);
    let aggregator = NetScoreAggregator::new(fetcher, cloner, config.metrics.clone());

    let registry = NpmRegistryClient::new(&config.npm_registry_url).context("Failed to build npm registry client")?;
    let mut processor = BatchProcessor::new(aggregator, NpmResolver::new(registry));

    let mut stdout = tokio::io::stdout();
    let (mut succeeded, mut failed) = (0usize, 0usize);

    for url in &urls {
        let outcome = processor.process_identifier(url).await;
        match &outcome.result {
            Ok(record) => {
                ResultsPersistence::write_record(&mut stdout, record, args.pretty)
                    .await
                    .context("Failed to write result")?;
                succeeded += 1;
            }
            Err(e) => {
                ErrorReporter::report_error(&outcome.url, e);
                failed += 1;
            }
        }
    }

    ErrorReporter::report_summary(succeeded, failed);
    Ok(failed)
}
