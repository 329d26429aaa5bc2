use crate::batch::{run_batch, run_check, BatchArgs, CheckArgs};
use crate::server;
use audience_gate::config::PipelineConfig;
use audience_gate::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "audience-gate",
    about = "Check Instagram, Threads, and Naver Blog audience sizes against eligibility thresholds",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Check one or more identifiers and print the verdicts
    Check(CheckArgs),
    /// Run a file of identifiers or applicants and export the results
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

/// Per-invocation overrides for the `GATE_*` settings.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct PipelineArgs {
    /// Minimum Instagram followers
    #[arg(long)]
    pub(crate) instagram_threshold: Option<u64>,
    /// Minimum Threads followers
    #[arg(long)]
    pub(crate) threads_threshold: Option<u64>,
    /// Minimum Naver Blog neighbors
    #[arg(long)]
    pub(crate) blog_threshold: Option<u64>,
    /// Milliseconds to wait between consecutive targets
    #[arg(long)]
    pub(crate) pacing_ms: Option<u64>,
    /// Overall seconds allowed for one render
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,
    /// ChromeDriver endpoint
    #[arg(long)]
    pub(crate) webdriver_url: Option<String>,
    /// Show the browser window instead of running headless
    #[arg(long)]
    pub(crate) headed: bool,
}

impl PipelineArgs {
    pub(crate) fn apply(&self, config: &mut PipelineConfig) {
        if let Some(value) = self.instagram_threshold {
            config.thresholds.instagram = value;
        }
        if let Some(value) = self.threads_threshold {
            config.thresholds.threads = value;
        }
        if let Some(value) = self.blog_threshold {
            config.thresholds.blog = value;
        }
        if let Some(value) = self.pacing_ms {
            config.pacing = Duration::from_millis(value);
        }
        if let Some(value) = self.timeout_secs {
            config.target_timeout = Duration::from_secs(value);
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if self.headed {
            config.headless = false;
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Check(args) => run_check(args).await,
        Command::Batch(args) => {
            if let Err(err) = args.validate() {
                err.exit();
            }
            run_batch(args).await
        }
    }
}
