use crate::cli::PipelineArgs;
use audience_gate::batch::{
    ApplicantReport, BatchOrchestrator, BatchProgress, PipelineSettings, TargetRow,
};
use audience_gate::config::AppConfig;
use audience_gate::error::AppError;
use audience_gate::export::{write_applicant_reports, write_target_rows};
use audience_gate::fetcher::WebDriverFetcher;
use audience_gate::intake::{parse_applicant_sheet_path, parse_lines, parse_upload_path};
use audience_gate::platform::PlatformTag;
use audience_gate::telemetry;
use clap::error::ErrorKind;
use clap::{Args, ValueEnum};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Handles, @handles, blog ids, or profile URLs
    #[arg(required = true)]
    pub(crate) targets: Vec<String>,
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum InputFormat {
    /// One identifier per line
    Lines,
    /// Delimited file; every http(s) field is a target
    Upload,
    /// Applicant spreadsheet export with fixed link columns
    Sheet,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// File holding the targets or applicants
    #[arg(long)]
    pub(crate) input: PathBuf,
    #[arg(long, value_enum, default_value_t = InputFormat::Lines)]
    pub(crate) format: InputFormat,
    /// Write one row per checked URL to this CSV file
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
    /// Write one row per applicant to this CSV file (sheet input only)
    #[arg(long)]
    pub(crate) applicants_out: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

impl BatchArgs {
    /// Applicant reports only exist for spreadsheet input.
    pub(crate) fn validate(&self) -> Result<(), clap::Error> {
        if self.applicants_out.is_some() && self.format != InputFormat::Sheet {
            return Err(clap::Error::raw(
                ErrorKind::ArgumentConflict,
                "--applicants-out requires --format sheet\n",
            ));
        }
        Ok(())
    }
}

fn orchestrator(overrides: &PipelineArgs) -> Result<BatchOrchestrator<WebDriverFetcher>, AppError> {
    let mut config = AppConfig::load()?;
    overrides.apply(&mut config.pipeline);
    telemetry::init(&config.telemetry)?;

    let fetcher = Arc::new(WebDriverFetcher::new(config.pipeline.browser_settings()));
    Ok(BatchOrchestrator::new(
        fetcher,
        config.pipeline.pipeline_settings(),
    ))
}

pub(crate) async fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let orchestrator = orchestrator(&args.pipeline)?;
    let rows = orchestrator
        .run_inputs(&args.targets, print_progress)
        .await?;
    render_rows(&rows, orchestrator.settings());
    Ok(())
}

pub(crate) async fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let BatchArgs {
        input,
        format,
        out,
        applicants_out,
        pipeline,
    } = args;
    let orchestrator = orchestrator(&pipeline)?;

    let (rows, reports) = match format {
        InputFormat::Lines => {
            let targets = parse_lines(&fs::read_to_string(&input)?);
            let rows = orchestrator.run_inputs(&targets, print_progress).await?;
            (rows, Vec::new())
        }
        InputFormat::Upload => {
            let targets = parse_upload_path(&input)?;
            let rows = orchestrator.run_inputs(&targets, print_progress).await?;
            (rows, Vec::new())
        }
        InputFormat::Sheet => {
            let applicants = parse_applicant_sheet_path(&input)?;
            let batch = orchestrator
                .run_applicants(applicants, print_progress)
                .await?;
            (batch.rows, batch.reports)
        }
    };

    render_rows(&rows, orchestrator.settings());
    if format == InputFormat::Sheet {
        render_reports(&reports);
    }

    if let Some(path) = out {
        write_csv(&path, |file| {
            write_target_rows(file, &rows, &orchestrator.settings().thresholds)
        })?;
        println!("\nTarget results written to {}", path.display());
    }
    if let Some(path) = applicants_out {
        write_csv(&path, |file| write_applicant_reports(file, &reports))?;
        println!("Applicant results written to {}", path.display());
    }
    Ok(())
}

fn write_csv<E>(
    path: &Path,
    write: impl FnOnce(BufWriter<File>) -> Result<(), E>,
) -> Result<(), AppError>
where
    AppError: From<E>,
{
    let file = File::create(path)?;
    write(BufWriter::new(file))?;
    Ok(())
}

fn print_progress(progress: &BatchProgress) {
    eprintln!(
        "[{}/{}] {}% complete",
        progress.index, progress.total, progress.percent
    );
}

fn render_rows(rows: &[TargetRow], settings: &PipelineSettings) {
    println!("\nAudience check ({} targets)", rows.len());
    for row in rows {
        let platform = row
            .target
            .platform
            .map(PlatformTag::display_name)
            .unwrap_or("unsupported");
        let threshold = row
            .threshold(&settings.thresholds)
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {} [{}] {} / {} -> {}",
            row.target.url,
            platform,
            row.outcome.metric_value(),
            threshold,
            row.outcome.status().label()
        );
    }
}

fn render_reports(reports: &[ApplicantReport]) {
    let selected = reports.iter().filter(|report| report.is_selected()).count();
    println!(
        "\nApplicants: {} evaluated | {} selected",
        reports.len(),
        selected
    );
    for report in reports {
        println!(
            "- {}: {}",
            report.applicant.name,
            report.final_status.label()
        );
        for (platform, verdict) in &report.verdicts {
            match verdict {
                Some(verdict) => println!(
                    "    - {} {} {} (threshold {})",
                    platform.display_name(),
                    platform.metric_name(),
                    verdict.metric.value,
                    verdict.threshold
                ),
                None => println!("    - {} check failed", platform.display_name()),
            }
        }
    }
}
