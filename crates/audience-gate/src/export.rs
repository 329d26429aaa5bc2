//! Delimited exports with a UTF-8 byte-order mark so spreadsheet tools render Korean text.

use crate::batch::{ApplicantReport, TargetRow, TargetStatus};
use crate::eligibility::Thresholds;
use crate::platform::PlatformTag;
use std::io::Write;

const BYTE_ORDER_MARK: &[u8] = "\u{feff}".as_bytes();

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode export row: {0}")]
    Csv(#[from] csv::Error),
}

/// One row per checked URL: URL, platform, metric, threshold, verdict.
pub fn write_target_rows<W: Write>(
    mut writer: W,
    rows: &[TargetRow],
    thresholds: &Thresholds,
) -> Result<(), ExportError> {
    writer.write_all(BYTE_ORDER_MARK)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["url", "platform", "metric", "threshold", "verdict"])?;

    for row in rows {
        let platform = row
            .target
            .platform
            .map(PlatformTag::display_name)
            .unwrap_or("unsupported");
        let threshold = row
            .threshold(thresholds)
            .map(|value| value.to_string())
            .unwrap_or_default();
        let metric = row.outcome.metric_value().to_string();
        csv_writer.write_record([
            row.target.url.as_str(),
            platform,
            metric.as_str(),
            threshold.as_str(),
            row.outcome.status().label(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn target_rows_csv(rows: &[TargetRow], thresholds: &Thresholds) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_target_rows(&mut buffer, rows, thresholds)?;
    Ok(buffer)
}

/// One row per applicant with a (metric, status) pair per platform and the final status.
pub fn write_applicant_reports<W: Write>(
    mut writer: W,
    reports: &[ApplicantReport],
) -> Result<(), ExportError> {
    writer.write_all(BYTE_ORDER_MARK)?;
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["name".to_string()];
    for platform in PlatformTag::ALL {
        header.push(format!("{} {}", platform.label(), platform.metric_name()));
        header.push(format!("{} status", platform.label()));
    }
    header.push("final_status".to_string());
    csv_writer.write_record(&header)?;

    for report in reports {
        let mut record = vec![report.applicant.name.clone()];
        for platform in PlatformTag::ALL {
            let (metric, status) = match report.verdicts.get(&platform) {
                None => (String::new(), String::new()),
                Some(None) => ("0".to_string(), TargetStatus::Error.label().to_string()),
                Some(Some(verdict)) => {
                    let status = if verdict.passed {
                        TargetStatus::Passed
                    } else {
                        TargetStatus::Failed
                    };
                    (verdict.metric.value.to_string(), status.label().to_string())
                }
            };
            record.push(metric);
            record.push(status);
        }
        record.push(report.final_status.label().to_string());
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn applicant_reports_csv(reports: &[ApplicantReport]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_applicant_reports(&mut buffer, reports)?;
    Ok(buffer)
}
