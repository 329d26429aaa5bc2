//! Submission intake: pasted lists, uploaded delimited files, and spreadsheet exports.

use crate::batch::Applicant;
use crate::platform::PlatformTag;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

const NAME_COLUMN: usize = 1;
const THREADS_COLUMN: usize = 5;
const INSTAGRAM_COLUMN: usize = 6;
const BLOG_COLUMN: usize = 7;

#[derive(Debug)]
pub enum IntakeError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::Io(err) => write!(f, "failed to read submission file: {}", err),
            IntakeError::Csv(err) => write!(f, "invalid delimited submission data: {}", err),
        }
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Io(err) => Some(err),
            IntakeError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for IntakeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IntakeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Newline-delimited identifiers, trimmed, blanks dropped.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(clean_cell)
        .filter(|line| !line.is_empty())
        .collect()
}

/// URLs from an uploaded delimited file: every field that starts with an HTTP scheme.
pub fn parse_upload<R: Read>(reader: R) -> Result<Vec<String>, IntakeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut urls = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        urls.extend(
            record
                .iter()
                .map(clean_cell)
                .filter(|field| has_http_scheme(field)),
        );
    }
    debug!(count = urls.len(), "parsed uploaded URLs");
    Ok(urls)
}

pub fn parse_upload_path(path: impl AsRef<Path>) -> Result<Vec<String>, IntakeError> {
    let file = File::open(path)?;
    parse_upload(BufReader::new(file))
}

/// Applicants from a spreadsheet export.
///
/// Row 0 is a header. Column 1 holds the applicant name and columns 5, 6, 7 hold the
/// Threads, Instagram, and Naver Blog links. Rows with neither a name nor any link are
/// skipped.
pub fn parse_applicant_sheet<R: Read>(reader: R) -> Result<Vec<Applicant>, IntakeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut applicants = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let cell = |index: usize| record.get(index).map(clean_cell).unwrap_or_default();

        let name = cell(NAME_COLUMN);
        let links = [
            (PlatformTag::Threads, cell(THREADS_COLUMN)),
            (PlatformTag::Instagram, cell(INSTAGRAM_COLUMN)),
            (PlatformTag::Blog, cell(BLOG_COLUMN)),
        ];
        if name.is_empty() && links.iter().all(|(_, link)| link.is_empty()) {
            continue;
        }

        let applicant = links
            .iter()
            .fold(Applicant::new(name), |applicant, (platform, link)| {
                applicant.with_link(*platform, link)
            });
        applicants.push(applicant);
    }
    debug!(count = applicants.len(), "parsed applicant sheet");
    Ok(applicants)
}

pub fn parse_applicant_sheet_path(path: impl AsRef<Path>) -> Result<Vec<Applicant>, IntakeError> {
    let file = File::open(path)?;
    parse_applicant_sheet(BufReader::new(file))
}

fn clean_cell(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
