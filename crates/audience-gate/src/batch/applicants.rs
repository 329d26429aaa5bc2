use super::TargetOutcome;
use crate::eligibility::Verdict;
use crate::platform::PlatformTag;
use crate::resolver::{resolve_for_platform, CanonicalTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A person evaluated jointly across the links they submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    /// At most one link per platform; unresolvable links keep `platform: None`.
    pub submissions: BTreeMap<PlatformTag, CanonicalTarget>,
}

impl Applicant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: None,
            submissions: BTreeMap::new(),
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        let contact = contact.into();
        if !contact.trim().is_empty() {
            self.contact = Some(contact.trim().to_string());
        }
        self
    }

    /// Record the link submitted for `platform`. Blank links are ignored.
    pub fn with_link(mut self, platform: PlatformTag, raw: &str) -> Self {
        if !raw.trim().is_empty() {
            self.submissions
                .insert(platform, resolve_for_platform(raw, platform));
        }
        self
    }

    pub fn has_submissions(&self) -> bool {
        !self.submissions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinalStatus {
    Selected,
    NotSelected,
}

impl FinalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FinalStatus::Selected => "selected",
            FinalStatus::NotSelected => "not-selected",
        }
    }
}

/// Joint outcome for one applicant. A `None` verdict marks a platform whose check errored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantReport {
    pub applicant: Applicant,
    pub verdicts: BTreeMap<PlatformTag, Option<Verdict>>,
    pub final_status: FinalStatus,
}

impl ApplicantReport {
    pub fn is_selected(&self) -> bool {
        self.final_status == FinalStatus::Selected
    }
}

/// Fold one applicant's per-platform outcomes into a report.
///
/// Applicants without submissions produce no report. Selection requires every submitted
/// platform to have passed; an errored platform counts as not passed.
pub fn fold_report(
    applicant: Applicant,
    outcomes: BTreeMap<PlatformTag, TargetOutcome>,
) -> Option<ApplicantReport> {
    if !applicant.has_submissions() {
        return None;
    }

    let verdicts: BTreeMap<PlatformTag, Option<Verdict>> = applicant
        .submissions
        .keys()
        .map(|platform| {
            let verdict = outcomes
                .get(platform)
                .and_then(|outcome| outcome.verdict().cloned());
            (*platform, verdict)
        })
        .collect();

    let all_passed = verdicts
        .values()
        .all(|verdict| verdict.as_ref().is_some_and(|verdict| verdict.passed));
    let final_status = if all_passed {
        FinalStatus::Selected
    } else {
        FinalStatus::NotSelected
    };

    Some(ApplicantReport {
        applicant,
        verdicts,
        final_status,
    })
}
