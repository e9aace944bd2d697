use crate::error::SubmissionError;
use crate::models::{Report, Status, Urgency};

pub const MIN_LOCATION_CHARS: usize = 3;
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// A report as typed by a student, before it reaches the store.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub title: Option<String>,
    pub issue_type: String,
    pub location: String,
    pub description: String,
    pub urgency: String,
}

/// A submission that passed validation.
#[derive(Debug, Clone)]
pub struct ValidReport {
    pub title: Option<String>,
    pub issue_type: String,
    pub location: String,
    pub description: String,
    pub urgency: Urgency,
}

impl NewReport {
    pub fn validate(self) -> Result<ValidReport, SubmissionError> {
        let issue_type = required(self.issue_type, "issue type")?;
        let location = required(self.location, "location")?;
        let description = required(self.description, "description")?;
        let urgency = required(self.urgency, "urgency")?;

        if location.chars().count() < MIN_LOCATION_CHARS {
            return Err(SubmissionError::LocationTooShort {
                min: MIN_LOCATION_CHARS,
            });
        }
        if description.chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(SubmissionError::DescriptionTooShort {
                min: MIN_DESCRIPTION_CHARS,
            });
        }
        let urgency = urgency
            .parse::<Urgency>()
            .map_err(|err| SubmissionError::InvalidUrgency(err.0))?;

        Ok(ValidReport {
            title: self
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty()),
            issue_type,
            location,
            description,
            urgency,
        })
    }
}

fn required(value: String, field: &'static str) -> Result<String, SubmissionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SubmissionError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Keeps reports matching both filters; `None` means "all".
pub fn filter_issues<'a>(
    reports: &'a [Report],
    status: Option<Status>,
    urgency: Option<Urgency>,
) -> Vec<&'a Report> {
    reports
        .iter()
        .filter(|report| status.map_or(true, |wanted| report.status == Some(wanted)))
        .filter(|report| urgency.map_or(true, |wanted| report.urgency_or_default() == wanted))
        .collect()
}

/// Only open and in-progress reports can be fixed; unrecognized ones stay put.
pub fn can_fix(report: &Report) -> bool {
    matches!(report.status, Some(Status::Open | Status::InProgress))
}

pub fn status_label(report: &Report) -> &'static str {
    report.status.map_or("unknown", Status::as_str)
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
