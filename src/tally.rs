use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{Report, StaffSummary, Status, StatusCounts};

pub fn tally(reports: &[Report]) -> StatusCounts {
    tally_since(reports, None).0
}

/// Counts resolved reports fixed at or after `cutoff`.
pub fn resolved_since(reports: &[Report], cutoff: DateTime<Utc>) -> usize {
    tally_since(reports, Some(cutoff)).1
}

/// Single pass over `reports` producing the status partition and, when a
/// cutoff is given, the number of resolutions on or after it.
pub fn tally_since(reports: &[Report], cutoff: Option<DateTime<Utc>>) -> (StatusCounts, usize) {
    let mut counts = StatusCounts::default();
    let mut recent = 0usize;

    for report in reports {
        match report.status {
            Some(Status::Open) => counts.open += 1,
            Some(Status::InProgress) => counts.in_progress += 1,
            Some(Status::Resolved) => {
                counts.resolved += 1;
                if let (Some(cutoff), Some(fixed_at)) = (cutoff, report.fixed_at) {
                    if fixed_at >= cutoff {
                        recent += 1;
                    }
                }
            }
            None => {}
        }
    }

    (counts, recent)
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn staff_summary(reports: &[Report], staff_id: Option<Uuid>, now: DateTime<Utc>) -> StaffSummary {
    let (counts, completed_today) = tally_since(reports, Some(start_of_day(now)));
    let resolved_by_me = staff_id.map_or(0, |id| {
        reports
            .iter()
            .filter(|report| report.status == Some(Status::Resolved) && report.fixed_by == Some(id))
            .count()
    });

    StaffSummary {
        assigned: counts.open + counts.in_progress,
        pending: counts.open,
        in_progress: counts.in_progress,
        completed_today,
        resolved_by_me,
    }
}
