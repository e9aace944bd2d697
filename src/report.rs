use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::issues;
use crate::models::{Metric, Notice, RankedView, Report, User};
use crate::ranking;
use crate::tally;

const OPEN_ISSUE_LIMIT: usize = 5;
const NOTICE_LIMIT: usize = 3;

/// Podium lines followed by the numbered remainder.
pub fn render_leaderboard(view: &RankedView, unit: &str) -> String {
    let mut output = String::new();

    for (index, entry) in view.top.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({} {})",
            index + 1,
            entry.display_name,
            entry.metric_value,
            unit
        );
    }

    if view.rest.is_empty() {
        let _ = writeln!(output, "No further entries.");
    } else {
        for row in view.rest.iter() {
            let _ = writeln!(
                output,
                "#{} {} ({} {})",
                row.rank, row.entry.display_name, row.entry.metric_value, unit
            );
        }
    }

    output
}

pub fn build_report(
    campus_id: &str,
    now: DateTime<Utc>,
    reports: &[Report],
    users: &[User],
    notices: &[Notice],
) -> String {
    let (counts, resolved_today) = tally::tally_since(reports, Some(tally::start_of_day(now)));
    let entries = ranking::rank_entries(users, Metric::Points, "Anonymous");
    let view = ranking::build_ranked_view(&entries);

    let mut output = String::new();

    let _ = writeln!(output, "# VerdeX Campus Report");
    let _ = writeln!(output, "Generated for {} on {}", campus_id, now.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Issue Status");
    let _ = writeln!(output, "- Open: {}", counts.open);
    let _ = writeln!(output, "- In progress: {}", counts.in_progress);
    let _ = writeln!(output, "- Resolved: {} ({} today)", counts.resolved, resolved_today);

    let unrecognized = reports.len() - counts.total();
    if unrecognized > 0 {
        let _ = writeln!(output, "- Unrecognized status: {}", unrecognized);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Contributors");
    for (index, entry) in view.top.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({} pts)",
            index + 1,
            entry.display_name,
            entry.metric_value
        );
    }

    let active: Vec<&Report> = reports
        .iter()
        .filter(|report| issues::can_fix(report))
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Issues");

    if active.is_empty() {
        let _ = writeln!(output, "No active issues. All issues have been resolved.");
    } else {
        for report in active.iter().take(OPEN_ISSUE_LIMIT) {
            let _ = writeln!(
                output,
                "- [{}] {} at {} ({} urgency): {}",
                issues::status_label(report),
                report.headline(),
                report.location,
                report.urgency_or_default(),
                issues::truncate(&report.description, 100)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Notices");

    if notices.is_empty() {
        let _ = writeln!(output, "No notices yet.");
    } else {
        for notice in notices.iter().take(NOTICE_LIMIT) {
            let date = notice
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Recent".to_string());
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                notice.title_or_default(),
                date,
                notice.content_or_default()
            );
        }
    }

    output
}
