use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod award;
mod config;
mod db;
mod error;
mod issues;
mod models;
mod notices;
mod ranking;
mod report;
mod tally;

use models::{Metric, Status, UnknownLiteral, Urgency};

#[derive(Parser)]
#[command(name = "verdex")]
#[command(about = "Campus issue reports, resolutions and leaderboards for VerdeX", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo campuses, users, reports and notices
    Seed,
    /// Import issue reports from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank students on a campus by points, or campuses by score
    #[command(group(
        ArgGroup::new("scope")
            .args(["campus", "global"])
            .required(true)
            .multiple(false)
    ))]
    Leaderboard {
        #[arg(long)]
        campus: Option<String>,
        #[arg(long)]
        global: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Count a campus's issues by status
    Stats {
        #[arg(long)]
        campus: String,
        /// Staff account to include a personal summary for
        #[arg(long)]
        staff: Option<Uuid>,
        #[arg(long)]
        json: bool,
    },
    /// List a campus's issues, optionally filtered
    Issues {
        #[arg(long)]
        campus: String,
        #[arg(long, value_parser = parse_status)]
        status: Option<Status>,
        #[arg(long, value_parser = parse_urgency)]
        urgency: Option<Urgency>,
    },
    /// Show a user's points and report count
    Profile {
        #[arg(long)]
        user: Uuid,
    },
    /// Submit a new issue report under the reporter's campus
    Submit {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        issue_type: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        urgency: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Mark an issue resolved and award points to its reporter
    Resolve {
        #[arg(long)]
        report: Uuid,
        #[arg(long)]
        staff: Uuid,
        #[arg(long)]
        description: String,
        /// Reference to the photo showing the fix
        #[arg(long)]
        image: String,
    },
    /// List a campus's notices
    Notices {
        #[arg(long)]
        campus: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Generate a markdown campus report
    Report {
        #[arg(long)]
        campus: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_status(raw: &str) -> Result<Status, UnknownLiteral> {
    raw.parse()
}

fn parse_urgency(raw: &str) -> Result<Urgency, UnknownLiteral> {
    raw.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} reports from {}.", csv.display());
        }
        Commands::Leaderboard {
            campus,
            global: _,
            limit,
            json,
        } => {
            let (entries, unit) = match campus.as_deref() {
                Some(campus_id) => {
                    let users = db::fetch_campus_users(&pool, campus_id, limit).await?;
                    (ranking::rank_entries(&users, Metric::Points, "---"), "pts")
                }
                None => {
                    let campuses = db::fetch_campuses(&pool, limit).await?;
                    (ranking::rank_entries(&campuses, Metric::Score, "---"), "score")
                }
            };

            if !ranking::is_ranked(&entries) {
                warn!(
                    scope = campus.as_deref().unwrap_or("global"),
                    "leaderboard rows arrived out of order, ranking by store order"
                );
            }
            let view = ranking::build_ranked_view(&entries);

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("Leaderboard for {}:", campus.as_deref().unwrap_or("all campuses"));
                print!("{}", report::render_leaderboard(&view, unit));
            }
        }
        Commands::Stats { campus, staff, json } => {
            let reports = db::fetch_reports(&pool, &campus).await?;
            let counts = tally::tally(&reports);
            let summary = staff.map(|id| tally::staff_summary(&reports, Some(id), Utc::now()));

            if json {
                let payload = serde_json::json!({
                    "campus": campus,
                    "counts": counts,
                    "staff": summary,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Issues on {campus}:");
                println!("- open: {}", counts.open);
                println!("- in progress: {}", counts.in_progress);
                println!("- resolved: {}", counts.resolved);
                if let Some(summary) = summary {
                    println!("Staff summary:");
                    println!("- assigned: {}", summary.assigned);
                    println!("- pending: {}", summary.pending);
                    println!("- in progress: {}", summary.in_progress);
                    println!("- completed today: {}", summary.completed_today);
                    println!("- resolved by you: {}", summary.resolved_by_me);
                }
            }
        }
        Commands::Issues {
            campus,
            status,
            urgency,
        } => {
            let reports = db::fetch_reports(&pool, &campus).await?;
            let matching = issues::filter_issues(&reports, status, urgency);

            if matching.is_empty() {
                println!("No issues found matching these filters.");
                return Ok(());
            }

            for report in matching {
                let date = report
                    .created_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "Recent".to_string());
                println!(
                    "- {} [{} / {}] {} at {} on {} by {}{}",
                    report.id,
                    issues::status_label(report),
                    report.urgency_or_default(),
                    report.headline(),
                    report.location,
                    date,
                    report.user_email.as_deref().unwrap_or("Anonymous"),
                    if issues::can_fix(report) { "" } else { " (fixed)" }
                );
                println!("    {}", issues::truncate(&report.description, 150));
                if let Some(fix) = report.fix_description.as_deref() {
                    println!("    fix: {}", issues::truncate(fix, 150));
                }
            }
        }
        Commands::Profile { user } => {
            let profile = db::fetch_user(&pool, user)
                .await?
                .with_context(|| format!("user {user} not found"))?;
            let reports = db::count_reports_by_user(&pool, user).await?;
            let name = profile.name.as_deref().unwrap_or("User");
            let campus = match profile.campus_id.as_str() {
                "" => "unassigned",
                campus => campus,
            };

            println!("{} <{}>", name, profile.email);
            println!("Campus: {campus}");
            println!("Points: {}", profile.points);
            println!("Reports submitted: {reports}");
        }
        Commands::Submit {
            user,
            issue_type,
            location,
            description,
            urgency,
            title,
        } => {
            let draft = issues::NewReport {
                title,
                issue_type,
                location,
                description,
                urgency,
            };
            let valid = draft.validate().context("report rejected")?;
            let id = db::submit_report(&pool, user, valid).await?;
            println!("Report {id} submitted.");
        }
        Commands::Resolve {
            report,
            staff,
            description,
            image,
        } => {
            let resolution = db::resolve_report(
                &pool,
                db::ResolveRequest {
                    report_id: report,
                    staff_id: staff,
                    fix_description: description,
                    fix_image: image,
                },
            )
            .await
            .context("failed to resolve report")?;

            match resolution.award {
                Some(award) => println!(
                    "Report {} resolved; awarded {} points to {}.",
                    resolution.report_id, award.points, award.user_id
                ),
                None => println!("Report {} resolved; no reporter to award.", resolution.report_id),
            }
        }
        Commands::Notices {
            campus,
            category,
            search,
            limit,
        } => {
            let all = db::fetch_notices(&pool, &campus, limit).await?;
            let matching = notices::filter_notices(&all, category.as_deref(), search.as_deref());

            if matching.is_empty() {
                println!("No notices found.");
                return Ok(());
            }

            for notice in matching {
                let date = notice
                    .created_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "Recent".to_string());
                println!(
                    "- {}{} [{}] {} by {}",
                    if notice.is_urgent() { "(urgent) " } else { "" },
                    notice.title_or_default(),
                    notice.category_or_default(),
                    date,
                    notice.author_or_default()
                );
                println!("    {}", issues::truncate(notice.content_or_default(), 200));
            }
        }
        Commands::Report { campus, out } => {
            let reports = db::fetch_reports(&pool, &campus).await?;
            let users = db::fetch_campus_users(&pool, &campus, Some(3)).await?;
            let notices = db::fetch_notices(&pool, &campus, Some(3)).await?;
            let report = report::build_report(&campus, Utc::now(), &reports, &users, &notices);
            std::fs::write(&out, report)?;
            info!(campus = %campus, path = %out.display(), "campus report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
