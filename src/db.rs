use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::award;
use crate::error::ResolveError;
use crate::issues::ValidReport;
use crate::models::{parse_lenient, Campus, Notice, Report, Role, Status, Urgency, User};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let campuses = vec![
        ("demo-campus", "Demo Campus", 950_i64),
        ("north-campus", "North Campus", 720),
        ("riverside-campus", "Riverside Campus", 480),
    ];

    for (id, name, score) in campuses {
        sqlx::query(
            r#"
            INSERT INTO verdex.campuses (id, name, score)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, score = EXCLUDED.score
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(score)
        .execute(pool)
        .await?;
    }

    let users = vec![
        (
            Uuid::parse_str("6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e01")?,
            "John Student",
            "john@demo.com",
            "student",
            150_i64,
        ),
        (
            Uuid::parse_str("6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e02")?,
            "Jane Staff",
            "jane@demo.com",
            "staff",
            200,
        ),
        (
            Uuid::parse_str("6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e03")?,
            "Admin User",
            "admin@demo.com",
            "admin",
            300,
        ),
        (
            Uuid::parse_str("6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e04")?,
            "Alice Student",
            "alice@demo.com",
            "student",
            120,
        ),
        (
            Uuid::parse_str("6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e05")?,
            "Bob Student",
            "bob@demo.com",
            "student",
            180,
        ),
    ];

    for (id, name, email, role, points) in users {
        sqlx::query(
            r#"
            INSERT INTO verdex.users (id, name, email, role, campus_id, points)
            VALUES ($1, $2, $3, $4, 'demo-campus', $5)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, role = EXCLUDED.role, campus_id = EXCLUDED.campus_id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(points)
        .execute(pool)
        .await?;
    }

    let reports = vec![
        (
            "seed-report-001",
            "john@demo.com",
            "Broken Chair in Library",
            "furniture",
            "Main Library, 2nd Floor",
            "One of the chairs in the main library has a broken leg and needs immediate repair.",
            "medium",
            "open",
        ),
        (
            "seed-report-002",
            "alice@demo.com",
            "WiFi Not Working in Cafeteria",
            "network",
            "Student Cafeteria",
            "Students are unable to connect to WiFi in the cafeteria area. This is affecting study sessions.",
            "high",
            "in-progress",
        ),
        (
            "seed-report-003",
            "bob@demo.com",
            "Projector Not Working in Room 301",
            "equipment",
            "Academic Block, Room 301",
            "The projector in Room 301 is not displaying properly. Need technical support.",
            "medium",
            "resolved",
        ),
    ];

    for (source_key, email, title, issue_type, location, description, urgency, status) in reports {
        let user_id: Uuid = sqlx::query("SELECT id FROM verdex.users WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO verdex.reports
            (id, user_id, user_email, title, issue_type, location, description,
             urgency, status, campus_id, created_at, updated_at, fixed_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'demo-campus', now(), now(),
                    CASE WHEN $9 = 'resolved' THEN now() END, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(email)
        .bind(title)
        .bind(issue_type)
        .bind(location)
        .bind(description)
        .bind(urgency)
        .bind(status)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let notices = vec![
        (
            "seed-notice-001",
            "Campus WiFi Maintenance",
            "IT department will be performing maintenance on campus WiFi this weekend. Services may be intermittent.",
            "general",
            "high",
            "Admin User",
        ),
        (
            "seed-notice-002",
            "Library Hours Extended",
            "Library will remain open until 11 PM during exam week to accommodate students.",
            "academic",
            "normal",
            "Admin User",
        ),
        (
            "seed-notice-003",
            "New Campus Cafe Opening",
            "A new cafe will be opening next month in the student center with extended hours.",
            "events",
            "normal",
            "Jane Staff",
        ),
    ];

    for (source_key, title, content, category, urgency, author) in notices {
        sqlx::query(
            r#"
            INSERT INTO verdex.notices
            (id, campus_id, title, content, category, urgency, author, created_at, source_key)
            VALUES ($1, 'demo-campus', $2, $3, $4, $5, $6, now(), $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(content)
        .bind(category)
        .bind(urgency)
        .bind(author)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        campus_id: String,
        issue_type: String,
        location: String,
        description: String,
        urgency: Option<String>,
        status: Option<String>,
        created_at: Option<DateTime<Utc>>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let user_id: Uuid = sqlx::query(
            r#"
            INSERT INTO verdex.users (id, name, email, role, campus_id)
            VALUES ($1, $2, $3, 'student', $4)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, campus_id = EXCLUDED.campus_id
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(&row.campus_id)
        .fetch_one(pool)
        .await?
        .get("id");

        let status = row
            .status
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| Status::Open.as_str().to_string());
        if status.parse::<Status>().is_err() {
            warn!(email = %row.email, %status, "importing report with unrecognized status");
        }
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO verdex.reports
            (id, user_id, user_email, issue_type, location, description,
             urgency, status, campus_id, created_at, updated_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, now()), now(), $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&row.email)
        .bind(&row.issue_type)
        .bind(&row.location)
        .bind(&row.description)
        .bind(&row.urgency)
        .bind(&status)
        .bind(&row.campus_id)
        .bind(row.created_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: parse_lenient(row.get::<Option<String>, _>("role").as_deref()),
        campus_id: row.get("campus_id"),
        points: row.get("points"),
    }
}

fn report_from_row(row: &PgRow) -> Report {
    Report {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_email: row.get("user_email"),
        title: row.get("title"),
        issue_type: row.get("issue_type"),
        location: row.get("location"),
        description: row.get("description"),
        urgency: parse_lenient(row.get::<Option<String>, _>("urgency").as_deref()),
        status: parse_lenient(row.get::<Option<String>, _>("status").as_deref()),
        campus_id: row.get("campus_id"),
        created_at: row.get("created_at"),
        fixed_at: row.get("fixed_at"),
        fixed_by: row.get("fixed_by"),
        fix_description: row.get("fix_description"),
    }
}

const USER_COLUMNS: &str = "id, name, email, role, campus_id, points";
const REPORT_COLUMNS: &str = "id, user_id, user_email, title, issue_type, location, description, \
     urgency, status, campus_id, created_at, fixed_at, fixed_by, fix_description";

pub async fn fetch_user(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM verdex.users WHERE id = $1");
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(user_from_row))
}

/// Users on a campus, highest points first. Ties break by name then id.
pub async fn fetch_campus_users(
    pool: &PgPool,
    campus_id: &str,
    limit: Option<u32>,
) -> anyhow::Result<Vec<User>> {
    let query = format!(
        "SELECT {USER_COLUMNS} FROM verdex.users \
         WHERE campus_id = $1 \
         ORDER BY points DESC, name ASC NULLS LAST, id ASC \
         LIMIT $2"
    );
    let rows = sqlx::query(&query)
        .bind(campus_id)
        .bind(limit.map(i64::from))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(user_from_row).collect())
}

pub async fn fetch_campuses(pool: &PgPool, limit: Option<u32>) -> anyhow::Result<Vec<Campus>> {
    let rows = sqlx::query(
        "SELECT id, name, score FROM verdex.campuses ORDER BY score DESC, id ASC LIMIT $1",
    )
    .bind(limit.map(i64::from))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Campus {
            id: row.get("id"),
            name: row.get("name"),
            score: row.get("score"),
        })
        .collect())
}

/// Reports on a campus, newest first; undated reports sort last.
pub async fn fetch_reports(pool: &PgPool, campus_id: &str) -> anyhow::Result<Vec<Report>> {
    let query = format!(
        "SELECT {REPORT_COLUMNS} FROM verdex.reports \
         WHERE campus_id = $1 \
         ORDER BY created_at DESC NULLS LAST"
    );
    let rows = sqlx::query(&query).bind(campus_id).fetch_all(pool).await?;
    Ok(rows.iter().map(report_from_row).collect())
}

pub async fn count_reports_by_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS total FROM verdex.reports WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?
        .get("total");
    Ok(count)
}

pub async fn fetch_notices(
    pool: &PgPool,
    campus_id: &str,
    limit: Option<u32>,
) -> anyhow::Result<Vec<Notice>> {
    let rows = sqlx::query(
        "SELECT title, content, category, urgency, author, created_at \
         FROM verdex.notices \
         WHERE campus_id = $1 \
         ORDER BY created_at DESC NULLS LAST \
         LIMIT $2",
    )
    .bind(campus_id)
    .bind(limit.map(i64::from))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Notice {
            title: row.get("title"),
            content: row.get("content"),
            category: row.get("category"),
            urgency: row.get("urgency"),
            author: row.get("author"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Files a report under the reporter's own campus.
pub async fn submit_report(pool: &PgPool, user_id: Uuid, report: ValidReport) -> anyhow::Result<Uuid> {
    let reporter = fetch_user(pool, user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {user_id} not found"))?;
    if reporter.campus_id.is_empty() {
        anyhow::bail!("user {user_id} has no campus assigned");
    }
    let campus_id = reporter.campus_id.as_str();

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO verdex.reports
        (id, user_id, user_email, title, issue_type, location, description,
         urgency, status, campus_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now())
        "#,
    )
    .bind(id)
    .bind(reporter.id)
    .bind(&reporter.email)
    .bind(&report.title)
    .bind(&report.issue_type)
    .bind(&report.location)
    .bind(&report.description)
    .bind(report.urgency.as_str())
    .bind(Status::Open.as_str())
    .bind(campus_id)
    .execute(pool)
    .await?;

    info!(%id, %user_id, campus_id, "report submitted");
    Ok(id)
}

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub report_id: Uuid,
    pub staff_id: Uuid,
    pub fix_description: String,
    pub fix_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    pub user_id: Uuid,
    pub points: i64,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub report_id: Uuid,
    pub award: Option<Award>,
}

/// Marks a report resolved and credits its reporter in one transaction.
///
/// The report row is locked for the duration, so a report is awarded at most
/// once even when two staff members resolve it concurrently. Dropping the
/// transaction on any error rolls back both writes.
pub async fn resolve_report(pool: &PgPool, request: ResolveRequest) -> Result<Resolution, ResolveError> {
    let fix_description = request.fix_description.trim();
    if fix_description.is_empty() {
        return Err(ResolveError::MissingFixDescription);
    }
    let fix_image = request.fix_image.trim();
    if fix_image.is_empty() {
        return Err(ResolveError::MissingFixImage);
    }

    let mut tx = pool.begin().await?;

    let staff_query = format!("SELECT {USER_COLUMNS} FROM verdex.users WHERE id = $1");
    let staff = sqlx::query(&staff_query)
        .bind(request.staff_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| user_from_row(&row))
        .ok_or(ResolveError::StaffNotFound(request.staff_id))?;
    if !staff.role.is_some_and(Role::can_resolve) {
        return Err(ResolveError::NotStaff(request.staff_id));
    }

    let report_query = format!("SELECT {REPORT_COLUMNS} FROM verdex.reports WHERE id = $1 FOR UPDATE");
    let report = sqlx::query(&report_query)
        .bind(request.report_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| report_from_row(&row))
        .ok_or(ResolveError::ReportNotFound(request.report_id))?;

    if report.campus_id != staff.campus_id {
        return Err(ResolveError::WrongCampus {
            report_id: report.id,
            report_campus: report.campus_id,
            staff_campus: staff.campus_id,
        });
    }
    if report.status == Some(Status::Resolved) {
        return Err(ResolveError::AlreadyResolved(report.id));
    }

    sqlx::query(
        r#"
        UPDATE verdex.reports
        SET status = $2, fixed_by = $3, fixed_at = now(), fix_description = $4,
            fix_image = $5, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(request.report_id)
    .bind(Status::Resolved.as_str())
    .bind(request.staff_id)
    .bind(fix_description)
    .bind(fix_image)
    .execute(&mut *tx)
    .await?;

    let mut award = None;
    if let Some(user_id) = report.user_id {
        let points = award::award_for(report.urgency.map(Urgency::as_str));
        let updated = sqlx::query(
            "UPDATE verdex.users SET points = points + $1, updated_at = now() WHERE id = $2",
        )
        .bind(points)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() > 0 {
            award = Some(Award { user_id, points });
        } else {
            warn!(report_id = %request.report_id, %user_id, "reporter no longer exists, no points awarded");
        }
    } else {
        debug!(report_id = %request.report_id, "report has no reporter, skipping award");
    }

    tx.commit().await?;

    info!(
        report_id = %request.report_id,
        staff_id = %request.staff_id,
        awarded = award.as_ref().map_or(0, |a| a.points),
        "report resolved"
    );

    Ok(Resolution {
        report_id: request.report_id,
        award,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOHN: &str = "6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e01";
    const JANE_STAFF: &str = "6f1c2a0e-3d4b-4c1a-9a51-0f6a2d3b7e02";

    fn request(report_id: Uuid, staff_id: Uuid) -> ResolveRequest {
        ResolveRequest {
            report_id,
            staff_id,
            fix_description: "Replaced the broken chair leg".to_string(),
            fix_image: "fixes/chair-301.jpg".to_string(),
        }
    }

    async fn seeded_report(pool: &PgPool, source_key: &str) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query("SELECT id FROM verdex.reports WHERE source_key = $1")
            .bind(source_key)
            .fetch_one(pool)
            .await?
            .get("id");
        Ok(id)
    }

    async fn points_of(pool: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
        Ok(fetch_user(pool, user_id).await?.map_or(0, |user| user.points))
    }

    async fn status_of(pool: &PgPool, report_id: Uuid) -> anyhow::Result<Option<String>> {
        let status: Option<String> = sqlx::query("SELECT status FROM verdex.reports WHERE id = $1")
            .bind(report_id)
            .fetch_one(pool)
            .await?
            .get("status");
        Ok(status)
    }

    #[tokio::test]
    async fn blank_fix_details_are_rejected_before_touching_the_store() {
        let pool = PgPool::connect_lazy("postgres://verdex@localhost:1/unreachable").unwrap();

        let mut blank_description = request(Uuid::new_v4(), Uuid::new_v4());
        blank_description.fix_description = "   ".to_string();
        assert!(matches!(
            resolve_report(&pool, blank_description).await,
            Err(ResolveError::MissingFixDescription)
        ));

        let mut blank_image = request(Uuid::new_v4(), Uuid::new_v4());
        blank_image.fix_image = String::new();
        assert!(matches!(
            resolve_report(&pool, blank_image).await,
            Err(ResolveError::MissingFixImage)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn resolving_awards_the_reporter_exactly_once(pool: PgPool) -> anyhow::Result<()> {
        seed(&pool).await?;
        let john = Uuid::parse_str(JOHN)?;
        let staff = Uuid::parse_str(JANE_STAFF)?;
        let report_id = seeded_report(&pool, "seed-report-001").await?;
        let before = points_of(&pool, john).await?;

        let (first, second) = tokio::join!(
            resolve_report(&pool, request(report_id, staff)),
            resolve_report(&pool, request(report_id, staff)),
        );
        let outcomes = [first, second];
        let awarded: Vec<&Award> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok().and_then(|r| r.award.as_ref()))
            .collect();
        assert_eq!(awarded, vec![&Award { user_id: john, points: 10 }]);
        assert!(outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(ResolveError::AlreadyResolved(id)) if *id == report_id)));

        assert_eq!(points_of(&pool, john).await?, before + 10);
        assert_eq!(status_of(&pool, report_id).await?.as_deref(), Some("resolved"));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn students_cannot_resolve(pool: PgPool) -> anyhow::Result<()> {
        seed(&pool).await?;
        let john = Uuid::parse_str(JOHN)?;
        let report_id = seeded_report(&pool, "seed-report-001").await?;
        let before = points_of(&pool, john).await?;

        let outcome = resolve_report(&pool, request(report_id, john)).await;
        assert!(matches!(outcome, Err(ResolveError::NotStaff(id)) if id == john));
        assert_eq!(status_of(&pool, report_id).await?.as_deref(), Some("open"));
        assert_eq!(points_of(&pool, john).await?, before);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn staff_cannot_resolve_another_campus(pool: PgPool) -> anyhow::Result<()> {
        seed(&pool).await?;
        let john = Uuid::parse_str(JOHN)?;
        let north_staff = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO verdex.users (id, name, email, role, campus_id) \
             VALUES ($1, 'North Staff', 'staff@north.edu', 'staff', 'north-campus')",
        )
        .bind(north_staff)
        .execute(&pool)
        .await?;
        let report_id = seeded_report(&pool, "seed-report-001").await?;
        let before = points_of(&pool, john).await?;

        let outcome = resolve_report(&pool, request(report_id, north_staff)).await;
        assert!(matches!(
            outcome,
            Err(ResolveError::WrongCampus { ref report_campus, ref staff_campus, .. })
                if report_campus == "demo-campus" && staff_campus == "north-campus"
        ));
        assert_eq!(status_of(&pool, report_id).await?.as_deref(), Some("open"));
        assert_eq!(points_of(&pool, john).await?, before);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a Postgres server"]
    async fn submitted_reports_use_the_reporter_campus(pool: PgPool) -> anyhow::Result<()> {
        seed(&pool).await?;
        let john = Uuid::parse_str(JOHN)?;
        let draft = crate::issues::NewReport {
            title: None,
            issue_type: "plumbing".to_string(),
            location: "Hostel 2".to_string(),
            description: "Leaking tap on the second floor".to_string(),
            urgency: "high".to_string(),
        };

        let id = submit_report(&pool, john, draft.validate()?).await?;
        let campus: String = sqlx::query("SELECT campus_id FROM verdex.reports WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await?
            .get("campus_id");
        assert_eq!(campus, "demo-campus");
        Ok(())
    }
}
