use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in-progress",
            Status::Resolved => "resolved",
        }
    }
}

impl FromStr for Status {
    type Err = UnknownLiteral;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Status::Open),
            "in-progress" => Ok(Status::InProgress),
            "resolved" => Ok(Status::Resolved),
            other => Err(UnknownLiteral(other.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl FromStr for Urgency {
    type Err = UnknownLiteral;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(UnknownLiteral(other.to_string())),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
    Admin,
}

impl Role {
    pub fn can_resolve(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = UnknownLiteral;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownLiteral(other.to_string())),
        }
    }
}

/// Which numeric column a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Student points, ranked within a campus.
    Points,
    /// Campus score, ranked globally.
    Score,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized value `{0}`")]
pub struct UnknownLiteral(pub String);

/// Parses an optional text column, mapping unrecognized literals to `None`.
pub fn parse_lenient<T: FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|raw| raw.trim().parse().ok())
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: Option<Role>,
    pub campus_id: String,
    pub points: i64,
}

#[derive(Debug, Clone)]
pub struct Campus {
    pub id: String,
    pub name: Option<String>,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub title: Option<String>,
    pub issue_type: String,
    pub location: String,
    pub description: String,
    pub urgency: Option<Urgency>,
    pub status: Option<Status>,
    pub campus_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub fixed_at: Option<DateTime<Utc>>,
    pub fixed_by: Option<Uuid>,
    pub fix_description: Option<String>,
}

impl Report {
    pub fn headline(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(if self.issue_type.is_empty() {
                "Issue"
            } else {
                self.issue_type.as_str()
            })
    }

    pub fn urgency_or_default(&self) -> Urgency {
        self.urgency.unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Notice {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Campus Notice")
    }

    pub fn content_or_default(&self) -> &str {
        self.content.as_deref().unwrap_or("No description available.")
    }

    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("general")
    }

    pub fn author_or_default(&self) -> &str {
        self.author.as_deref().unwrap_or("Administration")
    }

    pub fn is_urgent(&self) -> bool {
        self.urgency.as_deref() == Some("high")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub display_name: String,
    pub metric_value: i64,
}

impl RankEntry {
    pub fn placeholder() -> Self {
        RankEntry {
            display_name: "---".to_string(),
            metric_value: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub rank: usize,
    pub entry: RankEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedView {
    pub top: [RankEntry; 3],
    pub rest: Vec<RankedRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.open + self.in_progress + self.resolved
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StaffSummary {
    pub assigned: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed_today: usize,
    pub resolved_by_me: usize,
}
