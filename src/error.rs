use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("location must be at least {min} characters")]
    LocationTooShort { min: usize },

    #[error("description must be at least {min} characters")]
    DescriptionTooShort { min: usize },

    #[error("urgency must be one of low, medium, high (got `{0}`)")]
    InvalidUrgency(String),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("staff account {0} not found")]
    StaffNotFound(Uuid),

    #[error("account {0} is not staff or admin")]
    NotStaff(Uuid),

    #[error("report {0} not found")]
    ReportNotFound(Uuid),

    #[error("report {report_id} belongs to {report_campus}, not the staff campus {staff_campus}")]
    WrongCampus {
        report_id: Uuid,
        report_campus: String,
        staff_campus: String,
    },

    #[error("report {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("a fix description is required")]
    MissingFixDescription,

    #[error("a fix image is required")]
    MissingFixImage,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
