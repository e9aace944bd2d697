use crate::models::{parse_lenient, Urgency};

impl Urgency {
    pub fn award_points(self) -> i64 {
        match self {
            Urgency::Low => 5,
            Urgency::Medium => 10,
            Urgency::High => 20,
        }
    }
}

/// Points credited to a reporter when their issue is resolved.
pub fn award_for(urgency: Option<&str>) -> i64 {
    parse_lenient::<Urgency>(urgency)
        .unwrap_or_default()
        .award_points()
}
