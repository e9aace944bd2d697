use crate::models::{Campus, Metric, RankEntry, RankedRow, RankedView, User};

pub const TOP_SIZE: usize = 3;

/// A record that can appear on a leaderboard.
pub trait Rankable {
    fn display_name(&self) -> Option<&str>;
    fn metric(&self, metric: Metric) -> Option<i64>;
}

impl Rankable for User {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn metric(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Points => Some(self.points),
            Metric::Score => None,
        }
    }
}

impl Rankable for Campus {
    fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(Some(self.id.as_str()))
    }

    fn metric(&self, metric: Metric) -> Option<i64> {
        match metric {
            Metric::Score => Some(self.score),
            Metric::Points => None,
        }
    }
}

/// Projects records into rank entries, keeping their order.
///
/// Missing names become `placeholder`; missing or negative metrics become 0.
pub fn rank_entries<T: Rankable>(records: &[T], metric: Metric, placeholder: &str) -> Vec<RankEntry> {
    records
        .iter()
        .map(|record| RankEntry {
            display_name: record
                .display_name()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(placeholder)
                .to_string(),
            metric_value: record.metric(metric).unwrap_or(0).max(0),
        })
        .collect()
}

/// Splits an ordered sequence into a padded podium and the remaining rows.
///
/// Input must already be sorted descending by metric; order is taken as-is.
pub fn build_ranked_view(entries: &[RankEntry]) -> RankedView {
    let mut podium = entries.iter().take(TOP_SIZE).cloned();
    let top = std::array::from_fn(|_| podium.next().unwrap_or_else(RankEntry::placeholder));

    let rest = entries
        .iter()
        .skip(TOP_SIZE)
        .enumerate()
        .map(|(index, entry)| RankedRow {
            rank: index + TOP_SIZE + 1,
            entry: entry.clone(),
        })
        .collect();

    RankedView { top, rest }
}

pub fn is_ranked(entries: &[RankEntry]) -> bool {
    entries
        .windows(2)
        .all(|pair| pair[0].metric_value >= pair[1].metric_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(name: &str, value: i64) -> RankEntry {
        RankEntry {
            display_name: name.to_string(),
            metric_value: value,
        }
    }

    fn student(name: Option<&str>, points: i64) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            email: "student@verdex.edu".to_string(),
            role: None,
            campus_id: "demo-campus".to_string(),
            points,
        }
    }

    #[test]
    fn top_takes_first_three_in_order() {
        let entries = vec![
            entry("Bob", 180),
            entry("John", 150),
            entry("Alice", 120),
            entry("Dana", 90),
            entry("Eli", 40),
        ];
        let view = build_ranked_view(&entries);

        assert_eq!(view.top.to_vec(), entries[..3].to_vec());
        let rest: Vec<RankEntry> = view.rest.iter().map(|row| row.entry.clone()).collect();
        assert_eq!(rest, entries[3..].to_vec());
        assert_eq!(view.rest[0].rank, 4);
        assert_eq!(view.rest[1].rank, 5);
    }

    #[test]
    fn short_input_is_padded_with_placeholders() {
        let entries = vec![entry("Bob", 180)];
        let view = build_ranked_view(&entries);

        assert_eq!(view.top[0], entry("Bob", 180));
        assert_eq!(view.top[1], RankEntry::placeholder());
        assert_eq!(view.top[2], RankEntry::placeholder());
        assert!(view.rest.is_empty());
    }

    #[test]
    fn empty_input_is_all_placeholders() {
        let view = build_ranked_view(&[]);
        assert!(view.top.iter().all(|slot| *slot == RankEntry::placeholder()));
        assert!(view.rest.is_empty());
    }

    #[test]
    fn building_twice_gives_the_same_view() {
        let entries = vec![entry("A", 3), entry("B", 2), entry("C", 1), entry("D", 0)];
        assert_eq!(build_ranked_view(&entries), build_ranked_view(&entries));
    }

    #[test]
    fn unsorted_input_keeps_insertion_order() {
        let entries = vec![entry("Low", 1), entry("High", 50)];
        let view = build_ranked_view(&entries);
        assert_eq!(view.top[0].display_name, "Low");
        assert!(!is_ranked(&entries));
    }

    #[test]
    fn projection_defaults_missing_fields() {
        let users = vec![student(Some("John Student"), 150), student(None, -4)];
        let entries = rank_entries(&users, Metric::Points, "Anonymous");

        assert_eq!(entries[0], entry("John Student", 150));
        assert_eq!(entries[1], entry("Anonymous", 0));
    }

    #[test]
    fn campuses_rank_by_score_and_fall_back_to_id() {
        let campuses = vec![
            Campus {
                id: "north".to_string(),
                name: Some("North Campus".to_string()),
                score: 420,
            },
            Campus {
                id: "south".to_string(),
                name: None,
                score: 310,
            },
        ];
        let entries = rank_entries(&campuses, Metric::Score, "---");
        assert_eq!(entries, vec![entry("North Campus", 420), entry("south", 310)]);

        let wrong_metric = rank_entries(&campuses, Metric::Points, "---");
        assert!(wrong_metric.iter().all(|e| e.metric_value == 0));
    }
}
