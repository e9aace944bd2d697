use crate::models::Notice;

pub fn filter_notices<'a>(
    notices: &'a [Notice],
    category: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Notice> {
    let needle = search
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty());

    notices
        .iter()
        .filter(|notice| category.map_or(true, |wanted| notice.category_or_default() == wanted))
        .filter(|notice| match &needle {
            Some(needle) => [&notice.title, &notice.content, &notice.author]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(title: &str, category: Option<&str>, author: Option<&str>) -> Notice {
        Notice {
            title: Some(title.to_string()),
            content: Some("Details to follow.".to_string()),
            category: category.map(str::to_string),
            urgency: None,
            author: author.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn filters_by_category_with_general_default() {
        let notices = vec![
            notice("Mid-Term Examination Schedule", Some("academic"), None),
            notice("Annual Cultural Festival", Some("events"), None),
            notice("Water supply interruption", None, None),
        ];

        assert_eq!(filter_notices(&notices, Some("academic"), None).len(), 1);
        assert_eq!(filter_notices(&notices, Some("general"), None).len(), 1);
        assert_eq!(filter_notices(&notices, None, None).len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let notices = vec![
            notice("Library Hours Extended", Some("academic"), Some("Admin User")),
            notice("Campus WiFi Maintenance", Some("general"), Some("Jane Staff")),
        ];

        let hits = filter_notices(&notices, None, Some("LIBRARY"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title_or_default(), "Library Hours Extended");

        assert_eq!(filter_notices(&notices, None, Some("jane")).len(), 1);
        assert_eq!(filter_notices(&notices, None, Some("   ")).len(), 2);
        assert!(filter_notices(&notices, Some("events"), Some("wifi")).is_empty());
    }
}
