//! Goodreads list pages (`/list/show/<id>`) and book pages (`/book/show/<id>`).

use crate::config::Source;
use crate::profile::{DetailProfile, ListingProfile, SiteProfile};

pub const ORIGIN: &str = "https://www.goodreads.com";

pub fn profile() -> SiteProfile {
    SiteProfile {
        origin: ORIGIN.to_string(),
        listing: ListingProfile {
            item: r#"tr[itemtype="http://schema.org/Book"]"#.to_string(),
            title: "a.bookTitle".to_string(),
            rating_text: "span.minirating".to_string(),
            author: "a.authorName".to_string(),
            rating_value_pattern: r"(\d+\.\d+)".to_string(),
            rating_count_pattern: r"(\d+(?:,\d+)*) ratings".to_string(),
            thousands_separator: ',',
        },
        detail: DetailProfile {
            distribution_item: "div.ratingGraph".to_string(),
            distribution_count: Some("span.value".to_string()),
            author: "a.authorName".to_string(),
            thousands_separator: ',',
        },
    }
}

pub fn default_sources() -> Vec<Source> {
    vec![Source::new(
        format!("{}/list/show/146629", ORIGIN),
        "Best Fantasy of the 2020s",
    )]
}
