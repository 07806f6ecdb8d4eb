//! Where each field lives on a site's listing and detail pages.
//!
//! Everything here is plain data. [`crate::extract::ListingExtractor`] and
//! [`crate::extract::DetailExtractor`] compile it into selectors and regexes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Scheme and host relative links are resolved against.
    pub origin: String,
    pub listing: ListingProfile,
    pub detail: DetailProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingProfile {
    /// One match per book row.
    pub item: String,
    /// Title anchor, also carries the detail `href`.
    pub title: String,
    /// Element whose text holds both the average rating and the rating count.
    pub rating_text: String,
    pub author: String,
    /// First capture group is the average rating.
    pub rating_value_pattern: String,
    /// First capture group is the rating count, thousands separators allowed.
    pub rating_count_pattern: String,
    pub thousands_separator: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailProfile {
    /// Distribution rows, rendered from 5 stars down to 1.
    pub distribution_item: String,
    /// Count element nested in a distribution row. When absent the row's own
    /// text is the count.
    pub distribution_count: Option<String>,
    pub author: String,
    pub thousands_separator: char,
}

impl Default for SiteProfile {
    fn default() -> Self {
        crate::goodreads::profile()
    }
}

impl Default for ListingProfile {
    fn default() -> Self {
        crate::goodreads::profile().listing
    }
}

impl Default for DetailProfile {
    fn default() -> Self {
        crate::goodreads::profile().detail
    }
}
