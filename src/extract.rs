use crate::profile::{DetailProfile, ListingProfile};
use crate::record::{AcceptedRecord, RatingDistribution, RawCandidate, UNKNOWN_AUTHOR};
use crate::{utils, CollectorError};
use lazy_regex::{regex, Regex};
use scraper::{ElementRef, Html, Selector};

fn selector(s: &str) -> Result<Selector, CollectorError> {
    Selector::parse(s).map_err(|e| CollectorError::InvalidSelector {
        selector: s.to_string(),
        message: format!("{:?}", e),
    })
}

fn pattern(p: &str) -> Result<Regex, CollectorError> {
    Regex::new(p).map_err(|e| CollectorError::InvalidPattern {
        pattern: p.to_string(),
        message: e.to_string(),
    })
}

/// All text below `el`, outer whitespace trimmed.
fn trimmed_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// All text below `el`, whitespace runs collapsed, trimmed.
fn element_text(el: ElementRef) -> String {
    let text = el.text().collect::<String>();
    regex!(r"\s+")
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

/// Parses a count such as `10,000`. Anything but digits after removing the
/// separator is rejected.
pub(crate) fn parse_count(text: &str, separator: char) -> Option<u64> {
    let digits = text.trim().replace(separator, "");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Pulls candidates out of a listing page and applies the admission filter
/// in the same pass.
#[derive(Debug)]
pub struct ListingExtractor {
    item: Selector,
    title: Selector,
    rating_text: Selector,
    author: Selector,
    rating_value: Regex,
    rating_count: Regex,
    separator: char,
    origin: String,
}

impl ListingExtractor {
    pub fn new(profile: &ListingProfile, origin: &str) -> Result<Self, CollectorError> {
        Ok(Self {
            item: selector(&profile.item)?,
            title: selector(&profile.title)?,
            rating_text: selector(&profile.rating_text)?,
            author: selector(&profile.author)?,
            rating_value: pattern(&profile.rating_value_pattern)?,
            rating_count: pattern(&profile.rating_count_pattern)?,
            separator: profile.thousands_separator,
            origin: origin.to_string(),
        })
    }

    /// Accepted records in document order. With `limit`, only the first
    /// `limit` rows are looked at, whether they pass the filter or not.
    pub fn extract_candidates(&self, doc: &Html, limit: Option<usize>) -> Vec<AcceptedRecord> {
        doc.select(&self.item)
            .take(limit.unwrap_or(usize::MAX))
            .filter_map(|row| self.parse_row(row))
            .filter_map(RawCandidate::admit)
            .collect()
    }

    /// `None` when the title or either rating number is missing.
    pub fn parse_row(&self, row: ElementRef) -> Option<RawCandidate> {
        let title_el = row.select(&self.title).next()?;
        let title = trimmed_text(title_el);
        if title.is_empty() {
            return None;
        }

        let rating_text = row.select(&self.rating_text).next().map(element_text)?;
        let (rating_value, rating_count) = self.parse_rating_text(&rating_text)?;

        let author = row
            .select(&self.author)
            .next()
            .map(element_text)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let detail_link = title_el
            .value()
            .attr("href")
            .and_then(|href| utils::resolve_link(&self.origin, href));

        Some(RawCandidate {
            title,
            rating_value,
            rating_count,
            author,
            detail_link,
        })
    }

    /// Average rating and rating count from text like
    /// `4.00 avg rating — 10,000 ratings`.
    pub fn parse_rating_text(&self, text: &str) -> Option<(f64, u64)> {
        let value = self
            .rating_value
            .captures(text)?
            .get(1)?
            .as_str()
            .parse::<f64>()
            .ok()?;
        let count = parse_count(self.rating_count.captures(text)?.get(1)?.as_str(), self.separator)?;
        Some((value, count))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub rating_distribution: RatingDistribution,
    pub author: Option<String>,
}

#[derive(Debug)]
pub struct DetailExtractor {
    item: Selector,
    count: Option<Selector>,
    author: Selector,
    separator: char,
}

impl DetailExtractor {
    pub fn new(profile: &DetailProfile) -> Result<Self, CollectorError> {
        Ok(Self {
            item: selector(&profile.distribution_item)?,
            count: profile
                .distribution_count
                .as_deref()
                .map(selector)
                .transpose()?,
            author: selector(&profile.author)?,
            separator: profile.thousands_separator,
        })
    }

    pub fn parse(&self, doc: &Html) -> DetailFields {
        let mut rating_distribution = RatingDistribution::new();
        for (i, row) in doc.select(&self.item).take(5).enumerate() {
            let stars = (5 - i) as u8;
            let text = match &self.count {
                Some(count) => row.select(count).next().map(element_text),
                None => Some(element_text(row)),
            };
            // Unparseable rows keep their 0.
            if let Some(count) = text.and_then(|t| parse_count(&t, self.separator)) {
                rating_distribution.set(stars, count);
            }
        }

        let author = doc
            .select(&self.author)
            .next()
            .map(element_text)
            .filter(|a| !a.is_empty());

        DetailFields {
            rating_distribution,
            author,
        }
    }
}
