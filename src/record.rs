use itertools::Itertools;
use std::fmt;

/// Author substituted whenever no author element could be found.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Admission bounds, both exclusive.
pub const MIN_RATING: f64 = 3.0;
pub const MIN_RATING_COUNT: u64 = 100;

pub const LISTING_COLUMNS: [&str; 5] = ["title", "rating", "rating_count", "author", "link"];
pub const DISTRIBUTION_COLUMNS: [&str; 5] =
    ["rating_5", "rating_4", "rating_3", "rating_2", "rating_1"];

/// One row scraped from a listing page, before the admission filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub title: String,
    pub rating_value: f64,
    pub rating_count: u64,
    pub author: String,
    pub detail_link: Option<String>,
}

impl RawCandidate {
    pub fn is_admissible(&self) -> bool {
        self.rating_value > MIN_RATING && self.rating_count > MIN_RATING_COUNT
    }

    pub fn admit(self) -> Option<AcceptedRecord> {
        if self.is_admissible() {
            Some(AcceptedRecord(self))
        } else {
            None
        }
    }
}

/// A candidate that passed [`RawCandidate::admit`]. Can only be built through it.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRecord(RawCandidate);

impl AcceptedRecord {
    pub fn title(&self) -> &str {
        &self.0.title
    }

    pub fn rating_value(&self) -> f64 {
        self.0.rating_value
    }

    pub fn rating_count(&self) -> u64 {
        self.0.rating_count
    }

    pub fn author(&self) -> &str {
        &self.0.author
    }

    pub fn detail_link(&self) -> Option<&str> {
        self.0.detail_link.as_deref()
    }

    /// Merges detail-page fields. The detail author always replaces the
    /// listing author, including the "Unknown" sentinel.
    pub fn enrich(mut self, rating_distribution: RatingDistribution, author: String) -> EnrichedRecord {
        self.0.author = author;
        EnrichedRecord {
            record: self,
            rating_distribution,
        }
    }
}

/// Count of ratings per star level 1..=5. Every level is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDistribution([u64; 5]);

impl RatingDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns 0 for levels outside 1..=5.
    pub fn get(&self, stars: u8) -> u64 {
        match stars {
            1..=5 => self.0[usize::from(stars - 1)],
            _ => 0,
        }
    }

    /// Ignores levels outside 1..=5.
    pub fn set(&mut self, stars: u8, count: u64) {
        if let 1..=5 = stars {
            self.0[usize::from(stars - 1)] = count;
        }
    }

    /// Levels from 5 stars down to 1, the order the site renders them in.
    pub fn levels(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (1..=5u8).rev().map(|stars| (stars, self.get(stars)))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    record: AcceptedRecord,
    rating_distribution: RatingDistribution,
}

impl EnrichedRecord {
    pub fn record(&self) -> &AcceptedRecord {
        &self.record
    }

    pub fn rating_distribution(&self) -> &RatingDistribution {
        &self.rating_distribution
    }
}

/// What the collector accumulates: listing fields only, or listing plus detail fields.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectedRecord {
    Listed(AcceptedRecord),
    Enriched(EnrichedRecord),
}

impl CollectedRecord {
    pub fn accepted(&self) -> &AcceptedRecord {
        match self {
            CollectedRecord::Listed(r) => r,
            CollectedRecord::Enriched(r) => r.record(),
        }
    }

    pub fn title(&self) -> &str {
        self.accepted().title()
    }

    pub fn rating_distribution(&self) -> Option<&RatingDistribution> {
        match self {
            CollectedRecord::Listed(_) => None,
            CollectedRecord::Enriched(r) => Some(r.rating_distribution()),
        }
    }

    /// Cells in column order. Distribution cells are only produced when
    /// `with_distribution` is set; missing ones are written as 0.
    pub fn to_row(&self, with_distribution: bool) -> Vec<String> {
        let r = self.accepted();
        let mut row = vec![
            r.title().to_string(),
            r.rating_value().to_string(),
            r.rating_count().to_string(),
            r.author().to_string(),
            r.detail_link().unwrap_or_default().to_string(),
        ];
        if with_distribution {
            let distribution = self.rating_distribution().copied().unwrap_or_default();
            row.extend(distribution.levels().map(|(_, count)| count.to_string()));
        }
        row
    }
}

impl From<AcceptedRecord> for CollectedRecord {
    fn from(r: AcceptedRecord) -> Self {
        CollectedRecord::Listed(r)
    }
}

impl From<EnrichedRecord> for CollectedRecord {
    fn from(r: EnrichedRecord) -> Self {
        CollectedRecord::Enriched(r)
    }
}

impl fmt::Display for CollectedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.accepted();
        writeln!(f, "Title           : {}", r.title())?;
        writeln!(f, "Author          : {}", r.author())?;
        writeln!(
            f,
            "Rating          : {} ({} ratings)",
            r.rating_value(),
            r.rating_count()
        )?;
        if let Some(link) = r.detail_link() {
            writeln!(f, "Link            : {}", link)?;
        } else {
            writeln!(f, "Link            : None")?;
        }
        if let Some(d) = self.rating_distribution() {
            let levels = d
                .levels()
                .map(|(stars, count)| format!("{}*={}", stars, count))
                .join(", ");
            writeln!(f, "Distribution    : {}", levels)?;
        }
        Ok(())
    }
}

/// Drops every record whose title was already seen, keeping the first one.
pub fn dedup_by_title(records: Vec<CollectedRecord>) -> Vec<CollectedRecord> {
    records
        .into_iter()
        .unique_by(|r| r.title().to_string())
        .collect()
}

/// Final, title-unique table of a run. Built once from the whole accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    records: Vec<CollectedRecord>,
    enriched: bool,
}

impl ResultTable {
    pub fn build(records: Vec<CollectedRecord>, enriched: bool) -> Self {
        Self {
            records: dedup_by_title(records),
            enriched,
        }
    }

    pub fn records(&self) -> &[CollectedRecord] {
        &self.records
    }

    pub fn is_enriched(&self) -> bool {
        self.enriched
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = LISTING_COLUMNS.to_vec();
        if self.enriched {
            header.extend(DISTRIBUTION_COLUMNS);
        }
        header
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.records.iter().map(|r| r.to_row(self.enriched))
    }
}

#[cfg(test)]
pub(crate) fn candidate(title: &str, rating_value: f64, rating_count: u64) -> RawCandidate {
    RawCandidate {
        title: title.to_string(),
        rating_value,
        rating_count,
        author: UNKNOWN_AUTHOR.to_string(),
        detail_link: None,
    }
}
