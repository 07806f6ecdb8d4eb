use scraper::Html;
use tracing::{debug, info, warn};

pub mod config;
pub mod data;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod goodreads;
pub mod profile;
pub mod record;

mod error;
mod utils;

pub use config::{Pagination, RunConfig, Source};
pub use error::{CollectorError, FetchError};
pub use fetch::{Page, DEFAULT_USER_AGENT};
pub use record::{
    AcceptedRecord, CollectedRecord, EnrichedRecord, RatingDistribution, RawCandidate,
    ResultTable,
};

use extract::{DetailExtractor, ListingExtractor};
use profile::SiteProfile;
use record::UNKNOWN_AUTHOR;
use std::time::Duration;

/// Page fetcher. Returns the page whatever its status; only transport
/// problems are errors.
#[async_trait::async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;
}

/// Destination of the final table.
#[async_trait::async_trait]
pub trait TableSink {
    async fn write(&self, table: &ResultTable) -> Result<(), CollectorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectOptions {
    pub enrich_details: bool,
    pub pagination: Pagination,
    /// Pause between two listing pages of one source.
    pub request_delay: Duration,
    pub verify_sources: bool,
}

impl From<&RunConfig> for CollectOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            enrich_details: config.enrich_details,
            pagination: config.pagination,
            request_delay: config.request_delay(),
            verify_sources: config.verify_sources,
        }
    }
}

pub struct Collector<F> {
    fetcher: F,
    listing: ListingExtractor,
    detail: DetailExtractor,
    options: CollectOptions,
}

impl<F> Collector<F>
where
    F: Fetcher + Sync,
{
    pub fn new(
        fetcher: F,
        profile: &SiteProfile,
        options: CollectOptions,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            fetcher,
            listing: ListingExtractor::new(&profile.listing, &profile.origin)?,
            detail: DetailExtractor::new(&profile.detail)?,
            options,
        })
    }

    /// Drains every source in order and builds the deduplicated table.
    /// Fetch failures only cut a source short; they never fail the run.
    pub async fn collect(&self, sources: &[Source]) -> ResultTable {
        let mut collected: Vec<CollectedRecord> = Vec::new();

        for source in sources {
            let before = collected.len();
            self.collect_source(source, &mut collected).await;
            info!(
                "Collected {} books from {}",
                collected.len() - before,
                source.name()
            );
        }

        let table = ResultTable::build(collected, self.options.enrich_details);
        info!("Total number of unique books found: {}", table.len());
        table
    }

    async fn collect_source(&self, source: &Source, collected: &mut Vec<CollectedRecord>) {
        if self.options.verify_sources && self.fetch_body(&source.url).await.is_none() {
            warn!("Skipping invalid URL: {}", source.url);
            return;
        }

        let last_page = self.options.pagination.last_page();
        let row_limit = self.options.pagination.row_limit();
        let mut page = 1;

        loop {
            let Some(url) = source.page_url(page) else {
                warn!("Skipping invalid URL: {}", source.url);
                return;
            };

            info!("Fetching page {} from {}...", page, source.name());
            let Some(body) = self.fetch_body(&url).await else {
                return;
            };

            let accepted = {
                let doc = Html::parse_document(&body);
                self.listing.extract_candidates(&doc, row_limit)
            };

            // An empty page and a page past the end look the same.
            if accepted.is_empty() {
                info!("No more books found on page {}. Moving to next URL.", page);
                return;
            }

            for record in accepted {
                let record = if self.options.enrich_details {
                    CollectedRecord::from(self.enrich_record(record).await)
                } else {
                    CollectedRecord::from(record)
                };
                debug!("[{}] Insert Result {}", collected.len() + 1, record.title());
                collected.push(record);
            }

            if last_page.map_or(false, |last| page >= last) {
                return;
            }
            page += 1;
            tokio::time::sleep(self.options.request_delay).await;
        }
    }

    /// Rating distribution and author from a book's detail page. Never fails:
    /// a failed fetch gives an all-zero distribution and the "Unknown" author.
    pub async fn enrich(&self, detail_link: &str) -> (RatingDistribution, String) {
        let Some(body) = self.fetch_body(detail_link).await else {
            return (RatingDistribution::new(), UNKNOWN_AUTHOR.to_string());
        };

        let fields = {
            let doc = Html::parse_document(&body);
            self.detail.parse(&doc)
        };
        (
            fields.rating_distribution,
            fields.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        )
    }

    async fn enrich_record(&self, record: AcceptedRecord) -> EnrichedRecord {
        let (rating_distribution, author) = match record.detail_link() {
            Some(link) => self.enrich(link).await,
            None => {
                warn!("No detail link for {}", record.title());
                (RatingDistribution::new(), UNKNOWN_AUTHOR.to_string())
            }
        };
        record.enrich(rating_distribution, author)
    }

    async fn fetch_body(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(page) if page.is_success() => Some(page.body),
            Ok(page) => {
                warn!("Error fetching {}: status {}", url, page.status);
                None
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }
}

/// One whole run: collect, then write the CSV and, when configured, the
/// SQLite table.
pub async fn run(config: &RunConfig) -> Result<ResultTable, CollectorError> {
    let fetcher = fetch::HttpFetcher::new(&config.user_agent)?;
    let collector = Collector::new(fetcher, &config.profile, CollectOptions::from(config))?;

    let table = collector.collect(&config.sources).await;

    export::CsvSink::new(&config.output).write(&table).await?;
    info!("Data saved to {}", config.output.display());

    if let Some(name) = &config.sqlite {
        data::SqliteSink::new(name).await?.write(&table).await?;
        info!("Data saved to {}.db", name);
    }

    for record in table.records().iter().take(5) {
        info!("\n{}", record);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const LIST: &str = "https://www.goodreads.com/list/show/1";
    const OTHER: &str = "https://www.goodreads.com/list/show/2";

    #[derive(Default)]
    struct StaticFetcher {
        pages: HashMap<String, Page>,
        visited: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn page(mut self, url: &str, body: String) -> Self {
            self.pages.insert(url.to_string(), Page::ok(body));
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    status,
                    body: String::new(),
                },
            );
            self
        }

        fn visited(&self) -> Vec<String> {
            self.visited.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
            self.visited.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))
        }
    }

    fn book(title: &str, author: Option<&str>, rating: &str) -> String {
        let author = author
            .map(|a| format!(r#"<a class="authorName" href="/author/show/1"><span>{}</span></a>"#, a))
            .unwrap_or_default();
        format!(
            r#"<tr itemtype="http://schema.org/Book"><td>
                 <a class="bookTitle" href="/book/show/{0}"><span>{0}</span></a>
                 {1}
                 <span class="minirating">{2}</span>
               </td></tr>"#,
            title, author, rating
        )
    }

    fn list(books: &[String]) -> String {
        format!("<html><body><table>{}</table></body></html>", books.join(""))
    }

    fn detail(author: &str, counts: [&str; 5]) -> String {
        let graph = counts
            .iter()
            .map(|c| format!(r#"<div class="ratingGraph"><span class="value">{}</span></div>"#, c))
            .collect::<String>();
        format!(
            r#"<html><body><a class="authorName"><span>{}</span></a>{}</body></html>"#,
            author, graph
        )
    }

    fn page_url(base: &str, page: u32) -> String {
        format!("{}?page={}", base, page)
    }

    fn link(title: &str) -> String {
        format!("https://www.goodreads.com/book/show/{}", title)
    }

    fn collector(fetcher: StaticFetcher, options: CollectOptions) -> Collector<StaticFetcher> {
        Collector::new(fetcher, &SiteProfile::default(), options).unwrap()
    }

    fn titles(table: &ResultTable) -> Vec<&str> {
        table.records().iter().map(CollectedRecord::title).collect()
    }

    const GOOD: &str = "4.00 avg rating — 10,000 ratings";
    const BAD: &str = "2.50 avg rating — 50 ratings";

    #[tokio::test]
    async fn stops_source_on_page_without_accepted_books() {
        let fetcher = StaticFetcher::default()
            .page(
                &page_url(LIST, 1),
                list(&[book("A", Some("Ann"), GOOD), book("B", None, BAD)]),
            )
            .page(&page_url(LIST, 2), list(&[book("C", None, BAD)]))
            .page(&page_url(LIST, 3), list(&[book("D", None, GOOD)]))
            .page(&page_url(OTHER, 1), list(&[book("E", None, GOOD)]))
            .status(&page_url(OTHER, 2), 404);

        let c = collector(fetcher, CollectOptions::default());
        let table = c
            .collect(&[Source::new(LIST, "first"), Source::new(OTHER, "second")])
            .await;

        assert_eq!(titles(&table), vec!["A", "E"]);
        assert_eq!(table.records()[0].accepted().author(), "Ann");
        assert!(!table.is_enriched());
        assert_eq!(
            c.fetcher.visited(),
            vec![
                page_url(LIST, 1),
                page_url(LIST, 2),
                page_url(OTHER, 1),
                page_url(OTHER, 2)
            ]
        );
    }

    #[tokio::test]
    async fn keeps_first_of_duplicate_titles_across_sources() {
        let fetcher = StaticFetcher::default()
            .page(&page_url(LIST, 1), list(&[book("Dune", Some("First"), GOOD)]))
            .page(
                &page_url(OTHER, 1),
                list(&[book("Dune", Some("Second"), GOOD), book("Emma", None, GOOD)]),
            );

        let table = collector(fetcher, CollectOptions::default())
            .collect(&[Source::new(LIST, ""), Source::new(OTHER, "")])
            .await;

        assert_eq!(titles(&table), vec!["Dune", "Emma"]);
        assert_eq!(table.records()[0].accepted().author(), "First");
    }

    #[tokio::test]
    async fn max_pages_bounds_exhaustive_mode() {
        let fetcher = StaticFetcher::default()
            .page(&page_url(LIST, 1), list(&[book("A", None, GOOD)]))
            .page(&page_url(LIST, 2), list(&[book("B", None, GOOD)]))
            .page(&page_url(LIST, 3), list(&[book("C", None, GOOD)]));
        let options = CollectOptions {
            pagination: Pagination::Exhaustive { max_pages: Some(2) },
            ..CollectOptions::default()
        };

        let c = collector(fetcher, options);
        let table = c.collect(&[Source::new(LIST, "")]).await;

        assert_eq!(titles(&table), vec!["A", "B"]);
        assert_eq!(c.fetcher.visited().len(), 2);
    }

    #[tokio::test]
    async fn sample_mode_reads_first_rows_of_first_page() {
        let books = (0..8)
            .map(|i| book(&format!("Book{}", i), None, GOOD))
            .collect::<Vec<_>>();
        let fetcher = StaticFetcher::default()
            .page(&page_url(LIST, 1), list(&books))
            .page(&page_url(LIST, 2), list(&books));
        let options = CollectOptions {
            pagination: Pagination::Sample { rows: 5 },
            ..CollectOptions::default()
        };

        let c = collector(fetcher, options);
        let table = c.collect(&[Source::new(LIST, "")]).await;

        assert_eq!(titles(&table), vec!["Book0", "Book1", "Book2", "Book3", "Book4"]);
        assert_eq!(c.fetcher.visited(), vec![page_url(LIST, 1)]);
    }

    #[tokio::test]
    async fn enriches_and_survives_detail_failures() {
        let fetcher = StaticFetcher::default()
            .page(
                &page_url(LIST, 1),
                list(&[
                    book("Piranesi", Some("Listing Name"), GOOD),
                    book("Broken", Some("Listing Name"), GOOD),
                    book("Missing", Some("Listing Name"), GOOD),
                ]),
            )
            .page(&page_url(LIST, 2), list(&[]))
            .page(
                &link("Piranesi"),
                detail("Susanna Clarke", ["1,200", "800", "300", "50", "10"]),
            )
            .status(&link("Broken"), 500);
        let options = CollectOptions {
            enrich_details: true,
            ..CollectOptions::default()
        };

        let table = collector(fetcher, options)
            .collect(&[Source::new(LIST, "")])
            .await;

        assert!(table.is_enriched());
        assert_eq!(titles(&table), vec!["Piranesi", "Broken", "Missing"]);

        let piranesi = &table.records()[0];
        assert_eq!(piranesi.accepted().author(), "Susanna Clarke");
        assert_eq!(
            piranesi
                .rating_distribution()
                .unwrap()
                .levels()
                .collect::<Vec<_>>(),
            vec![(5, 1200), (4, 800), (3, 300), (2, 50), (1, 10)]
        );

        for failed in &table.records()[1..] {
            assert_eq!(failed.accepted().author(), UNKNOWN_AUTHOR);
            assert_eq!(failed.rating_distribution(), Some(&RatingDistribution::new()));
        }
    }

    #[tokio::test]
    async fn enrich_defaults_on_fetch_failure() {
        let fetcher = StaticFetcher::default().status(&link("Gone"), 404);
        let c = collector(fetcher, CollectOptions::default());

        assert_eq!(
            c.enrich(&link("Gone")).await,
            (RatingDistribution::new(), UNKNOWN_AUTHOR.to_string())
        );
        assert_eq!(
            c.enrich("https://unreachable.example/book").await,
            (RatingDistribution::new(), UNKNOWN_AUTHOR.to_string())
        );
    }

    #[tokio::test]
    async fn verify_skips_unreachable_sources() {
        let fetcher = StaticFetcher::default()
            .status(LIST, 404)
            .page(OTHER, list(&[]))
            .page(&page_url(OTHER, 1), list(&[book("E", None, GOOD)]))
            .page(&page_url(OTHER, 2), list(&[]));
        let options = CollectOptions {
            verify_sources: true,
            ..CollectOptions::default()
        };

        let c = collector(fetcher, options);
        let table = c
            .collect(&[Source::new(LIST, ""), Source::new(OTHER, "")])
            .await;

        assert_eq!(titles(&table), vec!["E"]);
        assert_eq!(
            c.fetcher.visited(),
            vec![
                LIST.to_string(),
                OTHER.to_string(),
                page_url(OTHER, 1),
                page_url(OTHER, 2)
            ]
        );
    }

    fn delayed_fetcher() -> StaticFetcher {
        let detail_page = || detail("Author", ["1", "1", "1", "1", "1"]);
        StaticFetcher::default()
            .page(
                &page_url(LIST, 1),
                list(&[
                    book("A", None, GOOD),
                    book("B", None, GOOD),
                    book("C", None, GOOD),
                ]),
            )
            .page(&page_url(LIST, 2), list(&[book("D", None, GOOD)]))
            .status(&page_url(LIST, 3), 404)
            .page(&link("A"), detail_page())
            .page(&link("B"), detail_page())
            .page(&link("C"), detail_page())
            .page(&link("D"), detail_page())
    }

    #[tokio::test(start_paused = true)]
    async fn delay_only_between_list_pages() {
        let delay = Duration::from_secs(2);
        let run = |pagination: Pagination| {
            collector(
                delayed_fetcher(),
                CollectOptions {
                    enrich_details: true,
                    pagination,
                    request_delay: delay,
                    ..CollectOptions::default()
                },
            )
        };

        // Three list pages, the third one fails: two pauses, none per detail page.
        let c = run(Pagination::Exhaustive { max_pages: None });
        let start = tokio::time::Instant::now();
        let table = c.collect(&[Source::new(LIST, "")]).await;
        assert_eq!(table.len(), 4);
        assert_eq!(c.fetcher.visited().len(), 3 + 4);
        assert_eq!(start.elapsed(), delay * 2);

        // No pause after the last allowed page.
        let c = run(Pagination::Exhaustive { max_pages: Some(2) });
        let start = tokio::time::Instant::now();
        let table = c.collect(&[Source::new(LIST, "")]).await;
        assert_eq!(table.len(), 4);
        assert_eq!(start.elapsed(), delay);

        let c = run(Pagination::Sample { rows: 5 });
        let start = tokio::time::Instant::now();
        let table = c.collect(&[Source::new(LIST, "")]).await;
        assert_eq!(table.len(), 3);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
