use booklist_crawler::{Pagination, RunConfig, Source};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Collects well rated books from paginated list pages into a CSV file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON run configuration. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// List page to collect (repeatable). Replaces the configured sources.
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Label for the sources given with --url
    #[arg(long)]
    label: Option<String>,

    /// Follow each book's detail page for its rating distribution and author
    #[arg(long, overrides_with = "no_enrich")]
    enrich: bool,

    /// Do not follow detail pages, even if the config file enables it
    #[arg(long, overrides_with = "enrich")]
    no_enrich: bool,

    /// Only look at the first N rows of page 1 of every source
    #[arg(long, num_args = 0..=1, default_missing_value = "5", conflicts_with = "max_pages")]
    sample: Option<usize>,

    /// Stop each source after this many pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Pause between list pages, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Output CSV path
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Also store the results into <NAME>.db
    #[arg(long)]
    sqlite: Option<String>,

    /// Check every source url answers before paginating it
    #[arg(long, overrides_with = "no_verify")]
    verify: bool,

    /// Skip the source check, even if the config file enables it
    #[arg(long, overrides_with = "verify")]
    no_verify: bool,
}

/// `--x` / `--no-x` pair. `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl Args {
    fn apply(self, config: &mut RunConfig) {
        if !self.urls.is_empty() {
            let label = self.label.unwrap_or_default();
            config.sources = self
                .urls
                .into_iter()
                .map(|url| Source::new(url, label.clone()))
                .collect();
        }
        if let Some(enrich) = switch(self.enrich, self.no_enrich) {
            config.enrich_details = enrich;
        }
        if let Some(rows) = self.sample {
            config.pagination = Pagination::Sample { rows };
        } else if self.max_pages.is_some() {
            config.pagination = Pagination::Exhaustive {
                max_pages: self.max_pages,
            };
        }
        if let Some(delay_ms) = self.delay_ms {
            config.request_delay_ms = delay_ms;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.sqlite.is_some() {
            config.sqlite = self.sqlite;
        }
        if let Some(verify) = switch(self.verify, self.no_verify) {
            config.verify_sources = verify;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    info!(
        "Collecting {} sources (enrich: {}, {:?})",
        config.sources.len(),
        config.enrich_details,
        config.pagination
    );
    booklist_crawler::run(&config).await?;

    Ok(())
}
