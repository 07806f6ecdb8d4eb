use booklist_crawler::extract::{DetailExtractor, ListingExtractor};
use booklist_crawler::profile::SiteProfile;
use booklist_crawler::CollectedRecord;
use clap::Parser;
use scraper::Html;
use std::path::PathBuf;

/// Runs the extractors over a saved page, without any network access.
#[derive(Parser, Debug)]
struct Args {
    /// Saved HTML page
    file: PathBuf,

    /// Treat the file as a book detail page instead of a list page
    #[arg(long)]
    detail: bool,

    /// Only look at the first N rows of the list
    #[arg(long)]
    sample: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let profile = SiteProfile::default();
    let html = std::fs::read_to_string(&args.file)?;
    let doc = Html::parse_document(&html);

    if args.detail {
        let fields = DetailExtractor::new(&profile.detail)?.parse(&doc);
        println!("Author          : {}", fields.author.as_deref().unwrap_or("None"));
        for (stars, count) in fields.rating_distribution.levels() {
            println!("{} stars         : {}", stars, count);
        }
        return Ok(());
    }

    let accepted = ListingExtractor::new(&profile.listing, &profile.origin)?
        .extract_candidates(&doc, args.sample);
    for record in &accepted {
        println!("{}", CollectedRecord::from(record.clone()));
    }
    println!("==== {} BOOKS ====", accepted.len());
    Ok(())
}
