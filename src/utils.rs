use chrono::{DateTime, FixedOffset};
use reqwest::Url;
use sqlx::SqlitePool;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

pub(crate) fn get_now() -> DateTime<FixedOffset> {
    let now = chrono::offset::Local::now();
    now.with_timezone(now.offset())
}

/// Absolute form of `href`. Already absolute links are returned unchanged.
pub(crate) fn resolve_link(origin: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    Url::parse(origin)
        .ok()?
        .join(href)
        .ok()
        .map(String::from)
}

/// `url` with `param=page` appended to its query string.
pub(crate) fn page_url(url: &str, param: &str, page: u32) -> Option<String> {
    let mut url = Url::parse(url).ok()?;
    url.query_pairs_mut()
        .append_pair(param, &page.to_string());
    Some(url.into())
}
