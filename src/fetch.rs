use crate::{CollectorError, FetchError, Fetcher};
use reqwest::{Client, Url};
use tracing::debug;

/// Desktop browser UA; the site answers bare clients with an error page.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Anything but a 200 counts as a failed fetch.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, CollectorError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        debug!("Visit {}", url);
        let response = self.client.get(parsed).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(Page { status, body })
    }
}
