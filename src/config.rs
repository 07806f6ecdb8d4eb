use crate::fetch::DEFAULT_USER_AGENT;
use crate::profile::SiteProfile;
use crate::{goodreads, utils, CollectorError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PAGE_PARAM: &str = "page";
pub const DEFAULT_SAMPLE_ROWS: usize = 5;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;
pub const DEFAULT_OUTPUT: &str = "filtered_books.csv";

/// One paginated listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_page_param")]
    pub page_param: String,
}

fn default_page_param() -> String {
    DEFAULT_PAGE_PARAM.to_string()
}

impl Source {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            page_param: default_page_param(),
        }
    }

    /// `None` when the source url does not parse.
    pub fn page_url(&self, page: u32) -> Option<String> {
        utils::page_url(&self.url, &self.page_param, page)
    }

    pub fn name(&self) -> &str {
        if self.label.is_empty() {
            &self.url
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pagination {
    /// Walk pages 1, 2, ... until a page yields no accepted record or fails.
    Exhaustive {
        #[serde(default)]
        max_pages: Option<u32>,
    },
    /// Page 1 only, looking at no more than `rows` raw rows.
    Sample {
        #[serde(default = "default_sample_rows")]
        rows: usize,
    },
}

fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::Exhaustive { max_pages: None }
    }
}

impl Pagination {
    /// Last page to request, if bounded.
    pub fn last_page(&self) -> Option<u32> {
        match *self {
            Pagination::Exhaustive { max_pages } => max_pages,
            Pagination::Sample { .. } => Some(1),
        }
    }

    /// Raw rows to examine per page, if bounded.
    pub fn row_limit(&self) -> Option<usize> {
        match *self {
            Pagination::Exhaustive { .. } => None,
            Pagination::Sample { rows } => Some(rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub sources: Vec<Source>,
    pub enrich_details: bool,
    pub pagination: Pagination,
    pub request_delay_ms: u64,
    /// Fetch each bare source url once and skip the source unless it answers 200.
    pub verify_sources: bool,
    pub user_agent: String,
    pub output: PathBuf,
    /// Also store the table into `<name>.db`.
    pub sqlite: Option<String>,
    pub profile: SiteProfile,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sources: goodreads::default_sources(),
            enrich_details: false,
            pagination: Pagination::default(),
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            verify_sources: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            sqlite: None,
            profile: SiteProfile::default(),
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, CollectorError> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CollectorError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CollectorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), CollectorError> {
        for source in &self.sources {
            if Url::parse(&source.url).is_err() {
                return Err(CollectorError::InvalidSource(source.url.clone()));
            }
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
