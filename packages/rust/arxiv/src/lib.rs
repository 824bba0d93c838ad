//! arxiv API client and code-link lookup.
//!
//! [`ArxivClient`] queries the arxiv Atom API for the newest submissions
//! matching a topic query. [`CodeLinkClient`] asks the paper-to-code service
//! whether a paper has an official source repository.

mod code_links;
mod feed;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use arxivdaily_shared::{ArxivDailyError, FetchConfig, PaperRecord, Result};

pub use code_links::CodeLinkClient;
pub use feed::parse_feed;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for all outgoing requests.
const USER_AGENT: &str = concat!("arxiv-daily/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ArxivClient
// ---------------------------------------------------------------------------

/// Client for the arxiv query API.
pub struct ArxivClient {
    client: Client,
    base_url: Url,
    abs_base_url: String,
}

impl ArxivClient {
    /// Create a client from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ArxivDailyError::config(format!("invalid fetch.base_url '{}': {e}", config.base_url))
        })?;

        let mut abs_base_url = config.abs_base_url.clone();
        if !abs_base_url.ends_with('/') {
            abs_base_url.push('/');
        }

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url,
            abs_base_url,
        })
    }

    /// Fetch the newest `max_results` submissions matching `query`,
    /// newest first.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<PaperRecord>> {
        let max = max_results.to_string();
        let request = self.client.get(self.base_url.clone()).query(&[
            ("search_query", query),
            ("start", "0"),
            ("max_results", max.as_str()),
            ("sortBy", "submittedDate"),
            ("sortOrder", "descending"),
        ]);

        debug!(url = %self.base_url, max_results, "querying arxiv");

        let response = request
            .send()
            .await
            .map_err(|e| ArxivDailyError::Network(format!("{}: {e}", self.base_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArxivDailyError::Network(format!(
                "{}: HTTP {status}",
                self.base_url
            )));
        }

        let body = response.text().await.map_err(|e| {
            ArxivDailyError::Network(format!("{}: failed to read body: {e}", self.base_url))
        })?;

        let records = feed::parse_feed(&body, &self.abs_base_url)?;

        info!(count = records.len(), "arxiv query complete");
        Ok(records)
    }
}

/// Build a reqwest client with the shared settings.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ArxivDailyError::Network(format!("failed to build HTTP client: {e}")))
}
