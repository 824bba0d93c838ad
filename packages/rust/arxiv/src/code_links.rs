//! Official code repository lookup.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use arxivdaily_shared::{ArxivDailyError, CodeLinksConfig, Result};

/// Response body of the paper-to-code endpoint.
#[derive(Debug, Deserialize)]
struct CodeLinkResponse {
    #[serde(default)]
    official: Option<OfficialRepo>,
}

#[derive(Debug, Deserialize)]
struct OfficialRepo {
    #[serde(default)]
    url: Option<String>,
}

/// Client for looking up a paper's official code repository.
pub struct CodeLinkClient {
    client: Client,
    base_url: Url,
}

impl CodeLinkClient {
    /// Create a client from the `[code_links]` config section.
    pub fn new(config: &CodeLinksConfig) -> Result<Self> {
        let mut raw = config.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|e| {
            ArxivDailyError::config(format!("invalid code_links.base_url '{raw}': {e}"))
        })?;

        Ok(Self {
            client: crate::build_client(config.timeout_secs)?,
            base_url,
        })
    }

    /// Look up the official repository URL for a paper id.
    ///
    /// Returns `Ok(None)` when the service knows no official repository
    /// (including HTTP 404 for unknown papers).
    pub async fn lookup(&self, id: &str) -> Result<Option<String>> {
        let url = self
            .base_url
            .join(id)
            .map_err(|e| ArxivDailyError::validation(format!("invalid paper id '{id}': {e}")))?;

        debug!(%url, "looking up code link");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ArxivDailyError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ArxivDailyError::Network(format!("{url}: HTTP {status}")));
        }

        let body: CodeLinkResponse = response
            .json()
            .await
            .map_err(|e| ArxivDailyError::parse(format!("{url}: invalid JSON: {e}")))?;

        Ok(body
            .official
            .and_then(|o| o.url)
            .filter(|u| !u.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CodeLinkClient {
        CodeLinkClient::new(&CodeLinksConfig {
            enabled: true,
            base_url: format!("{}/api/v0/papers", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn lookup_returns_official_url() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v0/papers/2401.00001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "paper_url": "https://paperswithcode.com/paper/x",
                "official": { "url": "https://github.com/example/nerf" },
                "all_official": []
            })))
            .mount(&server)
            .await;

        let link = client_for(&server).lookup("2401.00001").await.unwrap();
        assert_eq!(link.as_deref(), Some("https://github.com/example/nerf"));
    }

    #[tokio::test]
    async fn lookup_null_official_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v0/papers/2401.00002"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "official": null })),
            )
            .mount(&server)
            .await;

        let link = client_for(&server).lookup("2401.00002").await.unwrap();
        assert!(link.is_none());
    }

    #[tokio::test]
    async fn lookup_not_found_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let link = client_for(&server).lookup("2401.00003").await.unwrap();
        assert!(link.is_none());
    }

    #[tokio::test]
    async fn lookup_server_error_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).lookup("2401.00004").await.unwrap_err();
        assert!(matches!(err, ArxivDailyError::Network(_)));
    }
}
