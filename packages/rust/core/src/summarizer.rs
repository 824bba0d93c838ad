//! Abstract summaries via the Gemini `generateContent` API.
//!
//! One request per paper. Transient failures (connection errors, HTTP 429,
//! HTTP 5xx) are retried with exponential backoff; everything else fails
//! immediately.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use arxivdaily_shared::{ArxivDailyError, PaperRecord, Result, SummarizerConfig};

/// Instruction prepended to every abstract.
const USER_PROMPT: &str = "Note the output format. Here is the abstract:";

/// Failure of a single request attempt.
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying after a backoff.
    Transient(String),
    /// Retrying will not help.
    Fatal(String),
}

impl AttemptError {
    fn into_error(self) -> ArxivDailyError {
        match self {
            Self::Transient(msg) | Self::Fatal(msg) => ArxivDailyError::Summarizer(msg),
        }
    }
}

/// Gemini-backed abstract summarizer.
pub struct Summarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    system_prompt: String,
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Summarizer {
    /// Create a summarizer from the `[summarizer]` section and a resolved key.
    pub fn new(config: &SummarizerConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ArxivDailyError::Summarizer(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        })
    }

    /// Model identifier used for requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarize a paper's abstract into a single paragraph.
    #[instrument(skip_all, fields(id = %paper.id, model = %self.model))]
    pub async fn summarize(&self, paper: &PaperRecord) -> Result<String> {
        let body = self.request_body(&paper.abstract_text);
        let mut backoff = self.initial_backoff.min(self.max_backoff);
        let mut attempt = 1;

        loop {
            match self.attempt(&body).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Transient(msg)) if attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %msg,
                        "retrying summary after transient error"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff, self.max_backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e.into_error()),
            }
        }
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(&self, abstract_text: &str) -> Value {
        json!({
            "system_instruction": {
                "parts": [{ "text": self.system_prompt }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{USER_PROMPT}\n{abstract_text}") }]
            }],
            "generationConfig": {
                "temperature": self.temperature
            }
        })
    }

    async fn attempt(&self, body: &Value) -> std::result::Result<String, AttemptError> {
        let url = self.endpoint_url();
        debug!(%url, "requesting summary");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(format!("invalid JSON response: {e}")))?;

        parse_response(&json).map_err(AttemptError::Fatal)
    }
}

/// Double `current`, saturating, and clamp to `max`.
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

fn map_http_error(status: StatusCode, body: &str) -> AttemptError {
    let msg = format!("HTTP {status} from Gemini API: {}", body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AttemptError::Transient(msg)
    } else {
        AttemptError::Fatal(msg)
    }
}

/// Extract the generated text from `candidates[0].content.parts`.
fn parse_response(body: &Value) -> std::result::Result<String, String> {
    let candidate = body["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or("missing 'candidates' in response")?;

    let parts = candidate["content"]["parts"]
        .as_array()
        .ok_or("missing 'parts' in candidate content")?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = text.replace("**", "");
    if text.is_empty() {
        return Err("empty summary in response".into());
    }
    Ok(text)
}
