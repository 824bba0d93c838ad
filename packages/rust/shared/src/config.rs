//! Application configuration for arxiv-daily.
//!
//! Config lives in `arxiv-daily.toml` next to the published files.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArxivDailyError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "arxiv-daily.toml";

// ---------------------------------------------------------------------------
// Config structs (matching arxiv-daily.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// arxiv API settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Code-link lookup settings.
    #[serde(default)]
    pub code_links: CodeLinksConfig,

    /// Text-generation settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Output targets.
    #[serde(default)]
    pub publish: PublishConfig,

    /// Topic queries, in display order.
    #[serde(default = "default_topics")]
    pub topics: Vec<TopicConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            code_links: CodeLinksConfig::default(),
            summarizer: SummarizerConfig::default(),
            publish: PublishConfig::default(),
            topics: default_topics(),
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// arxiv query endpoint.
    #[serde(default = "default_arxiv_base_url")]
    pub base_url: String,

    /// Prefix for canonical abstract links (`<abs_base_url>abs/<id>`).
    #[serde(default = "default_abs_base_url")]
    pub abs_base_url: String,

    /// Maximum results requested per topic.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_arxiv_base_url(),
            abs_base_url: default_abs_base_url(),
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_arxiv_base_url() -> String {
    "http://export.arxiv.org/api/query".into()
}
fn default_abs_base_url() -> String {
    "http://arxiv.org/".into()
}
fn default_max_results() -> u32 {
    10
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[code_links]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeLinksConfig {
    /// Whether to look up official code repositories for new papers.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lookup endpoint; the paper id is appended.
    #[serde(default = "default_code_links_base_url")]
    pub base_url: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CodeLinksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_code_links_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_code_links_base_url() -> String {
    "https://arxiv.paperswithcode.com/api/v0/papers/".into()
}

/// `[summarizer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Whether to summarize new papers when an API key is available.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    #[serde(default = "default_summarizer_base_url")]
    pub base_url: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Total attempts per paper (first request included) before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the retry delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// HTTP timeout in seconds.
    #[serde(default = "default_summarizer_timeout_secs")]
    pub timeout_secs: u64,

    /// System instruction sent with every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_summarizer_base_url(),
            temperature: default_temperature(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_summarizer_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_model() -> String {
    "gemini-1.5-pro-latest".into()
}
fn default_summarizer_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_temperature() -> f64 {
    0.8
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_summarizer_timeout_secs() -> u64 {
    60
}
fn default_system_prompt() -> String {
    "You are an expert reader of artificial intelligence and computer science papers. \
     You stick to the facts in the abstract you are given and never make up new facts. \
     Summarize the abstract in two or three plain sentences for a reader familiar with AI. \
     Keep technical terms exact. Return a single paragraph without bold text or line breaks."
        .into()
}

/// `[publish]` section: one entry per output target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Repository README target.
    #[serde(default = "default_readme_target")]
    pub readme: PublishTarget,

    /// GitHub Pages target.
    #[serde(default = "default_gitpage_target")]
    pub gitpage: PublishTarget,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            readme: default_readme_target(),
            gitpage: default_gitpage_target(),
        }
    }
}

impl PublishConfig {
    /// Enabled targets with their names, in publish order.
    pub fn enabled_targets(&self) -> Vec<(&'static str, &PublishTarget)> {
        [("readme", &self.readme), ("gitpage", &self.gitpage)]
            .into_iter()
            .filter(|(_, t)| t.enabled)
            .collect()
    }
}

/// A JSON index plus the markdown file rendered from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishTarget {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path of the JSON index, relative to the working directory.
    pub json_path: PathBuf,
    /// Path of the rendered markdown, relative to the working directory.
    pub md_path: PathBuf,
    /// Emit Jekyll front matter and the web table header.
    #[serde(default)]
    pub to_web: bool,
    /// Use an `## Updated on` heading and table headers.
    #[serde(default = "default_true")]
    pub use_title: bool,
    /// Emit a collapsible table of contents.
    #[serde(default = "default_true")]
    pub use_toc: bool,
    /// Emit a "back to top" link after each topic.
    #[serde(default = "default_true")]
    pub back_to_top: bool,
}

fn default_readme_target() -> PublishTarget {
    PublishTarget {
        enabled: true,
        json_path: PathBuf::from("docs/ai-arxiv-daily.json"),
        md_path: PathBuf::from("README.md"),
        to_web: false,
        use_title: true,
        use_toc: true,
        back_to_top: true,
    }
}

fn default_gitpage_target() -> PublishTarget {
    PublishTarget {
        enabled: true,
        json_path: PathBuf::from("docs/ai-arxiv-daily-web.json"),
        md_path: PathBuf::from("docs/index.md"),
        to_web: true,
        use_title: true,
        use_toc: false,
        back_to_top: false,
    }
}

fn default_true() -> bool {
    true
}

/// `[[topics]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Topic name, used as section heading.
    pub name: String,
    /// Search terms joined with `OR`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    /// arxiv field prefix applied to the filters (e.g. `abs`, `ti`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Raw arxiv query; takes precedence over `filters`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl TopicConfig {
    fn with_filters(name: &str, field: &str, filters: &[&str]) -> Self {
        Self {
            name: name.into(),
            filters: filters.iter().map(|f| (*f).to_string()).collect(),
            field: Some(field.into()),
            query: None,
        }
    }

    /// Build the arxiv `search_query` for this topic.
    ///
    /// Multi-word filters are quoted; filters are joined with ` OR ` and
    /// wrapped as `field:(...)` when a field is set.
    pub fn search_query(&self) -> String {
        if let Some(query) = &self.query {
            return query.clone();
        }

        let joined = self
            .filters
            .iter()
            .map(|f| {
                let f = f.trim();
                if f.split_whitespace().count() > 1 {
                    format!("\"{f}\"")
                } else {
                    f.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        match &self.field {
            Some(field) => format!("{field}:({joined})"),
            None => joined,
        }
    }
}

fn default_topics() -> Vec<TopicConfig> {
    vec![
        TopicConfig::with_filters(
            "Multimodal",
            "abs",
            &[
                "Multi-modal Models",
                "Multimodal Model",
                "LMMs",
                "vision-language model",
                "Vision Language Models",
                "VLMs",
                "Vision-and-Language Pre-training",
                "VLP",
                "Multimodal Learning",
                "multimodal pretraining",
                "MLLM",
            ],
        ),
        TopicConfig::with_filters(
            "6DOF Object Pose",
            "abs",
            &["Object Pose Estimation", "object 6D pose estimation"],
        ),
        TopicConfig::with_filters("NeRF", "abs", &["Radiance Fields"]),
        TopicConfig::with_filters(
            "Classification/Detection/Recognition/Segmentation",
            "abs",
            &[
                "image classification",
                "object detection",
                "super resolution",
                "Object Tracking",
            ],
        ),
        TopicConfig::with_filters(
            "Model Compression/Optimization",
            "abs",
            &[
                "Network Architecture Search",
                "Knowledge Distillation",
                "model optimizer",
            ],
        ),
        TopicConfig::with_filters("OCR", "abs", &["optical character recognition", "ocr"]),
        TopicConfig::with_filters(
            "Generative Models",
            "abs",
            &[
                "diffusion model",
                "text-to-video synthesis",
                "T2V",
                "generative model",
            ],
        ),
        TopicConfig::with_filters(
            "LLM",
            "abs",
            &["state-of-the-art LLMs", "training language models"],
        ),
        TopicConfig::with_filters(
            "Transformer",
            "abs",
            &["self-attention", "cross-attention", "cross attention"],
        ),
        TopicConfig::with_filters(
            "3DGS",
            "abs",
            &["3d gaussian splatting", "gaussian splatting"],
        ),
        TopicConfig::with_filters(
            "3D/CG",
            "abs",
            &["3D detection", "3D reconstruction", "3D understanding"],
        ),
        TopicConfig::with_filters(
            "Learning Paradigms",
            "abs",
            &[
                "Semi-supervised",
                "unsupervised",
                "Continual Learning",
                "Incremental Learning",
                "Contrastive Learning",
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the application config. Returns defaults if the file does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ArxivDailyError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ArxivDailyError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Reject configs that cannot produce a meaningful run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    for topic in &config.topics {
        if topic.name.trim().is_empty() {
            return Err(ArxivDailyError::config("topic with empty name"));
        }
        if topic.query.is_none() && topic.filters.is_empty() {
            return Err(ArxivDailyError::config(format!(
                "topic '{}' needs either `query` or `filters`",
                topic.name
            )));
        }
    }

    let mut names: Vec<&str> = config.topics.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(ArxivDailyError::config(format!(
            "duplicate topic name '{}'",
            dup[0]
        )));
    }

    if config.fetch.max_results == 0 {
        return Err(ArxivDailyError::config("fetch.max_results must be at least 1"));
    }

    if config.summarizer.max_attempts == 0 {
        return Err(ArxivDailyError::config(
            "summarizer.max_attempts must be at least 1",
        ));
    }

    Ok(())
}

/// Write a default config file at `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        return Err(ArxivDailyError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ArxivDailyError::io(parent, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ArxivDailyError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ArxivDailyError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Resolve the summarizer API key: explicit value first, then the env var
/// named in the config. Empty values count as missing.
pub fn resolve_api_key(config: &AppConfig, explicit: Option<&str>) -> Option<String> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    match std::env::var(&config.summarizer.api_key_env) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_results"));
        assert!(toml_str.contains("GOOGLE_API_KEY"));
        assert!(toml_str.contains("docs/ai-arxiv-daily.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.max_results, 10);
        assert_eq!(parsed.summarizer.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(parsed.topics.len(), config.topics.len());
        assert!(parsed.publish.gitpage.to_web);
        assert!(!parsed.publish.readme.to_web);
    }

    #[test]
    fn config_with_topics() {
        let toml_str = r#"
[fetch]
max_results = 5

[[topics]]
name = "NeRF"
filters = ["Radiance Fields", "NeRF"]
field = "abs"

[[topics]]
name = "Raw"
query = "cat:cs.CV"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        validate_config(&config).expect("valid");
        assert_eq!(config.fetch.max_results, 5);
        assert_eq!(config.topics.len(), 2);
        assert_eq!(
            config.topics[0].search_query(),
            r#"abs:("Radiance Fields" OR NeRF)"#
        );
        assert_eq!(config.topics[1].search_query(), "cat:cs.CV");
        // Unspecified sections fall back to defaults
        assert_eq!(config.publish.readme.md_path, PathBuf::from("README.md"));
    }

    #[test]
    fn search_query_without_field() {
        let topic = TopicConfig {
            name: "SLAM".into(),
            filters: vec!["SLAM".into(), "visual odometry".into()],
            field: None,
            query: None,
        };
        assert_eq!(topic.search_query(), r#"SLAM OR "visual odometry""#);
    }

    #[test]
    fn validation_rejects_empty_topic() {
        let mut config = AppConfig::default();
        config.topics.push(TopicConfig {
            name: "Empty".into(),
            filters: vec![],
            field: None,
            query: None,
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("Empty"));
    }

    #[test]
    fn validation_rejects_duplicate_topics() {
        let mut config = AppConfig::default();
        let first = config.topics[0].clone();
        config.topics.push(first);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate topic"));
    }

    #[test]
    fn validation_rejects_zero_attempts() {
        let mut config = AppConfig::default();
        config.summarizer.max_attempts = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn enabled_targets_filters_disabled() {
        let mut config = AppConfig::default();
        assert_eq!(config.publish.enabled_targets().len(), 2);
        config.publish.gitpage.enabled = false;
        let targets = config.publish.enabled_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].0, "readme");
    }

    #[test]
    fn api_key_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.summarizer.api_key_env = "AD_TEST_NONEXISTENT_KEY_12345".into();
        assert_eq!(resolve_api_key(&config, None), None);
        assert_eq!(resolve_api_key(&config, Some("  ")), None);
        assert_eq!(
            resolve_api_key(&config, Some("abc")),
            Some("abc".to_string())
        );
    }

    #[test]
    fn init_config_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!(
            "ad-config-test-{}",
            std::process::id()
        ));
        let path = dir.join(CONFIG_FILE_NAME);
        let _ = std::fs::remove_dir_all(&dir);

        init_config(&path, false).expect("first init");
        assert!(init_config(&path, false).is_err());
        init_config(&path, true).expect("forced init");

        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded.topics.len(), AppConfig::default().topics.len());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let path = std::env::temp_dir().join("ad-definitely-missing/arxiv-daily.toml");
        let config = load_config(&path).expect("defaults");
        assert_eq!(config.fetch.base_url, "http://export.arxiv.org/api/query");
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = load_config_from(Path::new("../../../arxiv-daily.toml"))
            .expect("load shipped config");
        let defaults = AppConfig::default();

        let shipped_queries: Vec<String> =
            shipped.topics.iter().map(TopicConfig::search_query).collect();
        let default_queries: Vec<String> =
            defaults.topics.iter().map(TopicConfig::search_query).collect();
        assert_eq!(shipped_queries, default_queries);
        assert_eq!(shipped.summarizer.temperature, defaults.summarizer.temperature);
        assert_eq!(shipped.summarizer.max_attempts, defaults.summarizer.max_attempts);
        assert_eq!(shipped.summarizer.max_backoff_ms, defaults.summarizer.max_backoff_ms);
        assert_eq!(shipped.publish.gitpage.md_path, defaults.publish.gitpage.md_path);
    }
}
