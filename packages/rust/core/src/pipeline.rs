//! Daily pipeline: fetch → filter → enrich → merge → render → write.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

use arxivdaily_arxiv::{ArxivClient, CodeLinkClient};
use arxivdaily_shared::{AppConfig, PaperRecord, Result};

use crate::merge;
use crate::publish::{self, FileReport};
use crate::summarizer::Summarizer;

/// Configuration for [`run_daily`].
#[derive(Clone)]
pub struct DailyConfig {
    /// Resolved application config.
    pub app: AppConfig,
    /// Directory that relative output paths are resolved against.
    pub root: PathBuf,
    /// Date shown in the rendered "Updated on" heading.
    pub today: NaiveDate,
    /// Drop papers published before this date.
    pub since: Option<NaiveDate>,
    /// Overrides `fetch.max_results`.
    pub max_results: Option<u32>,
    /// Summarizer API key, if one was resolved.
    pub api_key: Option<String>,
    /// Set to `false` to skip summaries even when configured.
    pub summarize: bool,
}

impl fmt::Debug for DailyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DailyConfig")
            .field("app", &self.app)
            .field("root", &self.root)
            .field("today", &self.today)
            .field("since", &self.since)
            .field("max_results", &self.max_results)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("summarize", &self.summarize)
            .finish()
    }
}

/// Outcome of a pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    /// Identifier recorded in the run's tracing span.
    pub run_id: Uuid,
    /// Papers fetched from arxiv across all topics.
    pub papers_fetched: usize,
    /// Records added across all targets' indexes (first target counted).
    pub papers_added: usize,
    /// Code links found during the run.
    pub code_links_found: usize,
    /// Summaries generated during the run.
    pub summaries: usize,
    /// Per-file write outcomes.
    pub files: Vec<FileReport>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a topic has been queried.
    fn topic_fetched(&self, topic: &str, new_papers: usize, current: usize, total: usize);
    /// Called after a paper has been looked up / summarized.
    fn paper_enriched(&self, id: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn topic_fetched(&self, _topic: &str, _new_papers: usize, _current: usize, _total: usize) {}
    fn paper_enriched(&self, _id: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Optional enrichment clients plus per-run caches keyed by paper id.
pub(crate) struct Enricher {
    code_links: Option<CodeLinkClient>,
    summarizer: Option<Summarizer>,
    code_cache: HashMap<String, Option<String>>,
    summary_cache: HashMap<String, Option<String>>,
    pub(crate) code_links_found: usize,
    pub(crate) summaries: usize,
}

impl Enricher {
    pub(crate) fn new(code_links: Option<CodeLinkClient>, summarizer: Option<Summarizer>) -> Self {
        Self {
            code_links,
            summarizer,
            code_cache: HashMap::new(),
            summary_cache: HashMap::new(),
            code_links_found: 0,
            summaries: 0,
        }
    }

    /// Look up the code link for `id`, once per run.
    ///
    /// Lookup errors are logged and treated as "no link".
    pub(crate) async fn code_link(&mut self, id: &str) -> Option<String> {
        let client = self.code_links.as_ref()?;
        if let Some(cached) = self.code_cache.get(id) {
            return cached.clone();
        }

        let link = match client.lookup(id).await {
            Ok(link) => link,
            Err(e) => {
                warn!(id, error = %e, "code link lookup failed, skipping");
                None
            }
        };
        if link.is_some() {
            self.code_links_found += 1;
        }
        self.code_cache.insert(id.to_string(), link.clone());
        link
    }

    /// Summarize `paper`, once per run. Failures are logged and yield `None`.
    async fn summary(&mut self, paper: &PaperRecord) -> Option<String> {
        let summarizer = self.summarizer.as_ref()?;
        if let Some(cached) = self.summary_cache.get(&paper.id) {
            return cached.clone();
        }

        let summary = match summarizer.summarize(paper).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(id = %paper.id, error = %e, "summary failed, keeping abstract");
                None
            }
        };
        if summary.is_some() {
            self.summaries += 1;
        }
        self.summary_cache.insert(paper.id.clone(), summary.clone());
        summary
    }
}

/// Run the daily update.
///
/// 1. Load every enabled target's index
/// 2. Query arxiv for each topic (any failure aborts the run)
/// 3. Drop papers already indexed, look up code links and summaries
/// 4. Merge, render, and write all outputs
#[instrument(skip_all, fields(run_id = tracing::field::Empty, topics = config.app.topics.len()))]
pub async fn run_daily(
    config: &DailyConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let run_id = Uuid::now_v7();
    Span::current().record("run_id", tracing::field::display(run_id));

    info!(%run_id, since = ?config.since, "starting daily run");

    // --- Phase 1: Load indexes ---
    progress.phase("Loading indexes");
    let targets = publish::resolve_targets(&config.app, &config.root)?;
    let mut indexes = publish::load_indexes(&targets)?;

    // --- Phase 2: Clients ---
    let arxiv = ArxivClient::new(&config.app.fetch)?;
    let code_links = if config.app.code_links.enabled {
        Some(CodeLinkClient::new(&config.app.code_links)?)
    } else {
        None
    };
    let summarizer = match (&config.api_key, config.summarize && config.app.summarizer.enabled) {
        (Some(key), true) => Some(Summarizer::new(&config.app.summarizer, key.clone())?),
        (None, true) => {
            info!(
                env = %config.app.summarizer.api_key_env,
                "no summarizer API key, summaries disabled"
            );
            None
        }
        _ => None,
    };
    if let Some(s) = &summarizer {
        debug!(model = s.model(), "summaries enabled");
    }
    let mut enricher = Enricher::new(code_links, summarizer);

    let max_results = config.max_results.unwrap_or(config.app.fetch.max_results);
    let total_topics = config.app.topics.len();
    let mut papers_fetched = 0;
    let mut papers_added = 0;

    // --- Phase 3: Fetch, enrich, merge ---
    progress.phase("Fetching papers");
    for (i, topic) in config.app.topics.iter().enumerate() {
        let query = topic.search_query();
        let fetched = arxiv.search(&query, max_results).await?;
        papers_fetched += fetched.len();

        let index_refs: Vec<_> = indexes.iter().collect();
        let mut fresh = merge::select_new(fetched, &topic.name, &index_refs, config.since);
        progress.topic_fetched(&topic.name, fresh.len(), i + 1, total_topics);
        info!(topic = %topic.name, new = fresh.len(), "topic fetched");

        let total = fresh.len();
        for (j, paper) in fresh.iter_mut().enumerate() {
            paper.code_url = enricher.code_link(&paper.id).await;
            paper.summary = enricher.summary(paper).await;
            progress.paper_enriched(&paper.id, j + 1, total);
        }

        for (k, index) in indexes.iter_mut().enumerate() {
            let added = merge::merge_topic(index, &topic.name, &fresh);
            if k == 0 {
                papers_added += added;
            }
        }
    }

    // --- Phase 4: Render & write ---
    progress.phase("Writing outputs");
    let mut files = Vec::new();
    for (target, index) in targets.iter().zip(&indexes) {
        files.extend(publish::prepare(target, index, config.today)?);
    }
    let files = publish::write_all(files)?;

    let summary = RunSummary {
        run_id,
        papers_fetched,
        papers_added,
        code_links_found: enricher.code_links_found,
        summaries: enricher.summaries,
        files,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        papers_fetched = summary.papers_fetched,
        papers_added = summary.papers_added,
        code_links = summary.code_links_found,
        summaries = summary.summaries,
        elapsed_ms = summary.elapsed.as_millis(),
        "daily run complete"
    );

    Ok(summary)
}
