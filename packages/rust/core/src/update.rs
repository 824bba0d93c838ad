//! Update-links pass: fill in code links for already indexed papers.
//!
//! No arxiv queries are made. Every record without a `code_url` is looked
//! up again; lookups are shared across targets, so a paper indexed by both
//! the README and the web page is queried once.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{Span, info, instrument};
use uuid::Uuid;

use arxivdaily_arxiv::CodeLinkClient;
use arxivdaily_shared::{AppConfig, ArxivDailyError, Result};

use crate::pipeline::{Enricher, ProgressReporter, RunSummary};
use crate::publish;

/// Configuration for [`update_links`].
#[derive(Debug, Clone)]
pub struct UpdateLinksConfig {
    /// Resolved application config.
    pub app: AppConfig,
    /// Directory that relative output paths are resolved against.
    pub root: PathBuf,
    /// Date shown in the rendered "Updated on" heading.
    pub today: NaiveDate,
}

/// Run the update-links pass over every enabled target.
#[instrument(skip_all, fields(run_id = tracing::field::Empty))]
pub async fn update_links(
    config: &UpdateLinksConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let run_id = Uuid::now_v7();
    Span::current().record("run_id", tracing::field::display(run_id));

    if !config.app.code_links.enabled {
        return Err(ArxivDailyError::config(
            "code_links.enabled is false; nothing to update",
        ));
    }

    info!(%run_id, "starting update-links run");

    progress.phase("Loading indexes");
    let targets = publish::resolve_targets(&config.app, &config.root)?;
    let mut indexes = publish::load_indexes(&targets)?;

    let client = CodeLinkClient::new(&config.app.code_links)?;
    let mut enricher = Enricher::new(Some(client), None);

    progress.phase("Looking up code links");
    let pending: usize = indexes
        .iter()
        .flat_map(|i| &i.topics)
        .flat_map(|t| &t.papers)
        .filter(|p| p.code_url.is_none())
        .count();
    let mut current = 0;

    for index in &mut indexes {
        for section in &mut index.topics {
            for paper in section.papers.iter_mut().filter(|p| p.code_url.is_none()) {
                paper.code_url = enricher.code_link(&paper.id).await;
                current += 1;
                progress.paper_enriched(&paper.id, current, pending);
            }
        }
    }

    progress.phase("Writing outputs");
    let mut files = Vec::new();
    for (target, index) in targets.iter().zip(&indexes) {
        files.extend(publish::prepare(target, index, config.today)?);
    }
    let files = publish::write_all(files)?;

    let summary = RunSummary {
        run_id,
        papers_fetched: 0,
        papers_added: 0,
        code_links_found: enricher.code_links_found,
        summaries: 0,
        files,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        checked = pending,
        code_links = summary.code_links_found,
        elapsed_ms = summary.elapsed.as_millis(),
        "update-links run complete"
    );

    Ok(summary)
}
