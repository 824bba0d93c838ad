//! Migration of the legacy index format.
//!
//! The previous updater stored each topic as a map from paper id to a
//! pre-rendered markdown table row:
//!
//! ```text
//! { "NeRF": { "2401.00001": "|**2024-01-01**|**Title**|[2401.00001](http://arxiv.org/abs/2401.00001)|null|**Abstract**|\n" } }
//! ```
//!
//! Rows are parsed back into [`PaperRecord`]s. Authors are not recoverable
//! and stay empty; `updated_date` is set to the published date.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{info, warn};

use arxivdaily_shared::{ArxivDailyError, PaperIndex, PaperRecord, Result, canonical_id};

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

/// Convert a legacy `{topic: {id: row}}` document into a [`PaperIndex`].
///
/// Topic order follows the document. Rows that cannot be parsed are
/// skipped with a warning.
pub(crate) fn migrate_legacy(doc: Map<String, Value>) -> Result<PaperIndex> {
    let mut index = PaperIndex::default();
    let mut skipped = 0usize;

    for (topic, rows) in doc {
        let Value::Object(rows) = rows else {
            return Err(ArxivDailyError::parse(format!(
                "legacy index: topic '{topic}' is not an object"
            )));
        };

        let section = index.section_mut(&topic);
        for (key, row) in rows {
            let parsed = row
                .as_str()
                .ok_or_else(|| "row is not a string".to_string())
                .and_then(|row| parse_row(&key, row));

            match parsed {
                Ok(record) if section.contains(&record.id) => {}
                Ok(record) => section.papers.push(record),
                Err(reason) => {
                    skipped += 1;
                    warn!(topic = %topic, id = %key, reason = %reason, "skipping legacy row");
                }
            }
        }
        section.sort_newest_first();
    }

    info!(
        topics = index.topics.len(),
        papers = index.paper_count(),
        skipped,
        "migrated legacy index"
    );
    Ok(index)
}

/// Parse one pre-rendered row. `key` is the map key the row was stored under.
fn parse_row(key: &str, row: &str) -> std::result::Result<PaperRecord, String> {
    let cells = split_cells(row.trim());

    // Leading empty cell, five columns, trailing remainder.
    if cells.len() < 7 || !cells[0].trim().is_empty() {
        return Err(format!("expected 5 columns, found {}", cells.len().saturating_sub(2)));
    }

    let date_text = strip_bold(&cells[1]);
    let published = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
        .map_err(|e| format!("bad date '{date_text}': {e}"))?;

    let title = unescape(&strip_bold(&cells[2]));

    let (link_text, url) = LINK_RE
        .captures(&cells[3])
        .map(|c| (c[1].to_string(), c[2].trim().to_string()))
        .ok_or_else(|| format!("no paper link in '{}'", cells[3].trim()))?;

    let id = if key.trim().is_empty() {
        canonical_id(&link_text).to_string()
    } else {
        canonical_id(key).to_string()
    };

    let code_url = LINK_RE
        .captures(&cells[4])
        .map(|c| c[2].trim().to_string())
        .filter(|u| !u.is_empty() && u != "null");

    // The abstract column is everything up to the closing pipe.
    let abstract_cells = &cells[5..cells.len() - 1];
    let abstract_text = unescape(&strip_bold(&abstract_cells.join("|")));

    Ok(PaperRecord {
        id,
        title,
        authors: Vec::new(),
        abstract_text,
        published_date: published,
        updated_date: published,
        url: canonical_url(&url),
        primary_category: None,
        comment: None,
        code_url,
        summary: None,
    })
}

/// Split a row on unescaped `|`.
fn split_cells(row: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut prev = '\0';

    for c in row.chars() {
        if c == '|' && prev != '\\' {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        prev = c;
    }
    cells.push(current);
    cells
}

fn strip_bold(cell: &str) -> String {
    cell.replace("**", "").trim().to_string()
}

fn unescape(cell: &str) -> String {
    cell.replace(r"\|", "|")
}

/// Drop a version suffix from an abstract-page URL.
fn canonical_url(url: &str) -> String {
    match url.rsplit_once("/abs/") {
        Some((base, id)) => format!("{base}/abs/{}", canonical_id(id)),
        None => url.to_string(),
    }
}
