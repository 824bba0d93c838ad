//! Atom feed parsing for arxiv query responses.
//!
//! The arxiv API answers every query with an Atom document. Only the entry
//! fields needed for a [`PaperRecord`] are deserialized; everything else in
//! the feed is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use arxivdaily_shared::{ArxivDailyError, PaperRecord, Result, canonical_id};

/// Root `<feed>` element.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

/// One `<entry>` element.
///
/// `published` is optional because arxiv reports query errors as an entry
/// that carries only `id`, `title`, `summary` and `updated`.
#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: Option<DateTime<Utc>>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(
        rename = "primary_category",
        alias = "arxiv:primary_category",
        default
    )]
    primary_category: Option<Category>,
    #[serde(rename = "comment", alias = "arxiv:comment", default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: String,
}

impl Entry {
    fn is_api_error(&self) -> bool {
        self.id.contains("/api/errors")
    }

    fn into_record(self, abs_base_url: &str) -> Result<PaperRecord> {
        let short_id = self
            .id
            .rsplit_once("/abs/")
            .map(|(_, id)| id)
            .unwrap_or(self.id.as_str());
        let id = canonical_id(short_id).to_string();

        let published = self.published.ok_or_else(|| {
            ArxivDailyError::parse(format!("entry {id} has no <published> date"))
        })?;
        let updated = self.updated.unwrap_or(published);

        let url = format!("{abs_base_url}abs/{id}");

        Ok(PaperRecord {
            title: collapse_whitespace(&self.title),
            authors: self
                .authors
                .into_iter()
                .map(|a| collapse_whitespace(&a.name))
                .collect(),
            abstract_text: collapse_whitespace(&self.summary),
            published_date: published.date_naive(),
            updated_date: updated.date_naive(),
            url,
            primary_category: self.primary_category.map(|c| c.term),
            comment: self
                .comment
                .map(|c| collapse_whitespace(&c))
                .filter(|c| !c.is_empty()),
            code_url: None,
            summary: None,
            id,
        })
    }
}

/// Parse an arxiv Atom response into paper records, in feed order.
///
/// `abs_base_url` must end with `/`. An error entry in the feed is reported
/// as [`ArxivDailyError::Network`] since it describes a rejected request.
pub fn parse_feed(xml: &str, abs_base_url: &str) -> Result<Vec<PaperRecord>> {
    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| ArxivDailyError::parse(format!("invalid Atom feed: {e}")))?;

    if let Some(err) = feed.entries.iter().find(|e| e.is_api_error()) {
        return Err(ArxivDailyError::Network(format!(
            "arxiv API error: {}",
            collapse_whitespace(&err.summary)
        )));
    }

    feed.entries
        .into_iter()
        .map(|e| e.into_record(abs_base_url))
        .collect()
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
