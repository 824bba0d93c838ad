//! Core domain types for the paper index.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Current schema version for the JSON index format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Paper identifiers
// ---------------------------------------------------------------------------

/// Strip the version suffix from an arxiv identifier.
///
/// `2108.09112v1` → `2108.09112`, `math.GT/0309136v2` → `math.GT/0309136`.
/// Identifiers without a version are returned unchanged.
pub fn canonical_id(raw: &str) -> &str {
    static VERSION_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"v\d+$").expect("valid regex"));

    let trimmed = raw.trim();
    match VERSION_RE.find(trimmed) {
        Some(m) => &trimmed[..m.start()],
        None => trimmed,
    }
}

// ---------------------------------------------------------------------------
// PaperRecord
// ---------------------------------------------------------------------------

/// A single paper in the index.
///
/// Immutable once written, except that `code_url` may be filled in later by
/// the update-links pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// arxiv identifier without version suffix. Uniqueness key.
    pub id: String,
    /// Paper title, whitespace-collapsed.
    pub title: String,
    /// Authors in listed order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Abstract, whitespace-collapsed.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// First submission date.
    pub published_date: NaiveDate,
    /// Date of the latest version at fetch time.
    pub updated_date: NaiveDate,
    /// Canonical abstract page URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    /// Author comment from arxiv (venue, page count, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Official source-code repository, if known.
    #[serde(default)]
    pub code_url: Option<String>,
    /// Generated summary of the abstract.
    #[serde(default)]
    pub summary: Option<String>,
}

impl PaperRecord {
    /// The text shown for this paper in rendered tables: summary when
    /// available, otherwise the abstract.
    pub fn display_text(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.abstract_text)
    }

    /// First listed author, if any.
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// TopicSection / PaperIndex
// ---------------------------------------------------------------------------

/// Papers collected under one topic query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSection {
    /// Topic name (also used as markdown heading).
    pub name: String,
    /// Papers, newest first.
    #[serde(default)]
    pub papers: Vec<PaperRecord>,
}

impl TopicSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            papers: Vec::new(),
        }
    }

    /// Whether a paper with this id is already in the section.
    pub fn contains(&self, id: &str) -> bool {
        self.papers.iter().any(|p| p.id == id)
    }

    /// Order papers by `published_date` descending, ties by `id` descending.
    pub fn sort_newest_first(&mut self) {
        self.papers.sort_by(|a, b| {
            b.published_date
                .cmp(&a.published_date)
                .then_with(|| b.id.cmp(&a.id))
        });
    }
}

/// Root structure of a persisted JSON index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperIndex {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Topic sections in display order.
    #[serde(default)]
    pub topics: Vec<TopicSection>,
}

impl Default for PaperIndex {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            topics: Vec::new(),
        }
    }
}

impl PaperIndex {
    /// Look up a topic section by name.
    pub fn section(&self, name: &str) -> Option<&TopicSection> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Get a topic section by name, appending an empty one if missing.
    pub fn section_mut(&mut self, name: &str) -> &mut TopicSection {
        let pos = match self.topics.iter().position(|t| t.name == name) {
            Some(pos) => pos,
            None => {
                self.topics.push(TopicSection::new(name));
                self.topics.len() - 1
            }
        };
        &mut self.topics[pos]
    }

    /// Whether `topic` already holds a paper with `id`.
    pub fn contains(&self, topic: &str, id: &str) -> bool {
        self.section(topic).is_some_and(|s| s.contains(id))
    }

    /// Total number of records across all sections.
    pub fn paper_count(&self) -> usize {
        self.topics.iter().map(|t| t.papers.len()).sum()
    }
}
