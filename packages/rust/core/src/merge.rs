//! Merging fetched papers into an index.

use std::collections::HashSet;

use chrono::NaiveDate;

use arxivdaily_shared::{PaperIndex, PaperRecord};

/// Keep only papers that are not yet in `topic` of every given index,
/// and that were published on or after `since` (when set).
///
/// Duplicates within `fetched` are dropped as well; the first occurrence
/// wins. Feed order is preserved.
pub fn select_new(
    fetched: Vec<PaperRecord>,
    topic: &str,
    indexes: &[&PaperIndex],
    since: Option<NaiveDate>,
) -> Vec<PaperRecord> {
    let mut seen = HashSet::new();

    fetched
        .into_iter()
        .filter(|p| since.is_none_or(|since| p.published_date >= since))
        .filter(|p| indexes.is_empty() || indexes.iter().any(|i| !i.contains(topic, &p.id)))
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

/// Merge `papers` into the `topic` section of `index`.
///
/// Papers whose id is already present are ignored; existing records are
/// never modified. The section is re-sorted newest first afterwards.
/// Returns the number of records added.
pub fn merge_topic(index: &mut PaperIndex, topic: &str, papers: &[PaperRecord]) -> usize {
    let section = index.section_mut(topic);
    let mut added = 0;

    for paper in papers {
        if section.contains(&paper.id) {
            continue;
        }
        section.papers.push(paper.clone());
        added += 1;
    }

    section.sort_newest_first();
    added
}
