//! Persistence of paper indexes and rendered outputs.
//!
//! Indexes are stored as pretty-printed JSON. Loading accepts both the
//! current `{schema_version, topics}` document and the legacy
//! `{topic: {id: row}}` map, which is migrated on the fly.
//!
//! All writes go through [`write_atomic`]: content is written to a temp
//! file next to the target and renamed into place, and a file whose
//! SHA-256 already matches the new content is left untouched.

mod migrations;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use arxivdaily_shared::{ArxivDailyError, CURRENT_SCHEMA_VERSION, PaperIndex, Result};

/// Result of a [`write_atomic`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or its content changed.
    Written,
    /// The file already held identical content.
    Unchanged,
}

// ---------------------------------------------------------------------------
// Index load / encode
// ---------------------------------------------------------------------------

/// Load an index from `path`.
///
/// A missing or empty (whitespace-only) file yields an empty index.
pub fn load_index(path: &Path) -> Result<PaperIndex> {
    if !path.exists() {
        debug!(?path, "index file not found, starting empty");
        return Ok(PaperIndex::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ArxivDailyError::io(path, e))?;
    let index = parse_index(&content).map_err(|e| match e {
        ArxivDailyError::Parse { message } => {
            ArxivDailyError::parse(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;

    debug!(
        ?path,
        topics = index.topics.len(),
        papers = index.paper_count(),
        "index loaded"
    );
    Ok(index)
}

/// Parse index JSON in either the current or the legacy format.
///
/// Sections come back with unique ids, newest first.
pub fn parse_index(content: &str) -> Result<PaperIndex> {
    if content.trim().is_empty() {
        return Ok(PaperIndex::default());
    }

    let value: Value = serde_json::from_str(content)
        .map_err(|e| ArxivDailyError::parse(format!("invalid index JSON: {e}")))?;

    let Value::Object(doc) = value else {
        return Err(ArxivDailyError::parse("index JSON must be an object"));
    };

    match doc.get("schema_version") {
        Some(version) => {
            let version = version.as_u64().ok_or_else(|| {
                ArxivDailyError::parse("schema_version must be a non-negative integer")
            })?;
            if version > u64::from(CURRENT_SCHEMA_VERSION) {
                return Err(ArxivDailyError::validation(format!(
                    "index schema version {version} is newer than supported version {CURRENT_SCHEMA_VERSION}"
                )));
            }
            let mut index: PaperIndex = serde_json::from_value(Value::Object(doc))
                .map_err(|e| ArxivDailyError::parse(format!("invalid index: {e}")))?;
            normalize(&mut index);
            Ok(index)
        }
        None => {
            info!("legacy index format detected, migrating");
            migrations::migrate_legacy(doc)
        }
    }
}

/// Drop repeated ids within each section (first one wins) and re-sort.
///
/// Hand-edited or merge-resolved files may break both section invariants.
fn normalize(index: &mut PaperIndex) {
    for section in &mut index.topics {
        let mut seen = HashSet::new();
        let before = section.papers.len();
        section.papers.retain(|p| seen.insert(p.id.clone()));
        let dropped = before - section.papers.len();
        if dropped > 0 {
            warn!(topic = %section.name, dropped, "dropped duplicate ids from index");
        }
        section.sort_newest_first();
    }
}

/// Serialize an index as pretty JSON with a trailing newline.
pub fn encode_index(index: &PaperIndex) -> Result<String> {
    let mut json = serde_json::to_string_pretty(index)
        .map_err(|e| ArxivDailyError::parse(format!("failed to encode index: {e}")))?;
    json.push('\n');
    Ok(json)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Hex-encoded SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write `content` to `path` via temp file + rename.
///
/// Parent directories are created as needed. If the existing file hashes
/// to the same value, nothing is written.
pub fn write_atomic(path: &Path, content: &str) -> Result<WriteOutcome> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        if content_hash(&existing) == content_hash(content) {
            debug!(?path, "content unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent).map_err(|e| ArxivDailyError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| ArxivDailyError::validation(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let temp = match parent {
        Some(parent) => parent.join(format!(".{file_name}.tmp")),
        None => PathBuf::from(format!(".{file_name}.tmp")),
    };

    std::fs::write(&temp, content).map_err(|e| ArxivDailyError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ArxivDailyError::io(path, e))?;

    debug!(?path, size = content.len(), "wrote file");
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;

    use arxivdaily_shared::{PaperRecord, TopicSection};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("arxivdaily_storage_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_index() -> PaperIndex {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut section = TopicSection::new("NeRF");
        section.papers.push(PaperRecord {
            id: "2401.00001".into(),
            title: "Radiance Fields in the Wild".into(),
            authors: vec!["Carol White".into()],
            abstract_text: "We study radiance fields.".into(),
            published_date: date,
            updated_date: date,
            url: "http://arxiv.org/abs/2401.00001".into(),
            primary_category: None,
            comment: None,
            code_url: None,
            summary: None,
        });
        PaperIndex {
            schema_version: CURRENT_SCHEMA_VERSION,
            topics: vec![section],
        }
    }

    #[test]
    fn missing_and_empty_files_are_empty_indexes() {
        let dir = temp_dir();
        let missing = load_index(&dir.join("nope.json")).unwrap();
        assert_eq!(missing, PaperIndex::default());

        let empty = dir.join("empty.json");
        std::fs::write(&empty, "  \n").unwrap();
        assert_eq!(load_index(&empty).unwrap(), PaperIndex::default());
    }

    #[test]
    fn current_format_roundtrip() {
        let index = sample_index();
        let json = encode_index(&index).unwrap();
        assert!(json.starts_with("{\n  \"schema_version\": 1,"));
        assert!(json.ends_with("}\n"));
        assert_eq!(parse_index(&json).unwrap(), index);
    }

    #[test]
    fn current_format_is_deduplicated_and_sorted() {
        let doc = r#"{
  "schema_version": 1,
  "topics": [
    {
      "name": "NeRF",
      "papers": [
        {"id": "2401.00001", "title": "First copy", "authors": [], "abstract": "A.",
         "published_date": "2024-01-01", "updated_date": "2024-01-01",
         "url": "http://arxiv.org/abs/2401.00001"},
        {"id": "2401.00001", "title": "Second copy", "authors": [], "abstract": "A.",
         "published_date": "2024-01-01", "updated_date": "2024-01-01",
         "url": "http://arxiv.org/abs/2401.00001"}
      ]
    },
    {
      "name": "Old",
      "papers": [
        {"id": "2401.00002", "title": "Older", "authors": [], "abstract": "B.",
         "published_date": "2024-01-01", "updated_date": "2024-01-01",
         "url": "http://arxiv.org/abs/2401.00002"},
        {"id": "2401.00003", "title": "Newer", "authors": [], "abstract": "C.",
         "published_date": "2024-01-05", "updated_date": "2024-01-05",
         "url": "http://arxiv.org/abs/2401.00003"}
      ]
    }
  ]
}"#;
        let index = parse_index(doc).unwrap();

        let nerf = index.section("NeRF").unwrap();
        assert_eq!(nerf.papers.len(), 1);
        assert_eq!(nerf.papers[0].title, "First copy");

        let ids: Vec<&str> = index
            .section("Old")
            .unwrap()
            .papers
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2401.00003", "2401.00002"]);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let err = parse_index(r#"{"schema_version": 99, "topics": []}"#).unwrap_err();
        assert!(matches!(err, ArxivDailyError::Validation { .. }));
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn non_object_is_parse_error() {
        assert!(matches!(
            parse_index("[1, 2]").unwrap_err(),
            ArxivDailyError::Parse { .. }
        ));
        assert!(matches!(
            parse_index("{not json").unwrap_err(),
            ArxivDailyError::Parse { .. }
        ));
    }

    #[test]
    fn legacy_fixture_is_migrated() {
        let index = load_index(Path::new("../../../fixtures/json/legacy-index.json"))
            .expect("load legacy fixture");

        let names: Vec<&str> = index.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["NeRF", "OCR"]);
        assert_eq!(index.paper_count(), 3);

        let nerf = index.section("NeRF").unwrap();
        assert_eq!(nerf.papers[0].id, "2401.00002");
        assert_eq!(
            nerf.papers[0].code_url.as_deref(),
            Some("https://github.com/example/sparse-nerf")
        );
        assert_eq!(nerf.papers[1].url, "http://arxiv.org/abs/2401.00001");
        assert!(nerf.papers[1].code_url.is_none());

        let ocr = index.section("OCR").unwrap();
        assert_eq!(
            ocr.papers[0].abstract_text,
            "Scene text recognition | detection benchmark."
        );
    }

    #[test]
    fn write_atomic_skips_identical_content() {
        let dir = temp_dir();
        let path = dir.join("nested").join("out.md");

        assert_eq!(write_atomic(&path, "hello\n").unwrap(), WriteOutcome::Written);
        assert_eq!(write_atomic(&path, "hello\n").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_atomic(&path, "changed\n").unwrap(), WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "changed\n");
        assert!(!dir.join("nested").join(".out.md.tmp").exists());
    }

    #[test]
    fn content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(content_hash("a").len(), 64);
    }
}
