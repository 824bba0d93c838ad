//! Output targets: rendering indexes and writing JSON + markdown files.
//!
//! Outputs are prepared in memory for every target before anything is
//! written, so a failure while preparing leaves all files untouched.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument};

use arxivdaily_markdown::RenderOptions;
use arxivdaily_shared::{AppConfig, ArxivDailyError, PaperIndex, PublishTarget, Result};
use arxivdaily_storage::WriteOutcome;

/// A publish target with paths resolved against the working root.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Target name (`readme`, `gitpage`).
    pub name: &'static str,
    pub json_path: PathBuf,
    pub md_path: PathBuf,
    pub style: PublishTarget,
}

/// A file's full new content, ready to be written.
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub path: PathBuf,
    pub content: String,
}

/// What happened to one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Enabled targets from the config, with relative paths joined onto `root`.
///
/// Errors when no target is enabled.
pub fn resolve_targets(config: &AppConfig, root: &Path) -> Result<Vec<ResolvedTarget>> {
    let targets: Vec<ResolvedTarget> = config
        .publish
        .enabled_targets()
        .into_iter()
        .map(|(name, target)| ResolvedTarget {
            name,
            json_path: root.join(&target.json_path),
            md_path: root.join(&target.md_path),
            style: target.clone(),
        })
        .collect();

    if targets.is_empty() {
        return Err(ArxivDailyError::config("no publish target is enabled"));
    }
    Ok(targets)
}

/// Load the index of every target, in target order.
pub fn load_indexes(targets: &[ResolvedTarget]) -> Result<Vec<PaperIndex>> {
    targets
        .iter()
        .map(|t| arxivdaily_storage::load_index(&t.json_path))
        .collect()
}

/// Encode the index and render its markdown for one target.
pub fn prepare(
    target: &ResolvedTarget,
    index: &PaperIndex,
    today: NaiveDate,
) -> Result<[PreparedFile; 2]> {
    let json = arxivdaily_storage::encode_index(index)?;
    let opts = RenderOptions::for_target(&target.style, today);
    let markdown = arxivdaily_markdown::render_index(index, &opts);

    Ok([
        PreparedFile {
            path: target.json_path.clone(),
            content: json,
        },
        PreparedFile {
            path: target.md_path.clone(),
            content: markdown,
        },
    ])
}

/// Write every prepared file atomically, skipping unchanged ones.
pub fn write_all(files: Vec<PreparedFile>) -> Result<Vec<FileReport>> {
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let outcome = arxivdaily_storage::write_atomic(&file.path, &file.content)?;
        info!(path = %file.path.display(), ?outcome, "output file");
        reports.push(FileReport {
            path: file.path,
            outcome,
        });
    }

    Ok(reports)
}

/// Re-render markdown for every enabled target from its JSON index.
///
/// No network access. Indexes loaded from the legacy format are rewritten
/// in the current format.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn render_all(config: &AppConfig, root: &Path, today: NaiveDate) -> Result<Vec<FileReport>> {
    let targets = resolve_targets(config, root)?;
    let indexes = load_indexes(&targets)?;

    let mut files = Vec::new();
    for (target, index) in targets.iter().zip(&indexes) {
        files.extend(prepare(target, index, today)?);
    }

    write_all(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("arxivdaily_publish_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn targets_resolve_under_root() {
        let root = temp_root();
        let targets = resolve_targets(&AppConfig::default(), &root).unwrap();

        let names: Vec<&str> = targets.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["readme", "gitpage"]);
        assert_eq!(targets[0].md_path, root.join("README.md"));
        assert_eq!(targets[1].json_path, root.join("docs/ai-arxiv-daily-web.json"));
    }

    #[test]
    fn no_enabled_target_is_an_error() {
        let mut config = AppConfig::default();
        config.publish.readme.enabled = false;
        config.publish.gitpage.enabled = false;
        let err = resolve_targets(&config, Path::new(".")).unwrap_err();
        assert!(matches!(err, ArxivDailyError::Config { .. }));
    }

    #[test]
    fn render_all_migrates_legacy_and_is_idempotent() {
        let root = temp_root();
        let mut config = AppConfig::default();
        config.publish.gitpage.enabled = false;

        let json_path = root.join(&config.publish.readme.json_path);
        std::fs::create_dir_all(json_path.parent().unwrap()).unwrap();
        std::fs::copy("../../../fixtures/json/legacy-index.json", &json_path).unwrap();

        let first = render_all(&config, &root, today()).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|r| r.outcome == WriteOutcome::Written));

        let json = std::fs::read_to_string(&json_path).unwrap();
        assert!(json.contains("\"schema_version\": 1"));

        let md = std::fs::read_to_string(root.join("README.md")).unwrap();
        assert!(md.starts_with("## Updated on 2024.01.05\n"));
        assert!(md.contains("## NeRF"));
        assert!(md.contains("**[link](https://github.com/example/sparse-nerf)**"));

        let second = render_all(&config, &root, today()).unwrap();
        assert!(second.iter().all(|r| r.outcome == WriteOutcome::Unchanged));
    }
}
