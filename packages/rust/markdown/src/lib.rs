//! Markdown rendering of the paper index.
//!
//! Turns a [`PaperIndex`] into the README / GitHub Pages markdown: an
//! "Updated on" heading, an optional table of contents, and one table per
//! non-empty topic.

mod cleanup;

use std::fmt::Write as _;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use arxivdaily_shared::{PaperIndex, PaperRecord, PublishTarget, TopicSection};

pub use cleanup::pretty_math;

/// Link shown under the heading of every rendered page.
const USAGE_LINE: &str = "> Usage instructions: [here](./docs/README.md#usage)\n\n";

const PLAIN_TABLE_HEADER: &str = "|Publish Date|Title|PDF|Code|Abstract|\n\
|---|---|---|---|--------------------------------------------------|\n";

const WEB_TABLE_HEADER: &str = "| Publish Date | Title | PDF | Code | Abstract |\n\
|:---------|:-----------------------|:------|:------|:-------------------------------------------------|\n";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options controlling the rendered layout.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit Jekyll front matter and the web table header.
    pub to_web: bool,
    /// Use an `## Updated on` heading and table headers.
    pub use_title: bool,
    /// Emit a collapsible table of contents.
    pub use_toc: bool,
    /// Emit a "back to top" link after each topic.
    pub back_to_top: bool,
    /// Date shown in the "Updated on" line.
    pub updated_on: NaiveDate,
}

impl RenderOptions {
    /// Layout for a repository README.
    pub fn readme(updated_on: NaiveDate) -> Self {
        Self {
            to_web: false,
            use_title: true,
            use_toc: true,
            back_to_top: true,
            updated_on,
        }
    }

    /// Layout for a GitHub Pages index.
    pub fn gitpage(updated_on: NaiveDate) -> Self {
        Self {
            to_web: true,
            use_title: true,
            use_toc: false,
            back_to_top: false,
            updated_on,
        }
    }

    /// Layout configured for a publish target.
    pub fn for_target(target: &PublishTarget, updated_on: NaiveDate) -> Self {
        Self {
            to_web: target.to_web,
            use_title: target.use_title,
            use_toc: target.use_toc,
            back_to_top: target.back_to_top,
            updated_on,
        }
    }

    /// `2024.01.02` style date used in headings.
    fn dotted_date(&self) -> String {
        self.updated_on.format("%Y.%m.%d").to_string()
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render the whole index as a markdown document.
#[instrument(skip_all, fields(topics = index.topics.len(), papers = index.paper_count()))]
pub fn render_index(index: &PaperIndex, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let date = opts.dotted_date();

    if opts.use_title && opts.to_web {
        out.push_str("---\nlayout: default\n---\n\n");
    }

    if opts.use_title {
        let _ = writeln!(out, "## Updated on {date}");
    } else {
        let _ = writeln!(out, "> Updated on {date}");
    }

    out.push_str(USAGE_LINE);

    let sections: Vec<&TopicSection> =
        index.topics.iter().filter(|t| !t.papers.is_empty()).collect();

    if opts.use_toc {
        out.push_str("<details>\n");
        out.push_str("  <summary>Table of Contents</summary>\n");
        out.push_str("  <ol>\n");
        for section in &sections {
            let _ = writeln!(
                out,
                "    <li><a href=#{}>{}</a></li>",
                anchor(&section.name),
                section.name
            );
        }
        out.push_str("  </ol>\n");
        out.push_str("</details>\n\n");
    }

    for section in &sections {
        let _ = writeln!(out, "## {}\n", section.name);

        if opts.use_title {
            out.push_str(if opts.to_web {
                WEB_TABLE_HEADER
            } else {
                PLAIN_TABLE_HEADER
            });
        }

        for paper in &section.papers {
            let row = if opts.to_web {
                render_web_row(paper)
            } else {
                render_row(paper)
            };
            out.push_str(&pretty_math(&row));
        }

        out.push('\n');

        if opts.back_to_top {
            let _ = writeln!(
                out,
                "<p align=right>(<a href={}>back to top</a>)</p>\n",
                back_to_top_anchor(&date)
            );
        }
    }

    debug!(len = out.len(), "index rendered");
    out
}

/// Render one table row (newline-terminated).
pub fn render_row(paper: &PaperRecord) -> String {
    let code = match &paper.code_url {
        Some(url) => format!("**[link]({url})**"),
        None => "null".to_string(),
    };

    format!(
        "|**{}**|**{}**|[{}]({})|{}|**{}**|\n",
        paper.published_date.format("%Y-%m-%d"),
        cleanup::clean_cell(&paper.title),
        paper.id,
        paper.url,
        code,
        cleanup::clean_cell(paper.display_text()),
    )
}

/// Web variant of [`render_row`]: the arxiv comment, when present, follows
/// the abstract cell on its own line.
pub fn render_web_row(paper: &PaperRecord) -> String {
    let row = render_row(paper);
    match paper.comment.as_deref().map(cleanup::clean_cell) {
        Some(comment) if !comment.is_empty() => {
            let body = row.trim_end_matches("|\n");
            format!("{body}<br>{comment}|\n")
        }
        _ => row,
    }
}

/// Heading anchor for a topic name: lowercased, spaces replaced with `-`.
pub fn anchor(name: &str) -> String {
    name.replace(' ', "-").to_lowercase()
}

/// Anchor of the `## Updated on <date>` heading.
fn back_to_top_anchor(dotted_date: &str) -> String {
    format!("#Updated on {dotted_date}")
        .replace(' ', "-")
        .replace('.', "")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paper(id: &str, day: u32) -> PaperRecord {
        PaperRecord {
            id: id.into(),
            title: format!("Paper {id}"),
            authors: vec!["Alice".into()],
            abstract_text: "Line one\nline two.".into(),
            published_date: date(2024, 1, day),
            updated_date: date(2024, 1, day),
            url: format!("http://arxiv.org/abs/{id}"),
            primary_category: None,
            comment: None,
            code_url: None,
            summary: None,
        }
    }

    fn sample_index() -> PaperIndex {
        let mut index = PaperIndex::default();
        let nerf = index.section_mut("NeRF");
        let mut with_code = paper("2401.00002", 2);
        with_code.code_url = Some("https://github.com/example/nerf".into());
        nerf.papers.push(with_code);
        nerf.papers.push(paper("2401.00001", 1));
        index.section_mut("Empty Topic");
        index
            .section_mut("Model Compression")
            .papers
            .push(paper("2401.00003", 3));
        index
    }

    #[test]
    fn row_without_code_link() {
        let row = render_row(&paper("2401.00001", 1));
        assert_eq!(
            row,
            "|**2024-01-01**|**Paper 2401.00001**|[2401.00001](http://arxiv.org/abs/2401.00001)|null|**Line one line two.**|\n"
        );
    }

    #[test]
    fn row_with_code_link_and_summary() {
        let mut p = paper("2401.00002", 2);
        p.code_url = Some("https://github.com/example/nerf".into());
        p.summary = Some("A short summary.".into());
        let row = render_row(&p);
        assert!(row.contains("|**[link](https://github.com/example/nerf)**|"));
        assert!(row.ends_with("|**A short summary.**|\n"));
    }

    #[test]
    fn web_row_appends_comment() {
        let mut p = paper("2401.00001", 1);
        assert_eq!(render_web_row(&p), render_row(&p));

        p.comment = Some("CVPR 2024 | 12 pages".into());
        let row = render_web_row(&p);
        assert!(row.ends_with("|**Line one line two.**<br>CVPR 2024 \\| 12 pages|\n"));

        let mut index = PaperIndex::default();
        index.section_mut("NeRF").papers.push(p);
        let web = render_index(&index, &RenderOptions::gitpage(date(2024, 1, 5)));
        let readme = render_index(&index, &RenderOptions::readme(date(2024, 1, 5)));
        assert!(web.contains("<br>CVPR 2024"));
        assert!(!readme.contains("CVPR 2024"));
    }

    #[test]
    fn readme_layout() {
        let md = render_index(&sample_index(), &RenderOptions::readme(date(2024, 1, 5)));

        assert!(md.starts_with("## Updated on 2024.01.05\n"));
        assert!(md.contains(USAGE_LINE));
        assert!(md.contains("<details>\n  <summary>Table of Contents</summary>"));
        assert!(md.contains("    <li><a href=#nerf>NeRF</a></li>\n"));
        assert!(md.contains("<a href=#model-compression>Model Compression</a>"));
        assert!(md.contains("## NeRF\n\n|Publish Date|Title|PDF|Code|Abstract|\n"));
        assert!(md.contains(
            "<p align=right>(<a href=#updated-on-20240105>back to top</a>)</p>\n\n"
        ));
        assert!(!md.contains("layout: default"));
    }

    #[test]
    fn gitpage_layout() {
        let md = render_index(&sample_index(), &RenderOptions::gitpage(date(2024, 1, 5)));

        assert!(md.starts_with("---\nlayout: default\n---\n\n## Updated on 2024.01.05\n"));
        assert!(md.contains("| Publish Date | Title | PDF | Code | Abstract |\n"));
        assert!(!md.contains("<details>"));
        assert!(!md.contains("back to top"));
    }

    #[test]
    fn empty_sections_are_skipped() {
        let md = render_index(&sample_index(), &RenderOptions::readme(date(2024, 1, 5)));
        assert!(!md.contains("Empty Topic"));
    }

    #[test]
    fn rows_keep_index_order() {
        let md = render_index(&sample_index(), &RenderOptions::readme(date(2024, 1, 5)));
        let second = md.find("[2401.00002]").unwrap();
        let first = md.find("[2401.00001]").unwrap();
        assert!(second < first);
    }

    #[test]
    fn untitled_layout_uses_quote_heading() {
        let opts = RenderOptions {
            to_web: false,
            use_title: false,
            use_toc: false,
            back_to_top: false,
            updated_on: date(2024, 2, 29),
        };
        let md = render_index(&sample_index(), &opts);
        assert!(md.starts_with("> Updated on 2024.02.29\n"));
        assert!(!md.contains("|Publish Date|"));
    }

    #[test]
    fn empty_index_renders_header_only() {
        let md = render_index(&PaperIndex::default(), &RenderOptions::gitpage(date(2024, 1, 5)));
        assert_eq!(
            md,
            format!("---\nlayout: default\n---\n\n## Updated on 2024.01.05\n{USAGE_LINE}")
        );
    }

    #[test]
    fn anchors() {
        assert_eq!(anchor("3D/CG"), "3d/cg");
        assert_eq!(anchor("6DOF Object Pose"), "6dof-object-pose");
        assert_eq!(back_to_top_anchor("2024.01.05"), "#updated-on-20240105");
    }
}
