//! Pipeline orchestration for arxiv-daily.
//!
//! This crate ties together the arxiv client, the JSON index store and the
//! markdown renderer into the end-to-end runs driven by the CLI: the daily
//! update ([`pipeline::run_daily`]), the code-link refresh
//! ([`update::update_links`]) and the offline re-render
//! ([`publish::render_all`]).

pub mod merge;
pub mod pipeline;
pub mod publish;
pub mod summarizer;
pub mod update;
