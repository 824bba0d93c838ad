//! Building blocks shared by every arxiv-daily crate.
//!
//! The paper index data model lives in [`types`], the TOML configuration
//! in [`config`], and [`ArxivDailyError`] is the error type returned by all
//! library code.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, CONFIG_FILE_NAME, CodeLinksConfig, FetchConfig, PublishConfig, PublishTarget,
    SummarizerConfig, TopicConfig, init_config, load_config, load_config_from, resolve_api_key,
    validate_config,
};
pub use error::{ArxivDailyError, Result};
pub use types::{CURRENT_SCHEMA_VERSION, PaperIndex, PaperRecord, TopicSection, canonical_id};
