//! CLI command implementations.

pub(crate) mod index;
pub(crate) mod search;
pub(crate) mod show;
pub(crate) mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_site::{ChunkerConfig, DocumentMeta, DocumentStore, StoreConfig};
use folio_storage::FsStorage;

use crate::error::CliError;

pub(crate) use index::IndexArgs;
pub(crate) use search::SearchArgs;
pub(crate) use show::ShowArgs;
pub(crate) use watch::WatchArgs;

/// Source and configuration options shared by every command.
#[derive(Args)]
pub(crate) struct SourceArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long, env = "FOLIO_SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Public web root for `/`-rooted images (overrides config).
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Minimum characters per text chunk (overrides config).
    #[arg(long)]
    min_chunk_size: Option<usize>,
}

impl SourceArgs {
    /// Load configuration with these options applied on top.
    pub(crate) fn load_config(&self, watch_enabled: Option<bool>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            public_dir: self.public_dir.clone(),
            watch_enabled,
            min_chunk_size: self.min_chunk_size,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Store settings derived from configuration.
pub(crate) fn store_config(config: &Config) -> StoreConfig {
    StoreConfig {
        chunker: ChunkerConfig {
            min_chunk_size: config.chunks.min_chunk_size,
            lqip_width: config.chunks.lqip_width,
            lqip_quality: config.chunks.lqip_quality,
        },
        public_dir: Some(config.docs_resolved.public_dir.clone()),
        words_per_minute: config.reading.words_per_minute,
        summary_length: config.reading.summary_length,
    }
}

/// Build a store over the configured source directory and index it.
pub(crate) fn open_store(config: &Config) -> Result<Arc<DocumentStore>, CliError> {
    let storage = FsStorage::with_patterns(
        config.docs_resolved.source_dir.clone(),
        &config.watch.patterns,
    )?
    .with_debounce(Duration::from_millis(config.watch.debounce_ms));

    let store = Arc::new(DocumentStore::new(Arc::new(storage), store_config(config)));
    store.rescan_all();
    Ok(store)
}

/// One-line description of a document for listings.
pub(crate) fn describe(meta: &DocumentMeta) -> String {
    let date = meta.date.as_deref().unwrap_or("-");
    let mut line = format!("{date:<12} {:<32} {}", meta.slug, meta.title);
    if !meta.tags.is_empty() {
        line.push_str(&format!(" [{}]", meta.tags.join(", ")));
    }
    line
}
