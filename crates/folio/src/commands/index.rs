//! `folio index` command implementation.

use clap::Args;

use super::{SourceArgs, describe, open_store};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the index command.
#[derive(Args)]
pub(crate) struct IndexArgs {
    #[command(flatten)]
    source: SourceArgs,
}

impl IndexArgs {
    /// Execute the index command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the source tree cannot be
    /// opened.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(None)?;

        output.highlight(&config.site.name);
        if let Some(description) = &config.site.description {
            output.info(description);
        }
        output.separator();
        output.info(&format!(
            "Source directory: {}",
            config.docs_resolved.source_dir.display()
        ));
        let store = open_store(&config)?;

        let listed = store.list_public();
        for meta in &listed {
            let chunks = store.manifest(&meta.slug).map_or(0, |m| m.total_chunks);
            output.result(&format!(
                "{} {}",
                describe(meta),
                output.dimmed(&format!("({chunks} chunks, {} words)", meta.word_count))
            ));
        }

        let total = store.len();
        if total > listed.len() {
            output.info(&format!(
                "{} document(s) not listed (unlisted or hidden)",
                total - listed.len()
            ));
        }
        output.success(&format!(
            "Indexed {total} document(s), version {}",
            store.version()
        ));
        Ok(())
    }
}
