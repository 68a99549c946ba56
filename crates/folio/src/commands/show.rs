//! `folio show` command implementation.

use clap::Args;

use super::{SourceArgs, open_store};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the show command.
#[derive(Args)]
pub(crate) struct ShowArgs {
    /// Document slug (source path without `.md`).
    slug: String,

    /// Print the chunk layout and chunk bodies instead of the full HTML.
    #[arg(long)]
    chunks: bool,

    /// Print as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    source: SourceArgs,
}

impl ShowArgs {
    /// Execute the show command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the document does not
    /// exist.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(None)?;
        let store = open_store(&config)?;

        let not_found = || CliError::NotFound(self.slug.clone());

        if self.chunks {
            let manifest = store.manifest(&self.slug).ok_or_else(not_found)?;
            if self.json {
                output.result(&serde_json::to_string_pretty(&manifest)?);
                return Ok(());
            }

            output.highlight(&manifest.meta.title);
            output.info(&format!("{} chunk(s)", manifest.total_chunks));
            for (index, kind) in manifest.chunk_types.iter().enumerate() {
                let placeholder = manifest.placeholder_ids[index]
                    .as_deref()
                    .map(|id| format!(" -> {id}"))
                    .unwrap_or_default();
                output.separator();
                output.info(&format!("#{index} {}{placeholder}", kind.as_str()));
                if let Some(body) = store.chunk(&self.slug, index) {
                    output.result(&body);
                }
            }
            return Ok(());
        }

        let document = store.get(&self.slug).ok_or_else(not_found)?;
        if self.json {
            output.result(&serde_json::to_string_pretty(&*document)?);
            return Ok(());
        }

        let meta = &document.meta;
        output.highlight(&meta.title);
        if let Some(date) = &meta.date {
            output.info(&format!("Date: {date}"));
        }
        if !meta.tags.is_empty() {
            output.info(&format!("Tags: {}", meta.tags.join(", ")));
        }
        output.info(&format!(
            "Visibility: {}, {} words, {}",
            meta.visibility.as_str(),
            meta.word_count,
            meta.reading_time
        ));
        output.separator();
        output.result(&document.content_html);
        Ok(())
    }
}
