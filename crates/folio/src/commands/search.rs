//! `folio search` command implementation.

use clap::Args;

use super::{SourceArgs, describe, open_store};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the search command.
#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Search text, or `tag:<name>` for an exact tag match.
    query: String,

    /// Page number (1-based).
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Results per page.
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    #[command(flatten)]
    source: SourceArgs,
}

impl SearchArgs {
    /// Execute the search command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the source tree cannot be
    /// opened.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(None)?;
        let store = open_store(&config)?;

        let results = store.search_page(&self.query, self.page, self.page_size);
        if results.page.total == 0 {
            output.warning(&format!("No documents match '{}'", self.query));
            return Ok(());
        }

        for meta in &results.items {
            output.result(&describe(meta));
            if !meta.summary.is_empty() {
                output.result(&format!("    {}", output.dimmed(&meta.summary)));
            }
        }

        let page = results.page;
        output.info(&format!(
            "Page {}/{} ({} result(s))",
            page.page, page.total_pages, page.total
        ));
        if page.has_next {
            output.info(&format!("Next page: --page {}", page.page + 1));
        }
        Ok(())
    }
}
