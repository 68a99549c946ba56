//! `folio watch` command implementation.

use std::time::Duration;

use clap::Args;

use super::{SourceArgs, open_store};
use crate::error::CliError;
use crate::output::Output;

/// How often the store version is checked for changes to report.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    source: SourceArgs,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or watching cannot start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.source.load_config(None)?;

        output.info(&format!(
            "Source directory: {}",
            config.docs_resolved.source_dir.display()
        ));
        let store = open_store(&config)?;
        output.success(&format!(
            "Indexed {} document(s), version {}",
            store.len(),
            store.version()
        ));

        if !config.watch.enabled {
            output.warning("Watching is disabled in configuration ([watch] enabled = false)");
            return Ok(());
        }

        store.start_watch()?;
        output.info("Watching for changes (press Ctrl-C to stop)");

        let mut interval = tokio::time::interval(POLL_INTERVAL);
        let mut last_version = store.version();
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    break;
                }
                _ = interval.tick() => {
                    let version = store.version();
                    if version != last_version {
                        last_version = version;
                        output.info(&format!(
                            "Updated: version {version}, {} document(s)",
                            store.len()
                        ));
                    }
                }
            }
        }

        store.stop_watch();
        tracing::info!("Watch stopped");
        output.success("Stopped watching");
        Ok(())
    }
}
