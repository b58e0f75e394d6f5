use crate::commands::Out;
use crate::{Config, CsvSource, Result, RunSummary, Store, Syncer};
use std::path::Path;
use tracing::debug;

/// Runs one reconciliation pass from the export directory into the store.
pub async fn sync(config: Config, source_dir: Option<&Path>) -> Result<Out<RunSummary>> {
    let store = Store::load(config.sqlite_path()).await?;
    let dir = source_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.source_dir());
    debug!("Syncing from {}", dir.display());

    let source = CsvSource::new(dir);
    let syncer = Syncer::new(store);
    let summary = syncer.run(&source).await?;
    Ok(Out::new(summary.to_string(), summary))
}
