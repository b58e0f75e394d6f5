use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the mesa home directory with its config file and SQLite store.
pub async fn init(home: &Path, source_dir: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(home, source_dir).await?;
    Ok(Out::new_message(format!(
        "Initialized mesa home at {} (exports read from {})",
        config.root().display(),
        config.source_dir().display()
    )))
}
