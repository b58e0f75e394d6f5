//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::{Config, Store};
use tempfile::TempDir;

/// Test environment that sets up a mesa home directory with Config and an
/// initialized store. Holds the TempDir to keep the directory alive for the
/// duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
    store: Store,
}

impl TestEnv {
    /// Creates a test environment with Config and initialized database.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("mesa");
        let config = Config::create(&root, None).await.unwrap();
        let store = Store::load(config.sqlite_path()).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
            store,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Returns a handle to the store (handles share one connection pool).
    pub fn store(&self) -> Store {
        self.store.clone()
    }
}
