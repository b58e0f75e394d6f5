pub mod args;
pub mod commands;
mod config;
mod db;
mod dedupe;
mod error;
mod mapper;
pub mod model;
pub mod report;
mod source;
mod sync;
#[cfg(test)]
mod test;
mod utils;

pub use config::Config;
pub use db::Store;
pub use error::Error;
pub use error::Result;
pub use source::{CsvSource, MemorySource, Source, SourceTable};
pub use sync::{KindSummary, RunSummary, Syncer};
