use std::path::PathBuf;

use thiserror::Error;

use datagen_core::{SchedulerError, StoreError};

/// Errors raised while reading and uploading seeds.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("failed to read seed file '{path}': {message}")]
    Read { path: PathBuf, message: String },
    #[error("invalid CSV delimiter '{0}', expected a single ASCII character")]
    InvalidDelimiter(char),
    #[error("row {line} of '{source_name}' has no column #{column} (only {available} available)")]
    MissingColumn {
        source_name: String,
        line: u64,
        column: usize,
        available: usize,
    },
    #[error("{failed} insert(s) failed, first error: {first}")]
    Upload { failed: usize, first: String },
    #[error("there were errors while seeding:\n - {}", .0.join("\n - "))]
    Failed(Vec<String>),
}

pub type SeedResult<T> = Result<T, SeedError>;
