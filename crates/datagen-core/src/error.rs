use thiserror::Error;

/// Errors raised while parsing range expressions and pattern templates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// A token that should be a base-10 integer is not.
    #[error("invalid integer '{token}' in range '{expr}'")]
    InvalidNumber { expr: String, token: String },
    /// The expression does not follow `min..max[!e1|e2]` or `v1|v2|...`.
    #[error("invalid range '{0}', expected 'min..max', 'min..max!excl|...' or 'v1|v2|...'")]
    Malformed(String),
    /// `min` is not strictly lower than `max`.
    #[error("empty range '{0}', min must be lower than max")]
    Empty(String),
    /// Every value between `min` and `max` is excluded.
    #[error("range '{0}' excludes every value it contains")]
    FullyExcluded(String),
}

/// Errors emitted by the worker-pool scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler needs at least one worker")]
    NoWorkers,
    #[error("worker {worker_id} panicked: {message}")]
    WorkerPanicked { worker_id: usize, message: String },
    #[error("scheduler run cancelled")]
    Cancelled,
}

/// Errors returned by backing store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(String),
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("unknown table '{0}'")]
    UnknownTable(String),
}
