use thiserror::Error;

use datagen_core::{RangeError, StoreError};

/// Errors emitted while binding or drawing from generators.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("parse error: {0}")]
    Parse(#[from] RangeError),
    #[error("filter matches nothing: select value from {table} where {column} = '{value}'")]
    EmptyResult {
        table: String,
        column: String,
        value: String,
    },
    #[error("not enough items for '{generator}', maximum unique retries reached ({retries})")]
    RetriesExhausted { generator: String, retries: u32 },
    #[error("{kind} '{name}' already registered")]
    RegistrationConflict { kind: &'static str, name: String },
    #[error("unknown generator type '{0}'")]
    UnknownType(String),
    #[error("unknown resource '{0}'")]
    UnknownResource(String),
    #[error("invalid arguments for '{generator}': {message}")]
    InvalidArguments { generator: String, message: String },
    #[error("cyclic union: {0}")]
    Cycle(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GeneratorError {
    pub(crate) fn invalid_arguments(generator: &str, message: impl Into<String>) -> Self {
        GeneratorError::InvalidArguments {
            generator: generator.to_string(),
            message: message.into(),
        }
    }

    /// Whether a resource failing with this error can be skipped while the
    /// remaining resources stay bound.
    pub fn is_binding_recoverable(&self) -> bool {
        !matches!(self, GeneratorError::RegistrationConflict { .. })
    }
}

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown resource '{0}'")]
    UnknownResource(String),
    #[error("failed to generate value #{round} of '{resource}': {source}")]
    Generation {
        resource: String,
        round: usize,
        #[source]
        source: GeneratorError,
    },
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
    #[error("value channel closed before every value was consumed")]
    ChannelClosed,
    #[error("pipeline task panicked: {0}")]
    TaskPanicked(String),
    #[error("generation cancelled")]
    Cancelled,
}
