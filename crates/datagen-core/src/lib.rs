//! Core contracts and helpers for datagen.
//!
//! This crate defines the range grammar used by the numeric and pattern
//! generators, the options shared by every generator, the contract of the
//! backing value store, and the worker-pool scheduler used for bulk writes.

pub mod error;
pub mod options;
pub mod range;
pub mod scheduler;
pub mod store;

pub use error::{RangeError, SchedulerError, StoreError};
pub use options::GeneratorOptions;
pub use range::{BoundedRange, DiscreteSet, Range, RangeToken, find_range_tokens, parse_range};
pub use scheduler::{Handler, HandlerFuture, Scheduler, Task, TaskResult, Worker, handler};
pub use store::{ValueStore, validate_identifier};
