//! Backing stores and seeding for datagen.
//!
//! [`SqliteStore`] persists locales and property tables; [`MemoryStore`]
//! answers the same lookups from memory. Seeds read CSV files and push
//! their values through the [`BulkUploader`].

pub mod errors;
pub mod memory;
pub mod seed;
pub mod sqlite;
pub mod upload;

pub use errors::{SeedError, SeedResult};
pub use memory::MemoryStore;
pub use seed::{CsvSpec, DEFAULT_SEED_WORKERS, SeedConfig, SeedReport, Seeder, parse_csv};
pub use sqlite::{Locale, SqliteStore, prop_table_name};
pub use upload::{BulkUploader, SeedRow, UploadReport};
