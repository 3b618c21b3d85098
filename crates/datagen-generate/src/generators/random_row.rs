use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::OnceCell;
use tracing::debug;

use datagen_core::{GeneratorOptions, ValueStore, validate_identifier};

use crate::errors::GeneratorError;
use crate::generators::{CacheGenerator, Trail, ValueSource};

pub const RANDOM_ROW: &str = "random_row";

/// Samples, with replacement, values of a filtered store table.
///
/// The rows are fetched once, on [`ValueSource::prepare`] or the first
/// draw, and kept in memory afterwards.
pub struct RandomRowSource {
    store: Arc<dyn ValueStore>,
    table: String,
    column: String,
    value: String,
    rows: OnceCell<Vec<String>>,
}

pub type RandomRowGenerator = CacheGenerator<RandomRowSource>;

impl RandomRowSource {
    pub fn new(
        store: Arc<dyn ValueStore>,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Self, GeneratorError> {
        Ok(Self {
            store,
            table: validate_identifier(table)?.to_string(),
            column: validate_identifier(column)?.to_string(),
            value: value.to_string(),
            rows: OnceCell::new(),
        })
    }

    /// Number of cached rows, `None` until they are loaded.
    pub fn cached_rows(&self) -> Option<usize> {
        self.rows.get().map(Vec::len)
    }

    async fn rows(&self) -> Result<&[String], GeneratorError> {
        let rows = self
            .rows
            .get_or_try_init(|| async {
                let rows = self
                    .store
                    .select_values(&self.table, &self.column, &self.value)
                    .await?;
                if rows.is_empty() {
                    return Err(GeneratorError::EmptyResult {
                        table: self.table.clone(),
                        column: self.column.clone(),
                        value: self.value.clone(),
                    });
                }
                debug!(
                    table = %self.table,
                    column = %self.column,
                    rows = rows.len(),
                    "cached random_row values"
                );
                Ok::<_, GeneratorError>(rows)
            })
            .await?;
        Ok(rows)
    }
}

impl RandomRowGenerator {
    pub fn new(
        options: Arc<GeneratorOptions>,
        store: Arc<dyn ValueStore>,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Self, GeneratorError> {
        let source = RandomRowSource::new(store, table, column, value)?;
        Ok(Self::wrap(RANDOM_ROW, options, source))
    }
}

#[async_trait]
impl ValueSource for RandomRowSource {
    async fn prepare(&self) -> Result<(), GeneratorError> {
        self.rows().await.map(|_| ())
    }

    async fn produce(&self, _trail: &mut Trail) -> Result<String, GeneratorError> {
        let rows = self.rows().await?;
        let index = rand::rng().random_range(0..rows.len());
        Ok(rows[index].clone())
    }
}
