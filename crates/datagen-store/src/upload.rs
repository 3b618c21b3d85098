//! Transactional bulk insertion of seed values.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::{Sqlite, Transaction};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use datagen_core::{Scheduler, StoreError, handler, validate_identifier};

use crate::errors::{SeedError, SeedResult};
use crate::sqlite::{SqliteStore, existing_values, insert_prop};

/// Value to insert, with the locale it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRow {
    pub locale_id: i64,
    pub value: String,
}

impl SeedRow {
    pub fn new(locale_id: i64, value: impl Into<String>) -> Self {
        Self {
            locale_id,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub total: usize,
    pub skipped: usize,
    pub inserted: usize,
}

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Sqlite>>>>;

/// Inserts values of one property type, skipping the ones already present.
///
/// Inserts are spread over the worker pool but share a single transaction,
/// so either every fresh value lands or none does.
#[derive(Debug, Clone)]
pub struct BulkUploader {
    store: SqliteStore,
    table: String,
    prop_type: String,
    workers: usize,
    cancel: CancellationToken,
}

impl BulkUploader {
    pub fn new(
        store: SqliteStore,
        table: &str,
        prop_type: &str,
        workers: usize,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            store,
            table: validate_identifier(table)?.to_string(),
            prop_type: prop_type.to_string(),
            workers,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub async fn upload(&self, rows: Vec<SeedRow>) -> SeedResult<UploadReport> {
        let total = rows.len();
        let mut tx = self.store.begin().await?;

        let mut known: HashSet<String> =
            existing_values(&mut tx, &self.table, &self.prop_type)
                .await?
                .into_iter()
                .map(|value| value.to_lowercase())
                .collect();
        debug!(
            table = %self.table,
            prop_type = %self.prop_type,
            existing = known.len(),
            "loaded existing values"
        );
        let fresh: Vec<SeedRow> = rows
            .into_iter()
            .filter(|row| known.insert(row.value.to_lowercase()))
            .collect();
        let report = UploadReport {
            total,
            skipped: total - fresh.len(),
            inserted: fresh.len(),
        };
        if fresh.is_empty() {
            tx.commit().await.map_err(|err| StoreError::Db(err.to_string()))?;
            return Ok(report);
        }

        let shared: SharedTransaction = Arc::new(Mutex::new(Some(tx)));
        let insert = {
            let shared = Arc::clone(&shared);
            let table: Arc<str> = Arc::from(self.table.as_str());
            let prop_type: Arc<str> = Arc::from(self.prop_type.as_str());
            handler(move |row: SeedRow| {
                let shared = Arc::clone(&shared);
                let table = Arc::clone(&table);
                let prop_type = Arc::clone(&prop_type);
                async move {
                    let mut guard = shared.lock().await;
                    let Some(tx) = guard.as_mut() else {
                        return Err(StoreError::Db("transaction already closed".to_string()));
                    };
                    insert_prop(tx, &table, row.locale_id, &prop_type, &row.value).await
                }
            })
        };

        let results = Scheduler::with_handler(self.workers, insert, fresh)
            .with_cancellation(self.cancel.clone())
            .run()
            .await?;

        let failures: Vec<StoreError> = results
            .into_iter()
            .filter_map(|result| result.value.err())
            .collect();
        let Some(tx) = shared.lock().await.take() else {
            return Err(StoreError::Db("transaction already closed".to_string()).into());
        };

        if let Some(first) = failures.first() {
            warn!(
                table = %self.table,
                failed = failures.len(),
                error = %first,
                "rolling back upload"
            );
            let first = first.to_string();
            tx.rollback()
                .await
                .map_err(|err| StoreError::Db(err.to_string()))?;
            return Err(SeedError::Upload {
                failed: failures.len(),
                first,
            });
        }

        tx.commit()
            .await
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(report)
    }
}
