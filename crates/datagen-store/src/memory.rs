use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use datagen_core::{StoreError, ValueStore, validate_identifier};

type Row = HashMap<String, String>;

/// In-memory tables of string columns.
///
/// Lookups mirror [`crate::SqliteStore`]: rows whose `column` equals the
/// filter yield their `value` column.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_row(&self, table: &str, row: &[(&str, &str)]) {
        let row: Row = row
            .iter()
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect();
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Rows stored in `table`, zero when the table does not exist.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl ValueStore for MemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn select_values(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Vec<String>, StoreError> {
        let table = validate_identifier(table)?;
        let column = validate_identifier(column)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(rows
            .iter()
            .filter(|row| row.get(column).is_some_and(|cell| cell == value))
            .filter_map(|row| row.get("value").cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filters_rows_by_column() {
        let store = MemoryStore::new();
        store.insert_row("city_prop", &[("type", "name"), ("value", "Lyon")]);
        store.insert_row("city_prop", &[("type", "name"), ("value", "Nice")]);
        store.insert_row("city_prop", &[("type", "zip"), ("value", "69000")]);

        let names = store
            .select_values("city_prop", "type", "name")
            .await
            .expect("select");
        assert_eq!(names, vec!["Lyon", "Nice"]);
        assert_eq!(store.row_count("city_prop"), 3);
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.select_values("ghost", "type", "x").await,
            Err(StoreError::UnknownTable(_))
        ));
    }
}
