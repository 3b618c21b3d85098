use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use datagen_core::{StoreError, ValueStore, validate_identifier};

/// Locale row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub id: i64,
    pub name: String,
}

/// Table holding the values of one property family (`person` -> `person_prop`).
pub fn prop_table_name(prop_table: &str) -> Result<String, StoreError> {
    Ok(format!("{}_prop", validate_identifier(prop_table)?))
}

fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Db(err.to_string())
}

/// SQLite-backed value store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open, creating it when missing, the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(db_error)?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self { pool })
    }

    /// Private in-memory database, alive as long as the store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_error)?;
        // Every connection to `:memory:` is a distinct database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_error)?;
        Ok(Self { pool })
    }

    /// Use a pre-configured pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the locale table and the given property tables.
    pub async fn ensure_schema(&self, prop_tables: &[&str]) -> Result<(), StoreError> {
        sqlx::query(
            "create table if not exists locale (
                id integer primary key autoincrement,
                name text not null unique collate nocase
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        for prop_table in prop_tables {
            let table = prop_table_name(prop_table)?;
            sqlx::query(&format!(
                "create table if not exists {table} (
                    id integer primary key autoincrement,
                    locale_id integer references locale(id),
                    type text not null,
                    value text not null
                )"
            ))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
            sqlx::query(&format!(
                "create index if not exists {table}_type_idx on {table} (type)"
            ))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
            debug!(table = %table, "ensured prop table");
        }
        Ok(())
    }

    /// Run a multi-statement SQL script.
    pub async fn execute_script(&self, script: &str) -> Result<(), StoreError> {
        sqlx::raw_sql(script)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Id of the locale named `name` (case-insensitive), inserting it if needed.
    pub async fn ensure_locale(&self, name: &str) -> Result<i64, StoreError> {
        sqlx::query("insert or ignore into locale (name) values (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        sqlx::query_scalar::<_, i64>("select id from locale where name = ? collate nocase")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    pub async fn locales(&self) -> Result<Vec<Locale>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String)>("select id, name from locale order by id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Locale { id, name })
            .collect())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool.begin().await.map_err(db_error)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Values of type `prop_type` already stored in `table`.
pub async fn existing_values(
    conn: &mut SqliteConnection,
    table: &str,
    prop_type: &str,
) -> Result<Vec<String>, StoreError> {
    let table = validate_identifier(table)?;
    sqlx::query_scalar::<_, String>(&format!("select value from {table} where type = ?"))
        .bind(prop_type)
        .fetch_all(conn)
        .await
        .map_err(db_error)
}

/// Insert one property row.
pub async fn insert_prop(
    conn: &mut SqliteConnection,
    table: &str,
    locale_id: i64,
    prop_type: &str,
    value: &str,
) -> Result<(), StoreError> {
    let table = validate_identifier(table)?;
    sqlx::query(&format!(
        "insert into {table} (locale_id, type, value) values (?, ?, ?)"
    ))
    .bind(locale_id)
    .bind(prop_type)
    .bind(value)
    .execute(conn)
    .await
    .map_err(db_error)?;
    Ok(())
}

#[async_trait]
impl ValueStore for SqliteStore {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    async fn select_values(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Vec<String>, StoreError> {
        let table = validate_identifier(table)?;
        let column = validate_identifier(column)?;
        sqlx::query_scalar::<_, String>(&format!(
            "select value from {table} where {column} = ?"
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }
}
