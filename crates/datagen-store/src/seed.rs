//! CSV seeds feeding the property tables.

use std::io;
use std::path::PathBuf;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::{SeedError, SeedResult};
use crate::sqlite::{SqliteStore, prop_table_name};
use crate::upload::{BulkUploader, SeedRow, UploadReport};

/// Default number of concurrent inserts per seed.
pub const DEFAULT_SEED_WORKERS: usize = 8;

/// One seed: a local CSV file whose column feeds `<prop_table>_prop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub name: String,
    pub prop_table: String,
    pub prop_type: String,
    pub locale: String,
    pub path: PathBuf,
    #[serde(default)]
    pub csv: CsvSpec,
}

/// How to extract values from a CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSpec {
    pub skip_header: bool,
    pub delimiter: char,
    /// Zero-based index of the column holding the values.
    pub column: usize,
}

impl Default for CsvSpec {
    fn default() -> Self {
        Self {
            skip_header: false,
            delimiter: ',',
            column: 0,
        }
    }
}

/// Outcome of one successful seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub name: String,
    pub upload: UploadReport,
}

/// Extract the configured column of every non-empty CSV record.
pub fn parse_csv(reader: impl io::Read, spec: &CsvSpec, source: &str) -> SeedResult<Vec<String>> {
    if !spec.delimiter.is_ascii() {
        return Err(SeedError::InvalidDelimiter(spec.delimiter));
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(spec.skip_header)
        .delimiter(spec.delimiter as u8)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| SeedError::Read {
            path: PathBuf::from(source),
            message: err.to_string(),
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |position| position.line());
        let value = record
            .get(spec.column)
            .ok_or_else(|| SeedError::MissingColumn {
                source_name: source.to_string(),
                line,
                column: spec.column,
                available: record.len(),
            })?;
        values.push(value.to_string());
    }
    Ok(values)
}

/// Runs configured seeds against a SQLite store.
pub struct Seeder {
    store: SqliteStore,
    seeds: Vec<SeedConfig>,
    schema: Option<String>,
    workers: usize,
    cancel: CancellationToken,
}

impl Seeder {
    pub fn new(store: SqliteStore, seeds: Vec<SeedConfig>) -> Self {
        Self {
            store,
            seeds,
            schema: None,
            workers: DEFAULT_SEED_WORKERS,
            cancel: CancellationToken::new(),
        }
    }

    /// SQL script executed before any seed.
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run every seed. A failing seed does not stop the others; all failures
    /// are reported together once every seed ran.
    pub async fn run(&self) -> SeedResult<Vec<SeedReport>> {
        if let Some(schema) = &self.schema {
            self.store.execute_script(schema).await?;
        }
        let prop_tables: Vec<&str> = self
            .seeds
            .iter()
            .map(|seed| seed.prop_table.as_str())
            .collect();
        self.store.ensure_schema(&prop_tables).await?;

        let mut reports = Vec::with_capacity(self.seeds.len());
        let mut failures = Vec::new();
        for seed in &self.seeds {
            if self.cancel.is_cancelled() {
                failures.push(format!("{}: cancelled", seed.name));
                continue;
            }
            match self.seed_one(seed).await {
                Ok(upload) => {
                    info!(
                        event = "seed_uploaded",
                        seed = %seed.name,
                        total = upload.total,
                        skipped = upload.skipped,
                        inserted = upload.inserted
                    );
                    reports.push(SeedReport {
                        name: seed.name.clone(),
                        upload,
                    });
                }
                Err(err) => {
                    error!(
                        event = "seed_failed",
                        seed = %seed.name,
                        path = %seed.path.display(),
                        error = %err
                    );
                    failures.push(format!("{}: {err}", seed.name));
                }
            }
        }

        if failures.is_empty() {
            Ok(reports)
        } else {
            Err(SeedError::Failed(failures))
        }
    }

    async fn seed_one(&self, seed: &SeedConfig) -> SeedResult<UploadReport> {
        let file = std::fs::File::open(&seed.path).map_err(|err| SeedError::Read {
            path: seed.path.clone(),
            message: err.to_string(),
        })?;
        let values = parse_csv(file, &seed.csv, &seed.path.display().to_string())?;
        let locale_id = self.store.ensure_locale(&seed.locale).await?;
        let rows = values
            .into_iter()
            .map(|value| SeedRow::new(locale_id, value))
            .collect();

        let table = prop_table_name(&seed.prop_table)?;
        BulkUploader::new(self.store.clone(), &table, &seed.prop_type, self.workers)?
            .with_cancellation(self.cancel.clone())
            .upload(rows)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_configured_column() {
        let data = "id;name\n1;Ana\n\n2;Bruno\n";
        let spec = CsvSpec {
            skip_header: true,
            delimiter: ';',
            column: 1,
        };
        let values = parse_csv(data.as_bytes(), &spec, "names.csv").expect("parse csv");
        assert_eq!(values, vec!["Ana", "Bruno"]);
    }

    #[test]
    fn keeps_the_first_line_without_header() {
        let values =
            parse_csv("Ana\nBruno\n".as_bytes(), &CsvSpec::default(), "names.csv").expect("parse");
        assert_eq!(values, vec!["Ana", "Bruno"]);
    }

    #[test]
    fn missing_column_reports_the_line() {
        let spec = CsvSpec {
            column: 2,
            ..CsvSpec::default()
        };
        let err = parse_csv("a,b,c\nd,e\n".as_bytes(), &spec, "short.csv").expect_err("short row");
        assert!(matches!(
            err,
            SeedError::MissingColumn {
                line: 2,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_ascii_delimiters() {
        let spec = CsvSpec {
            delimiter: '§',
            ..CsvSpec::default()
        };
        assert!(matches!(
            parse_csv("a".as_bytes(), &spec, "x.csv"),
            Err(SeedError::InvalidDelimiter('§'))
        ));
    }

    #[test]
    fn seed_config_reads_from_toml() {
        let seed: SeedConfig = toml::from_str(
            r#"
            name = "[fr] person.first_name"
            prop_table = "person"
            prop_type = "first_name"
            locale = "fr-FR"
            path = "seeds/prenoms.csv"

            [csv]
            skip_header = true
            delimiter = ";"
            "#,
        )
        .expect("parse seed");

        assert_eq!(seed.prop_table, "person");
        assert_eq!(seed.csv.delimiter, ';');
        assert_eq!(seed.csv.column, 0);
        assert!(seed.csv.skip_header);
    }
}
