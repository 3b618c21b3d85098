use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use datagen_core::{GeneratorOptions, ValueStore};
use datagen_generate::{
    BoundResources, OutputFormat, Pipeline, PipelineReport, Registry, StdoutEmitter,
    bind_resources, register_builtin_types,
};
use datagen_store::{DEFAULT_SEED_WORKERS, SeedReport, Seeder, SqliteStore};

use crate::CliError;
use crate::config::Config;

/// Generation request coming from the command line.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub resources: Vec<String>,
    pub count: usize,
    pub format: OutputFormat,
    pub unique: bool,
    pub max_unique_retries: Option<u32>,
}

pub struct App {
    config: Config,
    store: SqliteStore,
    cancel: CancellationToken,
}

impl App {
    /// Open the store. A database created by this call is seeded with the
    /// configured seeds when `seed_if_new` is set.
    pub async fn open(
        config: Config,
        db_override: Option<PathBuf>,
        seed_if_new: bool,
    ) -> Result<Self, CliError> {
        let db_path = db_override.unwrap_or_else(|| config.store.path.clone());
        let is_new = !db_path.exists();
        if is_new {
            if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = SqliteStore::open(&db_path).await?;
        info!(event = "store_opened", path = %db_path.display(), created = is_new);

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(event = "interrupted");
                on_interrupt.cancel();
            }
        });

        let app = Self {
            config,
            store,
            cancel,
        };
        if is_new && seed_if_new {
            app.seed_new_store().await?;
        }
        Ok(app)
    }

    /// First-run seeding. Seed failures are logged, not returned.
    async fn seed_new_store(&self) -> Result<(), CliError> {
        info!(event = "initial_seed_started", seeds = self.config.seeds.len());
        match self.run_seeds(DEFAULT_SEED_WORKERS).await {
            Ok(reports) => {
                let inserted: usize = reports.iter().map(|report| report.upload.inserted).sum();
                info!(event = "initial_seed_finished", seeds = reports.len(), inserted);
            }
            Err(CliError::Seed(err)) => {
                warn!(event = "initial_seed_failed", error = %err);
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    async fn run_seeds(&self, workers: usize) -> Result<Vec<SeedReport>, CliError> {
        let schema = self.config.schema_script()?;
        Ok(Seeder::new(self.store.clone(), self.config.seeds.clone())
            .with_schema(schema)
            .with_workers(workers)
            .with_cancellation(self.cancel.clone())
            .run()
            .await?)
    }

    fn generator_defaults(&self, request: Option<&GenerateRequest>) -> GeneratorOptions {
        let mut options = self.config.generator.clone();
        if let Some(request) = request {
            options.enforce_uniqueness |= request.unique;
            if let Some(retries) = request.max_unique_retries {
                options.max_unique_retries = retries;
            }
        }
        options
    }

    async fn bind(&self, defaults: GeneratorOptions) -> Result<BoundResources, CliError> {
        let mut registry = Registry::new();
        let store: Arc<dyn ValueStore> = Arc::new(self.store.clone());
        register_builtin_types(&mut registry, Some(store))?;
        let bound =
            bind_resources(&registry, &Arc::new(defaults), &self.config.resources).await?;
        info!(
            event = "resources_bound",
            active = bound.active.len(),
            skipped = bound.skipped.len()
        );
        Ok(bound)
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<PipelineReport, CliError> {
        let bound = self.bind(self.generator_defaults(Some(request))).await?;
        let resources = bound.select(&request.resources)?;

        let pipeline = Pipeline::new(Arc::from(request.format.formatter()), Arc::new(StdoutEmitter))
            .with_cancellation(self.cancel.clone());
        Ok(pipeline.run(&resources, request.count).await?)
    }

    /// Print bound resources, then the skipped ones with the reason.
    pub async fn list_resources(&self) -> Result<(), CliError> {
        let bound = self.bind(self.generator_defaults(None)).await?;
        let mut out = io::stdout().lock();
        for resource in &bound.active {
            writeln!(out, "{}", resource.binding)?;
        }
        for skipped in &bound.skipped {
            writeln!(out, "{} (skipped: {})", skipped.binding, skipped.error)?;
        }
        Ok(())
    }

    pub async fn seed(&self, workers: usize) -> Result<Vec<SeedReport>, CliError> {
        let reports = self.run_seeds(workers).await?;

        let mut out = io::stdout().lock();
        for report in &reports {
            writeln!(
                out,
                "{}: {} row(s), {} inserted, {} already present",
                report.name, report.upload.total, report.upload.inserted, report.upload.skipped
            )?;
        }
        Ok(reports)
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.store.close().await;
    }
}
