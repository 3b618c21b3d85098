//! Concurrent generation pipeline.
//!
//! Each requested resource gets one producer drawing `count` values and one
//! consumer formatting `count` items. All of them share a single channel of
//! capacity one, so a consumer spawned for one resource may print values of
//! another; every item carries its own resource and round, so the output
//! stays correctly labeled while the order across resources is arbitrary.
//! Within one producer rounds are sent in increasing order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::binding::Resource;
use crate::errors::PipelineError;
use crate::generators::Generator;
use crate::output::{Emitter, OutputFormatter};

/// Value travelling from a producer to a consumer.
#[derive(Clone)]
pub struct GeneratedItem {
    pub resource: String,
    pub generator: Arc<dyn Generator>,
    /// Zero-based index of the draw within its producer.
    pub round: usize,
    pub value: String,
}

impl std::fmt::Debug for GeneratedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedItem")
            .field("resource", &self.resource)
            .field("generator", &self.generator.kind())
            .field("round", &self.round)
            .field("value", &self.value)
            .finish()
    }
}

/// Counters observed once the run completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub produced: usize,
    pub consumed: usize,
}

pub struct Pipeline {
    formatter: Arc<dyn OutputFormatter>,
    emitter: Arc<dyn Emitter>,
    cancel: CancellationToken,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<GeneratedItem>>>;

impl Pipeline {
    pub fn new(formatter: Arc<dyn OutputFormatter>, emitter: Arc<dyn Emitter>) -> Self {
        Self {
            formatter,
            emitter,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the run when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Draw `count` values from every resource and emit them.
    ///
    /// Any generation error is fatal: the remaining tasks are cancelled and
    /// the first error is returned.
    pub async fn run(
        &self,
        resources: &[Resource],
        count: usize,
    ) -> Result<PipelineReport, PipelineError> {
        let total = count * resources.len();
        let produced = Arc::new(AtomicUsize::new(0));
        let consumed = Arc::new(AtomicUsize::new(0));
        if total == 0 {
            return Ok(PipelineReport::default());
        }

        let cancel = self.cancel.child_token();
        let (sender, receiver) = mpsc::channel(1);
        let receiver: SharedReceiver = Arc::new(Mutex::new(receiver));

        let mut tasks = JoinSet::new();
        for resource in resources {
            tasks.spawn(produce(
                resource.clone(),
                count,
                sender.clone(),
                cancel.clone(),
                Arc::clone(&produced),
            ));
            tasks.spawn(consume(
                count,
                Arc::clone(&receiver),
                Arc::clone(&self.formatter),
                Arc::clone(&self.emitter),
                cancel.clone(),
                Arc::clone(&consumed),
            ));
        }
        drop(sender);
        debug!(resources = resources.len(), count, total, "pipeline started");

        let mut failure: Option<PipelineError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome =
                joined.unwrap_or_else(|err| Err(PipelineError::TaskPanicked(err.to_string())));
            let Err(err) = outcome else {
                continue;
            };
            cancel.cancel();
            if failure
                .as_ref()
                .is_none_or(|current| severity(&err) > severity(current))
            {
                failure = Some(err);
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        self.emitter.flush()?;

        let report = PipelineReport {
            produced: produced.load(Ordering::SeqCst),
            consumed: consumed.load(Ordering::SeqCst),
        };
        if report.produced != total || report.consumed != total {
            return Err(PipelineError::ChannelClosed);
        }
        info!(
            event = "generation_finished",
            resources = resources.len(),
            produced = report.produced,
            consumed = report.consumed
        );
        Ok(report)
    }
}

/// Failures caused by another task's failure rank below the root cause.
fn severity(err: &PipelineError) -> u8 {
    match err {
        PipelineError::Cancelled => 0,
        PipelineError::ChannelClosed => 1,
        _ => 2,
    }
}

async fn produce(
    resource: Resource,
    count: usize,
    sender: mpsc::Sender<GeneratedItem>,
    cancel: CancellationToken,
    produced: Arc<AtomicUsize>,
) -> Result<(), PipelineError> {
    for round in 0..count {
        let drawn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            drawn = resource.generator.next() => drawn,
        };
        let value = drawn.map_err(|source| PipelineError::Generation {
            resource: resource.name().to_string(),
            round,
            source,
        })?;

        let item = GeneratedItem {
            resource: resource.name().to_string(),
            generator: Arc::clone(&resource.generator),
            round,
            value,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            sent = sender.send(item) => sent.map_err(|_| PipelineError::ChannelClosed)?,
        }
        produced.fetch_add(1, Ordering::SeqCst);
    }
    Ok(())
}

async fn consume(
    count: usize,
    receiver: SharedReceiver,
    formatter: Arc<dyn OutputFormatter>,
    emitter: Arc<dyn Emitter>,
    cancel: CancellationToken,
    consumed: Arc<AtomicUsize>,
) -> Result<(), PipelineError> {
    for _ in 0..count {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            item = next_item(&receiver) => item?,
        };
        emitter.emit(&formatter.format(&item))?;
        consumed.fetch_add(1, Ordering::SeqCst);
    }
    Ok(())
}

async fn next_item(receiver: &SharedReceiver) -> Result<GeneratedItem, PipelineError> {
    receiver
        .lock()
        .await
        .recv()
        .await
        .ok_or(PipelineError::ChannelClosed)
}
