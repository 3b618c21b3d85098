//! Fixed-size worker pool for independent tasks.
//!
//! Tasks are spread round-robin: task `i` runs on worker
//! `i % min(worker_count, tasks)`, so slow tasks that sit next to each other
//! in the input land on different workers. Each worker runs its tasks in
//! assignment order and buffers its results in its own channel; once every
//! worker is done the channels are drained in worker order.
//!
//! Results therefore come back worker-major, not in submission order. Use
//! [`TaskResult::task_id`] to restore the input order when it matters.
//!
//! The scheduler does not serialize handlers: a handler touching shared
//! state must synchronize internally.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SchedulerError;

/// Boxed future returned by a task handler.
pub type HandlerFuture<O> = Pin<Box<dyn Future<Output = O> + Send>>;

/// Shared asynchronous handler applied to a task's input.
pub type Handler<I, O> = Arc<dyn Fn(I) -> HandlerFuture<O> + Send + Sync>;

/// Unit of work: an input and the handler consuming it.
pub struct Task<I, O> {
    id: usize,
    data: I,
    handler: Handler<I, O>,
}

/// Output of one task, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult<O> {
    pub task_id: usize,
    pub worker_id: usize,
    pub value: O,
}

/// Tasks assigned to one worker, in execution order.
pub struct Worker<I, O> {
    pub id: usize,
    tasks: Vec<Task<I, O>>,
}

/// Round-robin worker pool.
pub struct Scheduler<I, O> {
    worker_count: usize,
    tasks: Vec<Task<I, O>>,
    cancel: CancellationToken,
}

/// Wrap an async closure into a shareable [`Handler`].
pub fn handler<I, O, F, Fut>(handler: F) -> Handler<I, O>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    Arc::new(move |data| Box::pin(handler(data)) as HandlerFuture<O>)
}

impl<I, O> Task<I, O> {
    pub fn new(data: I, handler: Handler<I, O>) -> Self {
        Self {
            id: 0,
            data,
            handler,
        }
    }

    /// Position of the task in the scheduler, assigned by [`Scheduler::schedule`].
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<I, O> Worker<I, O> {
    pub fn task_ids(&self) -> Vec<usize> {
        self.tasks.iter().map(Task::id).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<I, O> Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Run every task in order. Returns `false` when stopped by cancellation.
    async fn execute(
        self,
        results: mpsc::Sender<TaskResult<O>>,
        cancel: CancellationToken,
    ) -> bool {
        debug!(worker_id = self.id, tasks = self.tasks.len(), "worker started");
        for task in self.tasks {
            if cancel.is_cancelled() {
                debug!(worker_id = self.id, "worker cancelled");
                return false;
            }
            let value = (task.handler)(task.data).await;
            let result = TaskResult {
                task_id: task.id,
                worker_id: self.id,
                value,
            };
            if results.send(result).await.is_err() {
                return false;
            }
        }
        debug!(worker_id = self.id, "worker done");
        true
    }
}

impl<I, O> Scheduler<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            tasks: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a scheduler applying one handler to every input.
    pub fn with_handler(
        worker_count: usize,
        handler: Handler<I, O>,
        data: impl IntoIterator<Item = I>,
    ) -> Self {
        let mut scheduler = Self::new(worker_count);
        scheduler.schedule(
            data.into_iter()
                .map(|item| Task::new(item, Arc::clone(&handler))),
        );
        scheduler
    }

    /// Stop dispatching new tasks once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn schedule(&mut self, tasks: impl IntoIterator<Item = Task<I, O>>) {
        for mut task in tasks {
            task.id = self.tasks.len();
            self.tasks.push(task);
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Assign tasks to `min(worker_count, tasks)` workers, round-robin.
    pub fn partition(self) -> Result<Vec<Worker<I, O>>, SchedulerError> {
        partition(self.tasks, self.worker_count)
    }

    /// Run every task and collect results in worker-major order.
    pub async fn run(self) -> Result<Vec<TaskResult<O>>, SchedulerError> {
        let total = self.tasks.len();
        let cancel = self.cancel.clone();
        let workers = partition(self.tasks, self.worker_count)?;
        debug!(tasks = total, workers = workers.len(), "scheduling tasks");

        let mut receivers = Vec::with_capacity(workers.len());
        let mut handles = Vec::with_capacity(workers.len());
        for worker in workers {
            let (sender, receiver) = mpsc::channel(worker.len().max(1));
            receivers.push(receiver);
            handles.push((worker.id, tokio::spawn(worker.execute(sender, cancel.clone()))));
        }

        let mut completed = true;
        for (worker_id, handle) in handles {
            match handle.await {
                Ok(finished) => completed &= finished,
                Err(err) => {
                    cancel.cancel();
                    return Err(SchedulerError::WorkerPanicked {
                        worker_id,
                        message: err.to_string(),
                    });
                }
            }
        }
        if !completed {
            return Err(SchedulerError::Cancelled);
        }

        let mut results = Vec::with_capacity(total);
        for mut receiver in receivers {
            while let Some(result) = receiver.recv().await {
                results.push(result);
            }
        }
        debug!(results = results.len(), "collected task results");
        Ok(results)
    }
}

fn partition<I, O>(
    tasks: Vec<Task<I, O>>,
    worker_count: usize,
) -> Result<Vec<Worker<I, O>>, SchedulerError> {
    if worker_count == 0 {
        return Err(SchedulerError::NoWorkers);
    }
    let effective = worker_count.min(tasks.len());
    let mut workers: Vec<Worker<I, O>> = (0..effective)
        .map(|id| Worker {
            id,
            tasks: Vec::new(),
        })
        .collect();
    for (index, task) in tasks.into_iter().enumerate() {
        workers[index % effective].tasks.push(task);
    }
    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Handler<usize, usize> {
        handler(|value: usize| async move { value })
    }

    #[test]
    fn partition_is_round_robin() {
        let scheduler = Scheduler::with_handler(3, identity(), 0..10);
        let workers = scheduler.partition().expect("partition");

        assert_eq!(workers.len(), 3);
        assert_eq!(workers[0].task_ids(), vec![0, 3, 6, 9]);
        assert_eq!(workers[1].task_ids(), vec![1, 4, 7]);
        assert_eq!(workers[2].task_ids(), vec![2, 5, 8]);
    }

    #[test]
    fn partition_caps_workers_to_task_count() {
        let scheduler = Scheduler::with_handler(8, identity(), 0..3);
        let workers = scheduler.partition().expect("partition");

        assert_eq!(workers.len(), 3);
        assert!(workers.iter().all(|worker| worker.len() == 1));
    }

    #[test]
    fn partition_rejects_zero_workers() {
        let scheduler = Scheduler::with_handler(0, identity(), 0..3);
        assert!(matches!(
            scheduler.partition(),
            Err(SchedulerError::NoWorkers)
        ));
    }
}
