//! Concurrent tree crawler.
//!
//! A fixed pool of workers takes jobs from a bounded queue, lists one
//! directory each and publishes exactly one result per job. The control loop
//! in [`Crawler::crawl`] is the only reader of the results channel and the
//! only writer of the pending counter and of the accumulated entries.
//!
//! Jobs for newly discovered directories wait in a local backlog until the
//! queue has room, so the control loop never blocks on the job queue while
//! workers block on the results channel.

use super::{CrawlJob, CrawlResult, DirectoryLister};
use crate::api::Entry;
use crate::utils::{ApiError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Progress callback: (directory name, cumulative entry count)
pub type ProgressFn<'a> = &'a mut (dyn FnMut(&str, usize) + Send);

pub struct Crawler<L> {
    lister: Arc<L>,
    workers: usize,
    queue_capacity: usize,
    cancel: CancellationToken,
}

impl<L: DirectoryLister> Crawler<L> {
    pub fn new(lister: Arc<L>) -> Self {
        Self {
            lister,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Capacity of both the job queue and the results channel
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// List every directory below `root_id` and return all entries found.
    ///
    /// Either the complete flattened tree or the first error is returned,
    /// never a partial tree. Output order is unspecified.
    pub async fn crawl(
        &self,
        root_id: u64,
        root_name: &str,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<Entry>> {
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        debug!(root_id, root_name, workers = self.workers, "starting crawl");

        let (job_tx, job_rx) = mpsc::channel::<CrawlJob>(self.queue_capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<CrawlResult>(self.queue_capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&self.lister),
                Arc::clone(&job_rx),
                result_tx.clone(),
                self.cancel.clone(),
            ));
        }
        drop(result_tx);

        let mut backlog = VecDeque::from([CrawlJob::new(root_id, root_name)]);
        let mut pending = 1usize;
        let mut entries: Vec<Entry> = Vec::new();
        let mut first_error: Option<ApiError> = None;

        while pending > 0 {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!(pending, "crawl cancelled");
                    return Err(ApiError::Cancelled);
                }

                received = result_rx.recv() => {
                    let Some(result) = received else {
                        return Err(first_error.unwrap_or(ApiError::WorkerLost));
                    };
                    pending -= 1;

                    match result.outcome {
                        Err(err) => {
                            if first_error.is_none() {
                                warn!(directory = %result.dir_name, error = %err, "listing failed, draining crawl");
                                // queued-but-undispatched jobs will never produce a result
                                pending -= backlog.len();
                                backlog.clear();
                                first_error = Some(err);
                            }
                        }
                        Ok(children) if first_error.is_none() => {
                            let subdirs: Vec<CrawlJob> = children
                                .iter()
                                .filter(|child| child.is_dir())
                                .map(CrawlJob::from)
                                .collect();

                            entries.extend(children);
                            if let Some(callback) = on_progress.as_mut() {
                                callback(&result.dir_name, entries.len());
                            }

                            pending += subdirs.len();
                            backlog.extend(subdirs);
                        }
                        Ok(_) => {}
                    }
                }

                // a worker that dies mid-job never publishes its result
                Some(joined) = workers.join_next() => {
                    if let Err(e) = joined {
                        warn!(error = %e, pending, "crawl worker died");
                        return Err(first_error.unwrap_or(ApiError::WorkerLost));
                    }
                }

                permit = job_tx.reserve(), if !backlog.is_empty() => {
                    match permit {
                        Ok(permit) => {
                            if let Some(job) = backlog.pop_front() {
                                permit.send(job);
                            }
                        }
                        Err(_) => return Err(first_error.unwrap_or(ApiError::WorkerLost)),
                    }
                }
            }
        }

        // closing the queue lets idle workers exit
        drop(job_tx);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "crawl worker panicked");
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        debug!(root_id, entries = entries.len(), "crawl completed");
        Ok(entries)
    }
}

async fn run_worker<L: DirectoryLister>(
    worker_id: usize,
    lister: Arc<L>,
    jobs: Arc<Mutex<mpsc::Receiver<CrawlJob>>>,
    results: mpsc::Sender<CrawlResult>,
    cancel: CancellationToken,
) {
    loop {
        let job = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => return,
                job = rx.recv() => job,
            }
        };
        let Some(job) = job else {
            return;
        };

        if cancel.is_cancelled() {
            return;
        }
        debug!(worker_id, dir_id = job.dir_id, dir_name = %job.dir_name, "listing directory");
        let outcome = lister.list_children(job.dir_id).await;

        // a cancelled crawl no longer reads results
        if cancel.is_cancelled() {
            return;
        }

        let result = CrawlResult {
            dir_name: job.dir_name,
            outcome,
        };
        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = results.send(result) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}
