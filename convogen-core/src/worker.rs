use crate::domain::ResultRecord;
use crate::engine::VariationPipeline;
use crate::logging::{LogEvent, LogLevel, SharedEventLogger};
use crate::queue::JobQueue;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Pulls variation jobs off the queue, runs each through the pipeline, and
/// sends the finished record to the single-writer loop.
pub struct VariationWorker {
    pipeline: Arc<VariationPipeline>,
    queue: Arc<dyn JobQueue>,
    results: mpsc::Sender<ResultRecord>,
    logger: SharedEventLogger,
    worker_id: u64,
    shutdown: tokio::sync::oneshot::Receiver<()>,
}

impl VariationWorker {
    pub fn new(
        pipeline: Arc<VariationPipeline>,
        queue: Arc<dyn JobQueue>,
        results: mpsc::Sender<ResultRecord>,
        logger: SharedEventLogger,
        worker_id: u64,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> Self {
        Self {
            pipeline,
            queue,
            results,
            logger,
            worker_id,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        self.logger.log(
            LogEvent::new(LogLevel::Debug, "worker.started")
                .with_field("worker_id", self.worker_id.to_string()),
        );

        loop {
            tokio::select! {
                _ = &mut self.shutdown => {
                    break;
                }
                job_result = self.queue.dequeue() => {
                    match job_result {
                        Ok(job) => {
                            let record = self.pipeline.process(job).await;
                            if self.results.send(record).await.is_err() {
                                // Writer loop is gone; nothing left to do.
                                break;
                            }
                        }
                        Err(e) => {
                            self.logger.log(
                                LogEvent::new(LogLevel::Warn, "worker.dequeue_error")
                                    .with_field("worker_id", self.worker_id.to_string())
                                    .with_field("error", e.to_string()),
                            );
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        }

        self.logger.log(
            LogEvent::new(LogLevel::Debug, "worker.stopped")
                .with_field("worker_id", self.worker_id.to_string()),
        );
    }
}

pub struct WorkerManager {
    workers: Vec<tokio::task::JoinHandle<()>>,
    shutdown_senders: Vec<tokio::sync::oneshot::Sender<()>>,
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerManager {
    pub fn new() -> Self {
        Self {
            workers: Vec::new(),
            shutdown_senders: Vec::new(),
        }
    }

    pub async fn start(
        &mut self,
        worker_count: usize,
        pipeline: Arc<VariationPipeline>,
        queue: Arc<dyn JobQueue>,
        results: mpsc::Sender<ResultRecord>,
        logger: SharedEventLogger,
    ) {
        for i in 0..worker_count {
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            let worker = VariationWorker::new(
                pipeline.clone(),
                queue.clone(),
                results.clone(),
                logger.clone(),
                i as u64,
                shutdown_rx,
            );
            self.workers.push(tokio::spawn(worker.run()));
            self.shutdown_senders.push(shutdown_tx);
        }

        logger.log(
            LogEvent::new(LogLevel::Debug, "worker.manager.started")
                .with_field("worker_count", worker_count.to_string()),
        );
    }

    pub async fn stop(&mut self) {
        for tx in self.shutdown_senders.drain(..) {
            let _ = tx.send(());
        }

        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
    }
}
