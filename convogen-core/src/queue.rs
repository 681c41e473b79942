use crate::domain::VariationJob;
use crate::logging::{LogEvent, LogLevel, SharedEventLogger};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    Mutex,
};
use tokio::time::Duration;

/// Feed for the worker pool: holds expanded variation jobs until a worker
/// picks them up.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: VariationJob) -> anyhow::Result<()>;

    async fn dequeue(&self) -> anyhow::Result<VariationJob>;

    async fn length(&self) -> usize;

    async fn is_empty(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct MemoryQueueConfig {
    /// Maximum queue capacity (0 for unbounded)
    pub capacity: usize,

    /// Timeout for dequeue operations
    pub dequeue_timeout: Duration,
}

impl Default for MemoryQueueConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            dequeue_timeout: Duration::from_secs(30),
        }
    }
}

pub struct MemoryJobQueue {
    config: MemoryQueueConfig,
    sender: UnboundedSender<VariationJob>,
    receiver: Arc<Mutex<UnboundedReceiver<VariationJob>>>,
    length: tokio::sync::watch::Receiver<usize>,
    length_sender: tokio::sync::watch::Sender<usize>,
    logger: SharedEventLogger,
}

impl MemoryJobQueue {
    pub fn new(config: Option<MemoryQueueConfig>, logger: SharedEventLogger) -> Self {
        let config = config.unwrap_or_default();
        let (sender, receiver) = unbounded_channel();
        let (length_sender, length_receiver) = tokio::sync::watch::channel(0);

        Self {
            config,
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            length: length_receiver,
            length_sender,
            logger,
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: VariationJob) -> anyhow::Result<()> {
        if self.config.capacity > 0 {
            let current_length = *self.length.borrow();
            if current_length >= self.config.capacity {
                self.logger.log(
                    LogEvent::new(LogLevel::Warn, "queue.capacity_exceeded")
                        .with_scenario(job.scenario.id.clone())
                        .with_variation(job.params.variation_index),
                );
                return Err(anyhow::anyhow!("Queue capacity exceeded"));
            }
        }

        self.sender
            .send(job)
            .map_err(|e| anyhow::anyhow!("Failed to enqueue job: {}", e))?;

        let current_length = *self.length.borrow();
        let _ = self.length_sender.send(current_length + 1);

        Ok(())
    }

    async fn dequeue(&self) -> anyhow::Result<VariationJob> {
        let mut receiver = self.receiver.lock().await;

        let job = tokio::time::timeout(self.config.dequeue_timeout, receiver.recv())
            .await
            .map_err(|_| anyhow::anyhow!("Dequeue timeout"))?
            .ok_or_else(|| anyhow::anyhow!("Queue receiver closed"))?;

        let current_length = *self.length.borrow();
        let _ = self.length_sender.send(current_length.saturating_sub(1));

        Ok(job)
    }

    async fn length(&self) -> usize {
        *self.length.borrow()
    }

    async fn is_empty(&self) -> bool {
        *self.length.borrow() == 0
    }
}

pub fn bounded_queue(capacity: usize, logger: SharedEventLogger) -> MemoryJobQueue {
    MemoryJobQueue::new(
        Some(MemoryQueueConfig {
            capacity,
            ..Default::default()
        }),
        logger,
    )
}

pub fn unbounded_queue(logger: SharedEventLogger) -> MemoryJobQueue {
    MemoryJobQueue::new(None, logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PromptRecord, ScenarioDefinition, VariationParameters};
    use crate::logging::NoopEventLogger;
    use crate::scenarios::builtin_scenarios;

    fn create_test_job(index: u32) -> VariationJob {
        let scenario: ScenarioDefinition = builtin_scenarios().remove(0);
        VariationJob {
            prompt: Arc::new(PromptRecord {
                id: "prompt-1".to_string(),
                system_prompt: "base".to_string(),
                language: "english".to_string(),
                metadata: Default::default(),
            }),
            scenario: Arc::new(scenario),
            params: VariationParameters {
                variation_index: index,
                customer_name: "Khalili".to_string(),
                agent_name: "Salma".to_string(),
                debt_amount: 500.0,
                due_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            },
        }
    }

    #[tokio::test]
    async fn test_enqueue_dequeue() {
        let logger = Arc::new(NoopEventLogger);
        let queue = unbounded_queue(logger);

        queue.enqueue(create_test_job(1)).await.unwrap();
        queue.enqueue(create_test_job(2)).await.unwrap();

        assert_eq!(queue.length().await, 2);
        assert!(!queue.is_empty().await);

        let first = queue.dequeue().await.unwrap();
        let second = queue.dequeue().await.unwrap();

        assert_eq!(first.params.variation_index, 1);
        assert_eq!(second.params.variation_index, 2);

        assert_eq!(queue.length().await, 0);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_bounded_queue() {
        let logger = Arc::new(NoopEventLogger);
        let queue = bounded_queue(2, logger);

        queue.enqueue(create_test_job(1)).await.unwrap();
        queue.enqueue(create_test_job(2)).await.unwrap();

        assert_eq!(queue.length().await, 2);

        let result = queue.enqueue(create_test_job(3)).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Queue capacity exceeded");
    }

    #[tokio::test]
    async fn test_dequeue_timeout() {
        let logger = Arc::new(NoopEventLogger);
        let config = MemoryQueueConfig {
            capacity: 0,
            dequeue_timeout: Duration::from_millis(100),
        };
        let queue = MemoryJobQueue::new(Some(config), logger);

        let result = queue.dequeue().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Dequeue timeout"));
    }
}
