//! Durable job queue over a Redis list, with manual acknowledgment.
//!
//! Producers LPUSH onto `job_queue`; the consumer BRPOPLPUSH each message
//! onto a processing list, so a crash between dequeue and ack leaves the
//! payload recoverable instead of lost. Ack and reject both LREM the entry
//! from the processing list — reject deliberately does NOT requeue, to avoid
//! poison-message loops. Entries orphaned on the processing list (e.g. by a
//! shutdown mid-message) require manual requeueing; there is no dead-letter
//! queue.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::errors::WorkerError;

pub const JOB_QUEUE: &str = "job_queue";
const PROCESSING_LIST: &str = "job_queue:processing";
/// BRPOPLPUSH block time; the consume loop re-polls so shutdown signals are
/// observed at this granularity.
const POLL_TIMEOUT_SECS: usize = 5;

#[derive(Clone)]
pub struct JobQueue {
    conn: MultiplexedConnection,
}

impl JobQueue {
    pub async fn connect(client: &redis::Client) -> Result<Self, WorkerError> {
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Connected to Redis job queue '{JOB_QUEUE}'");
        Ok(Self { conn })
    }

    /// Publishes a raw request payload. Normally the API layer's job; kept
    /// here for the `worker enqueue` producer mode and operational tooling.
    pub async fn enqueue(&self, payload: &str) -> Result<(), WorkerError> {
        let mut conn = self.conn.clone();
        let queued: usize = conn.lpush(JOB_QUEUE, payload).await?;
        debug!("Enqueued message; queue depth now {queued}");
        Ok(())
    }

    async fn remove_from_processing(&self, payload: &str) -> Result<(), WorkerError> {
        let mut conn = self.conn.clone();
        let _removed: usize = conn.lrem(PROCESSING_LIST, 1, payload).await?;
        Ok(())
    }
}

/// Consumer-side queue operations, the consume loop's seam.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Blocks up to the poll timeout for the next message. `None` means the
    /// timeout elapsed with an empty queue — callers just poll again.
    async fn dequeue(&self) -> Result<Option<String>, WorkerError>;

    /// Acknowledges a fully processed message.
    async fn ack(&self, payload: &str) -> Result<(), WorkerError>;

    /// Discards a message without requeueing it.
    async fn reject(&self, payload: &str) -> Result<(), WorkerError>;
}

#[async_trait]
impl MessageQueue for JobQueue {
    /// Moves the next message onto the processing list while it is handled.
    async fn dequeue(&self) -> Result<Option<String>, WorkerError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = redis::cmd("BRPOPLPUSH")
            .arg(JOB_QUEUE)
            .arg(PROCESSING_LIST)
            .arg(POLL_TIMEOUT_SECS)
            .query_async(&mut conn)
            .await?;
        Ok(payload)
    }

    async fn ack(&self, payload: &str) -> Result<(), WorkerError> {
        self.remove_from_processing(payload).await?;
        debug!("Message acknowledged");
        Ok(())
    }

    async fn reject(&self, payload: &str) -> Result<(), WorkerError> {
        self.remove_from_processing(payload).await?;
        debug!("Message rejected without requeue");
        Ok(())
    }
}
