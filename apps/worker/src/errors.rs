use thiserror::Error;
use uuid::Uuid;

/// Worker-level error type.
///
/// Most pipeline stages degrade to fallback data instead of erroring (see
/// `search`, `suggest`); the variants here cover the failures that do
/// surface: queue/database trouble, malformed messages, and the immediate
/// variant's hard resume requirement.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No resume on file for user {0}")]
    ResumeNotFound(Uuid),

    #[error("Malformed queue message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
