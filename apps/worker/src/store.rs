//! Persistence Writer — append-only access to the jobs and resumes tables.
//!
//! The worker writes with the service-role pool and bypasses the per-user
//! row restrictions the API layer enforces; this split (trusted background
//! context vs. user-scoped request context) must be preserved. Writes are
//! append-only: redelivered requests produce duplicate rows rather than
//! upserts (documented current behavior — no dedup by URL).

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::WorkerError;
use crate::models::job::{JobRecord, ResumeData};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Returns the user's most recently updated resume, or `None` if the
    /// user has none on file.
    async fn fetch_resume(&self, user_id: Uuid) -> Result<Option<ResumeData>, WorkerError>;

    /// Appends one processed job record.
    async fn save_job(&self, record: &JobRecord) -> Result<(), WorkerError>;
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn fetch_resume(&self, user_id: Uuid) -> Result<Option<ResumeData>, WorkerError> {
        let data = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT data FROM resumes
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(data.map(ResumeData))
    }

    async fn save_job(&self, record: &JobRecord) -> Result<(), WorkerError> {
        let suggestions = record
            .suggestions
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| WorkerError::Internal(anyhow!("Failed to serialize suggestions: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO jobs
                (user_id, job_title, job_description, job_url, job_location,
                 job_type, company_name, scraped_at, ai_suggestions, search_query)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.url)
        .bind(&record.location)
        .bind(&record.job_type)
        .bind(&record.company)
        .bind(record.scraped_at)
        .bind(suggestions)
        .bind(&record.search_query)
        .execute(&self.pool)
        .await?;

        debug!("Saved job record for {}", record.url);
        Ok(())
    }
}
