//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::TransactionRecord;
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

const COLUMNS: &str = "id, order_id, order_reference, authorization_id, capture_id, closed_at, \
     success, message, soft_decline, retry, authorization_reference_id, created_at, updated_at";

/// Postgres-backed transaction record repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, record: &TransactionRecord) -> RepositoryResult<TransactionRecord> {
        let sql = format!(
            r#"
            INSERT INTO amazon_transactions ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {columns}
            "#,
            columns = COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(record.id)
            .bind(record.order_id)
            .bind(&record.order_reference)
            .bind(&record.authorization_id)
            .bind(&record.capture_id)
            .bind(record.closed_at)
            .bind(record.success)
            .bind(&record.message)
            .bind(record.soft_decline)
            .bind(record.retry)
            .bind(&record.authorization_reference_id)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(row.into_domain())
    }

    async fn update(&self, record: &TransactionRecord) -> RepositoryResult<TransactionRecord> {
        // order_reference only moves from NULL to a value.
        let sql = format!(
            r#"
            UPDATE amazon_transactions SET
                order_reference = COALESCE(order_reference, $2),
                authorization_id = $3,
                capture_id = $4,
                closed_at = $5,
                success = $6,
                message = $7,
                soft_decline = $8,
                retry = $9,
                authorization_reference_id = $10,
                updated_at = $11
            WHERE id = $1
              AND (order_reference IS NULL OR $2 IS NULL OR order_reference = $2)
            RETURNING {columns}
            "#,
            columns = COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(record.id)
            .bind(&record.order_reference)
            .bind(&record.authorization_id)
            .bind(&record.capture_id)
            .bind(record.closed_at)
            .bind(record.success)
            .bind(&record.message)
            .bind(record.soft_decline)
            .bind(record.retry)
            .bind(&record.authorization_reference_id)
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(row.into_domain()),
            None => {
                // Either missing or guarded by the reference check.
                self.get_by_id(record.id).await?;
                Err(RepositoryError::Invariant(format!(
                    "order reference of {} cannot change",
                    record.id
                )))
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<TransactionRecord> {
        let sql = format!("SELECT {} FROM amazon_transactions WHERE id = $1", COLUMNS);
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        row.map(|r| r.into_domain())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn active_for_order(&self, order_id: i64) -> RepositoryResult<Option<TransactionRecord>> {
        let sql = format!(
            "SELECT {} FROM amazon_transactions WHERE order_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
            COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(row.map(|r| r.into_domain()))
    }

    async fn any_unsuccessful(&self, order_id: i64) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM amazon_transactions WHERE order_id = $1 AND success = FALSE)",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(exists)
    }

    async fn delete_for_order(&self, order_id: i64) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM amazon_transactions WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        Ok(result.rows_affected())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    order_id: i64,
    order_reference: Option<String>,
    authorization_id: Option<String>,
    capture_id: Option<String>,
    closed_at: Option<chrono::DateTime<chrono::Utc>>,
    success: Option<bool>,
    message: Option<String>,
    soft_decline: Option<bool>,
    retry: bool,
    authorization_reference_id: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            order_id: self.order_id,
            order_reference: self.order_reference,
            authorization_id: self.authorization_id,
            capture_id: self.capture_id,
            closed_at: self.closed_at,
            success: self.success,
            message: self.message,
            soft_decline: self.soft_decline,
            retry: self.retry,
            authorization_reference_id: self.authorization_reference_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
