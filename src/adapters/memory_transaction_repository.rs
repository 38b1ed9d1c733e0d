//! In-memory implementation of TransactionRepository, for tests and
//! embedders without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::TransactionRecord;
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    records: RwLock<HashMap<Uuid, TransactionRecord>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Records of an order, oldest first.
    pub async fn for_order(&self, order_id: i64) -> Vec<TransactionRecord> {
        let records = self.records.read().await;
        let mut matching: Vec<TransactionRecord> = records
            .values()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        matching
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, record: &TransactionRecord) -> RepositoryResult<TransactionRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(RepositoryError::Invariant(format!(
                "record {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn update(&self, record: &TransactionRecord) -> RepositoryResult<TransactionRecord> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&record.id)
            .ok_or_else(|| RepositoryError::NotFound(record.id.to_string()))?;

        let order_reference = match (&stored.order_reference, &record.order_reference) {
            (Some(existing), Some(new)) if existing != new => {
                return Err(RepositoryError::Invariant(format!(
                    "order reference of {} cannot change",
                    record.id
                )))
            }
            (Some(existing), _) => Some(existing.clone()),
            (None, new) => new.clone(),
        };

        *stored = TransactionRecord {
            order_reference,
            created_at: stored.created_at,
            order_id: stored.order_id,
            ..record.clone()
        };
        Ok(stored.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<TransactionRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn active_for_order(&self, order_id: i64) -> RepositoryResult<Option<TransactionRecord>> {
        Ok(self.for_order(order_id).await.pop())
    }

    async fn any_unsuccessful(&self, order_id: i64) -> RepositoryResult<bool> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .any(|r| r.order_id == order_id && r.is_unsuccessful()))
    }

    async fn delete_for_order(&self, order_id: i64) -> RepositoryResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.order_id != order_id);
        Ok((before - records.len()) as u64)
    }
}
