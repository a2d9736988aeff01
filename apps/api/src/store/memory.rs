//! In-process store. Used when no database is configured, and by tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::store::{Entity, EntityStore, StoreError};

/// Rows are kept newest first, matching the ordering `list` promises.
pub struct MemoryStore<E: Entity> {
    rows: Mutex<Vec<E>>,
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl<E: Entity> MemoryStore<E> {
    /// Total rows across all owners.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for MemoryStore<E> {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<E>, StoreError> {
        let rows = self.rows.lock().await;
        let mut owned: Vec<E> = rows.iter().filter(|r| r.owner() == owner).cloned().collect();
        // Stable sort keeps insertion order (newest first) among equal timestamps.
        owned.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        Ok(owned)
    }

    async fn insert(&self, owner: Uuid, draft: E::Draft) -> Result<E, StoreError> {
        E::validate_draft(&draft).map_err(StoreError::Rejected)?;

        let mut rows = self.rows.lock().await;
        let id = E::new_id(owner);
        if rows.iter().any(|r| r.id() == id) {
            return Err(StoreError::Conflict(format!("{} {id}", E::LABEL)));
        }
        let record = E::from_draft(id, owner, draft, Utc::now());
        rows.insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, owner: Uuid, id: Uuid, patch: E::Patch) -> Result<E, StoreError> {
        E::validate_patch(&patch).map_err(StoreError::Rejected)?;

        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id && r.owner() == owner)
            .ok_or(StoreError::NotFound)?;
        row.apply_patch(patch, Utc::now());
        Ok(row.clone())
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| !(r.id() == id && r.owner() == owner));
        if rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
