//! Persistent Store: user-scoped list/insert/update/delete over the five entities.
//!
//! Every adapter takes the owner reference as an explicit argument and applies it
//! as a predicate on every operation. Callers never get to read or write a row
//! that belongs to someone else, regardless of what ids they supply.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Contact, CoverLetter, JobApplication, Profile, Skill};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("rejected by store: {0}")]
    Rejected(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Descriptor of a user-owned record type.
///
/// Closed enumerations on implementors decode leniently (see `models`), so the
/// "enumerated-field defaults" live on the field types themselves.
pub trait Entity:
    Clone + std::fmt::Debug + Send + Sync + Unpin + Serialize + DeserializeOwned + 'static
{
    /// Fields supplied on create.
    type Draft: Clone + std::fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
    /// Partial update. Has no id or owner field, so neither can be changed.
    type Patch: Clone
        + std::fmt::Debug
        + Default
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + 'static;

    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str;
    /// Path segment under `/api/v1`.
    const RESOURCE: &'static str;
    /// Singular, capitalised, e.g. "Contact".
    const LABEL: &'static str;
    /// Plural, lower case, e.g. "contacts".
    const PLURAL: &'static str;

    fn id(&self) -> Uuid;
    fn owner(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;

    /// Identity assigned to a new record.
    fn new_id(_owner: Uuid) -> Uuid {
        Uuid::new_v4()
    }

    fn from_draft(id: Uuid, owner: Uuid, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    fn validate_draft(_draft: &Self::Draft) -> Result<(), String> {
        Ok(())
    }

    fn validate_patch(_patch: &Self::Patch) -> Result<(), String> {
        Ok(())
    }
}

/// Owner-scoped collection operations for one entity type.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Short tag for logs ("postgres", "memory").
    fn backend(&self) -> &'static str;

    /// All records owned by `owner`, newest first.
    async fn list(&self, owner: Uuid) -> Result<Vec<E>, StoreError>;

    async fn insert(&self, owner: Uuid, draft: E::Draft) -> Result<E, StoreError>;

    /// Fails with `NotFound` when `id` does not exist or is not owned by `owner`.
    async fn update(&self, owner: Uuid, id: Uuid, patch: E::Patch) -> Result<E, StoreError>;

    /// Fails with `NotFound` when `id` does not exist or is not owned by `owner`.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError>;
}

/// One store handle per entity, shared by handlers through `AppState`.
#[derive(Clone)]
pub struct Stores {
    pub applications: Arc<dyn EntityStore<JobApplication>>,
    pub contacts: Arc<dyn EntityStore<Contact>>,
    pub skills: Arc<dyn EntityStore<Skill>>,
    pub cover_letters: Arc<dyn EntityStore<CoverLetter>>,
    pub profiles: Arc<dyn EntityStore<Profile>>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            applications: store.clone(),
            contacts: store.clone(),
            skills: store.clone(),
            cover_letters: store.clone(),
            profiles: store,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            applications: Arc::new(MemoryStore::<JobApplication>::default()),
            contacts: Arc::new(MemoryStore::<Contact>::default()),
            skills: Arc::new(MemoryStore::<Skill>::default()),
            cover_letters: Arc::new(MemoryStore::<CoverLetter>::default()),
            profiles: Arc::new(MemoryStore::<Profile>::default()),
        }
    }
}

/// Picks the matching handle out of [`Stores`], so handlers can be generic over `E`.
pub trait StoreSlot: Entity {
    fn slot(stores: &Stores) -> &Arc<dyn EntityStore<Self>>;
}

impl StoreSlot for JobApplication {
    fn slot(stores: &Stores) -> &Arc<dyn EntityStore<Self>> {
        &stores.applications
    }
}

impl StoreSlot for Contact {
    fn slot(stores: &Stores) -> &Arc<dyn EntityStore<Self>> {
        &stores.contacts
    }
}

impl StoreSlot for Skill {
    fn slot(stores: &Stores) -> &Arc<dyn EntityStore<Self>> {
        &stores.skills
    }
}

impl StoreSlot for CoverLetter {
    fn slot(stores: &Stores) -> &Arc<dyn EntityStore<Self>> {
        &stores.cover_letters
    }
}

impl StoreSlot for Profile {
    fn slot(stores: &Stores) -> &Arc<dyn EntityStore<Self>> {
        &stores.profiles
    }
}
