//! Entity Access Binding: mirrors one user-scoped remote collection into local state.
//!
//! One generic type serves all five entities. Remote failures never escape as
//! faults. They are logged, turned into a user-visible [`Notification`], and
//! returned as a [`BindingError`] for callers that care. There are no retries:
//! a failed operation has to be re-attempted explicitly.
//!
//! The local collection sits behind an async mutex that is never held across a
//! store call, so concurrent operations on one binding interleave and the last
//! write wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::store::{Entity, EntityStore, StoreError};

pub mod notify;

pub use notify::{Notification, NotificationLog, Notifier, TracingNotifier};

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("no identity")]
    NoIdentity,

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct EntityBinding<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    notifier: Arc<dyn Notifier>,
    identity: RwLock<Option<Uuid>>,
    items: Mutex<Vec<E>>,
    loading: AtomicBool,
}

impl<E: Entity> EntityBinding<E> {
    pub fn new(store: Arc<dyn EntityStore<E>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            identity: RwLock::new(None),
            items: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
        }
    }

    /// Binding that already acts for `owner`, with an empty collection and no
    /// initial load. Request handlers use one of these per call.
    pub fn for_owner(
        store: Arc<dyn EntityStore<E>>,
        notifier: Arc<dyn Notifier>,
        owner: Uuid,
    ) -> Self {
        Self {
            identity: RwLock::new(Some(owner)),
            ..Self::new(store, notifier)
        }
    }

    pub async fn identity(&self) -> Option<Uuid> {
        *self.identity.read().await
    }

    /// Snapshot of the local collection.
    pub async fn items(&self) -> Vec<E> {
        self.items.lock().await.clone()
    }

    #[allow(dead_code)]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    /// Switches the acting identity and reloads. Becoming anonymous clears the collection.
    pub async fn set_identity(&self, identity: Option<Uuid>) {
        {
            let mut current = self.identity.write().await;
            if *current == identity {
                return;
            }
            *current = identity;
        }

        match identity {
            Some(_) => self.load().await,
            None => self.items.lock().await.clear(),
        }
    }

    /// Replaces the collection with the owner's records. No-op without an identity.
    pub async fn load(&self) {
        let Some(owner) = self.identity().await else {
            return;
        };

        self.loading.store(true, Ordering::Relaxed);
        let result = self.store.list(owner).await;
        self.loading.store(false, Ordering::Relaxed);

        match result {
            Ok(rows) => {
                if !self.still_acting_for(owner, "load").await {
                    return;
                }
                *self.items.lock().await = rows;
            }
            Err(e) => {
                error!(backend = self.store.backend(), "Error fetching {}: {e}", E::PLURAL);
                self.notifier
                    .notify(Notification::error(format!("Failed to fetch {}", E::PLURAL)));
            }
        }
    }

    pub async fn create(&self, draft: E::Draft) -> Result<E, BindingError> {
        let owner = self.identity().await.ok_or(BindingError::NoIdentity)?;
        let noun = E::LABEL.to_lowercase();

        if let Err(reason) = E::validate_draft(&draft) {
            warn!("Rejected {noun} before submission: {reason}");
            self.notifier
                .notify(Notification::error(format!("Failed to add {noun}: {reason}")));
            return Err(BindingError::Invalid(reason));
        }

        match self.store.insert(owner, draft).await {
            Ok(record) => {
                if self.still_acting_for(owner, "create").await {
                    self.items.lock().await.insert(0, record.clone());
                }
                self.notifier.notify(Notification::success(format!(
                    "{} added successfully",
                    E::LABEL
                )));
                Ok(record)
            }
            Err(e) => {
                error!(backend = self.store.backend(), "Error adding {noun}: {e}");
                self.notifier
                    .notify(Notification::error(format!("Failed to add {noun}")));
                Err(e.into())
            }
        }
    }

    pub async fn update(&self, id: Uuid, patch: E::Patch) -> Result<E, BindingError> {
        let owner = self.identity().await.ok_or(BindingError::NoIdentity)?;
        let noun = E::LABEL.to_lowercase();

        if let Err(reason) = E::validate_patch(&patch) {
            warn!("Rejected {noun} update before submission: {reason}");
            self.notifier
                .notify(Notification::error(format!("Failed to update {noun}: {reason}")));
            return Err(BindingError::Invalid(reason));
        }

        match self.store.update(owner, id, patch).await {
            Ok(record) => {
                if self.still_acting_for(owner, "update").await {
                    let mut items = self.items.lock().await;
                    if let Some(slot) = items.iter_mut().find(|r| r.id() == id) {
                        *slot = record.clone();
                    }
                }
                self.notifier.notify(Notification::success(format!(
                    "{} updated successfully",
                    E::LABEL
                )));
                Ok(record)
            }
            Err(e) => {
                error!(backend = self.store.backend(), "Error updating {noun} {id}: {e}");
                self.notifier
                    .notify(Notification::error(format!("Failed to update {noun}")));
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), BindingError> {
        let owner = self.identity().await.ok_or(BindingError::NoIdentity)?;
        let noun = E::LABEL.to_lowercase();

        match self.store.delete(owner, id).await {
            Ok(()) => {
                if self.still_acting_for(owner, "delete").await {
                    self.items.lock().await.retain(|r| r.id() != id);
                }
                self.notifier.notify(Notification::success(format!(
                    "{} deleted successfully",
                    E::LABEL
                )));
                Ok(())
            }
            Err(e) => {
                error!(backend = self.store.backend(), "Error deleting {noun} {id}: {e}");
                self.notifier
                    .notify(Notification::error(format!("Failed to delete {noun}")));
                Err(e.into())
            }
        }
    }

    /// False when the identity moved away from `owner` while a store call was
    /// in flight. The result then belongs to a collection this binding no
    /// longer shows and must not be merged.
    async fn still_acting_for(&self, owner: Uuid, op: &str) -> bool {
        if self.identity().await == Some(owner) {
            return true;
        }
        debug!("Discarding stale {} {op} for {owner}", E::PLURAL);
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::models::application::NewJobApplication;
    use crate::models::contact::{ContactPatch, NewContact};
    use crate::models::cover_letter::NewCoverLetter;
    use crate::models::profile::NewProfile;
    use crate::models::skill::{NewSkill, SkillPatch};
    use crate::models::{Contact, CoverLetter, JobApplication, Profile, Skill};
    use crate::store::MemoryStore;

    /// Memory store that can be switched into failing mode and counts calls.
    struct FlakyStore<E: Entity> {
        inner: MemoryStore<E>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl<E: Entity> FlakyStore<E> {
        fn new() -> Self {
            Self {
                inner: MemoryStore::default(),
                failing: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }

        fn fail(&self, on: bool) {
            self.failing.store(on, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn gate(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<E: Entity> EntityStore<E> for FlakyStore<E> {
        fn backend(&self) -> &'static str {
            "flaky"
        }

        async fn list(&self, owner: Uuid) -> Result<Vec<E>, StoreError> {
            self.gate()?;
            self.inner.list(owner).await
        }

        async fn insert(&self, owner: Uuid, draft: E::Draft) -> Result<E, StoreError> {
            self.gate()?;
            self.inner.insert(owner, draft).await
        }

        async fn update(&self, owner: Uuid, id: Uuid, patch: E::Patch) -> Result<E, StoreError> {
            self.gate()?;
            self.inner.update(owner, id, patch).await
        }

        async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
            self.gate()?;
            self.inner.delete(owner, id).await
        }
    }

    /// Memory store whose next call, once armed, parks until released.
    struct GatedStore<E: Entity> {
        inner: MemoryStore<E>,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl<E: Entity> GatedStore<E> {
        fn new() -> Self {
            Self {
                inner: MemoryStore::default(),
                armed: AtomicBool::new(false),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }

        fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }

        async fn pass(&self) {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl<E: Entity> EntityStore<E> for GatedStore<E> {
        fn backend(&self) -> &'static str {
            "gated"
        }

        async fn list(&self, owner: Uuid) -> Result<Vec<E>, StoreError> {
            self.pass().await;
            self.inner.list(owner).await
        }

        async fn insert(&self, owner: Uuid, draft: E::Draft) -> Result<E, StoreError> {
            self.pass().await;
            self.inner.insert(owner, draft).await
        }

        async fn update(&self, owner: Uuid, id: Uuid, patch: E::Patch) -> Result<E, StoreError> {
            self.pass().await;
            self.inner.update(owner, id, patch).await
        }

        async fn delete(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
            self.pass().await;
            self.inner.delete(owner, id).await
        }
    }

    fn gated_binding() -> (EntityBinding<Contact>, Arc<GatedStore<Contact>>) {
        let store = Arc::new(GatedStore::<Contact>::new());
        let binding: EntityBinding<Contact> =
            EntityBinding::new(store.clone(), Arc::new(NotificationLog::default()));
        (binding, store)
    }

    fn binding<E: Entity>() -> (EntityBinding<E>, Arc<FlakyStore<E>>, Arc<NotificationLog>) {
        let store = Arc::new(FlakyStore::<E>::new());
        let log = Arc::new(NotificationLog::default());
        let binding: EntityBinding<E> = EntityBinding::new(store.clone(), log.clone());
        (binding, store, log)
    }

    fn contact(name: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn skill(level: i32) -> NewSkill {
        NewSkill {
            name: "Rust".to_string(),
            category: "technical".to_string(),
            proficiency_level: level,
            notes: None,
        }
    }

    async fn assert_create_then_load<E: Entity>(draft: E::Draft) {
        let (binding, _store, _log) = binding::<E>();
        let user = Uuid::new_v4();
        binding.set_identity(Some(user)).await;

        let created = binding.create(draft).await.unwrap();
        binding.load().await;

        let items = binding.items().await;
        let found = items.iter().find(|r| r.id() == created.id()).unwrap();
        assert_eq!(found.owner(), user, "{} owner must be the caller", E::LABEL);
    }

    #[tokio::test]
    async fn test_create_then_load_for_every_entity() {
        assert_create_then_load::<JobApplication>(NewJobApplication {
            company_name: "Acme".to_string(),
            position_title: "Platform Engineer".to_string(),
            ..Default::default()
        })
        .await;
        assert_create_then_load::<Contact>(contact("Ada Lovelace")).await;
        assert_create_then_load::<Skill>(skill(4)).await;
        assert_create_then_load::<CoverLetter>(NewCoverLetter {
            title: "Cover Letter for SRE at Acme".to_string(),
            company_name: "Acme".to_string(),
            position_title: "SRE".to_string(),
            content: "Dear hiring manager".to_string(),
            job_description: None,
            tone: "professional".to_string(),
            status: "draft".to_string(),
        })
        .await;
        assert_create_then_load::<Profile>(NewProfile::default()).await;
    }

    #[tokio::test]
    async fn test_delete_then_load_omits_record() {
        let (binding, _store, log) = binding::<Contact>();
        binding.set_identity(Some(Uuid::new_v4())).await;

        let keep = binding.create(contact("Keep")).await.unwrap();
        let gone = binding.create(contact("Gone")).await.unwrap();
        binding.delete(gone.id).await.unwrap();
        binding.load().await;

        let ids: Vec<_> = binding.items().await.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![keep.id]);
        assert_eq!(
            log.snapshot().last().unwrap().description,
            "Contact deleted successfully"
        );
    }

    #[tokio::test]
    async fn test_update_merges_without_touching_identity() {
        let (binding, _store, _log) = binding::<Contact>();
        let user = Uuid::new_v4();
        binding.set_identity(Some(user)).await;
        let created = binding.create(contact("Ada")).await.unwrap();

        let patch: ContactPatch = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "company": "Analytical Engines Ltd"
        }))
        .unwrap();
        let updated = binding.update(created.id, patch).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.user_id, user);
        let local = binding.items().await;
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].company.as_deref(), Some("Analytical Engines Ltd"));
        assert_eq!(local[0].name, "Ada");
    }

    #[tokio::test]
    async fn test_out_of_range_proficiency_never_reaches_store() {
        let (binding, store, log) = binding::<Skill>();
        binding.set_identity(Some(Uuid::new_v4())).await;
        let calls_after_load = store.calls();

        let err = binding.create(skill(6)).await.unwrap_err();
        assert!(matches!(err, BindingError::Invalid(_)));

        let ok = binding.create(skill(3)).await.unwrap();
        let patch = SkillPatch {
            proficiency_level: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            binding.update(ok.id, patch).await,
            Err(BindingError::Invalid(_))
        ));

        // Only the valid create hit the store.
        assert_eq!(store.calls(), calls_after_load + 1);
        assert_eq!(log.errors().len(), 2);
        assert_eq!(binding.items().await[0].proficiency_level, 3);
    }

    #[tokio::test]
    async fn test_operations_without_identity() {
        let (binding, store, log) = binding::<Contact>();

        binding.load().await;
        assert!(matches!(
            binding.create(contact("Nobody")).await,
            Err(BindingError::NoIdentity)
        ));
        assert!(matches!(
            binding.delete(Uuid::new_v4()).await,
            Err(BindingError::NoIdentity)
        ));

        assert_eq!(store.calls(), 0);
        assert!(log.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_items() {
        let (binding, store, log) = binding::<Contact>();
        binding.set_identity(Some(Uuid::new_v4())).await;
        binding.create(contact("Ada")).await.unwrap();

        store.fail(true);
        binding.load().await;

        assert_eq!(binding.items().await.len(), 1);
        let errors = log.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, "Failed to fetch contacts");
        assert!(!binding.is_loading());
    }

    #[tokio::test]
    async fn test_failed_create_and_delete_leave_collection_unchanged() {
        let (binding, store, log) = binding::<Contact>();
        binding.set_identity(Some(Uuid::new_v4())).await;
        let existing = binding.create(contact("Ada")).await.unwrap();

        store.fail(true);
        assert!(matches!(
            binding.create(contact("Grace")).await,
            Err(BindingError::Store(_))
        ));
        assert!(matches!(
            binding.delete(existing.id).await,
            Err(BindingError::Store(_))
        ));

        let items = binding.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, existing.id);
        let descriptions: Vec<_> = log.errors().into_iter().map(|n| n.description).collect();
        assert_eq!(
            descriptions,
            vec!["Failed to add contact", "Failed to delete contact"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_each_append_once() {
        let (binding, _store, _log) = binding::<Contact>();
        binding.set_identity(Some(Uuid::new_v4())).await;

        let (a, b, c) = tokio::join!(
            binding.create(contact("A")),
            binding.create(contact("B")),
            binding.create(contact("C")),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(binding.items().await.len(), 3);

        binding.load().await;
        assert_eq!(binding.items().await.len(), 3);
    }

    #[tokio::test]
    async fn test_identity_change_reloads_and_logout_clears() {
        let store: Arc<dyn EntityStore<Contact>> = Arc::new(MemoryStore::<Contact>::default());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.insert(alice, contact("Alice's")).await.unwrap();
        store.insert(bob, contact("Bob's")).await.unwrap();

        let binding = EntityBinding::new(store, Arc::new(NotificationLog::default()));
        binding.set_identity(Some(alice)).await;
        assert_eq!(binding.items().await[0].name, "Alice's");

        binding.set_identity(Some(bob)).await;
        let items = binding.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bob's");

        binding.set_identity(None).await;
        assert!(binding.items().await.is_empty());
        assert_eq!(binding.identity().await, None);
    }

    #[tokio::test]
    async fn test_create_in_flight_across_logout_is_not_merged() {
        let (binding, store) = gated_binding();
        let alice = Uuid::new_v4();
        binding.set_identity(Some(alice)).await;

        store.arm();
        let (created, ()) = tokio::join!(binding.create(contact("Alice's secret")), async {
            store.entered.notified().await;
            binding.set_identity(None).await;
            store.release.notify_one();
        });

        // The caller still gets the persisted record.
        let created = created.unwrap();
        assert_eq!(created.user_id, alice);
        assert!(binding.items().await.is_empty());
        assert_eq!(store.inner.list(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_in_flight_across_identity_switch_is_not_merged() {
        let (binding, store) = gated_binding();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.inner.insert(bob, contact("Bob's")).await.unwrap();
        binding.set_identity(Some(alice)).await;

        store.arm();
        let (created, ()) = tokio::join!(binding.create(contact("Alice's")), async {
            store.entered.notified().await;
            binding.set_identity(Some(bob)).await;
            store.release.notify_one();
        });

        assert_eq!(created.unwrap().user_id, alice);
        let items = binding.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bob's");
    }

    #[tokio::test]
    async fn test_update_in_flight_across_logout_is_not_merged() {
        let (binding, store) = gated_binding();
        let alice = Uuid::new_v4();
        binding.set_identity(Some(alice)).await;
        let ada = binding.create(contact("Ada")).await.unwrap();

        store.arm();
        let patch = ContactPatch {
            company: Some("Babbage & Co".to_string()),
            ..Default::default()
        };
        let (updated, ()) = tokio::join!(binding.update(ada.id, patch), async {
            store.entered.notified().await;
            binding.set_identity(None).await;
            store.release.notify_one();
        });

        assert_eq!(updated.unwrap().company.as_deref(), Some("Babbage & Co"));
        assert!(binding.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded_after_identity_change() {
        let (binding, store) = gated_binding();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.inner.insert(alice, contact("Alice's")).await.unwrap();
        store.inner.insert(bob, contact("Bob's")).await.unwrap();
        binding.set_identity(Some(alice)).await;

        store.arm();
        tokio::join!(binding.load(), async {
            store.entered.notified().await;
            assert!(binding.is_loading());
            binding.set_identity(Some(bob)).await;
            store.release.notify_one();
        });

        // Alice's load finished last but must not overwrite Bob's collection.
        let items = binding.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bob's");
        assert_eq!(binding.identity().await, Some(bob));
        assert!(!binding.is_loading());
    }

    #[tokio::test]
    async fn test_failed_update_notifies_and_keeps_local_entry() {
        let (binding, store, log) = binding::<Contact>();
        binding.set_identity(Some(Uuid::new_v4())).await;
        let ada = binding.create(contact("Ada")).await.unwrap();

        store.fail(true);
        let patch = ContactPatch {
            name: Some("Countess".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            binding.update(ada.id, patch).await,
            Err(BindingError::Store(_))
        ));

        let items = binding.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Ada");
        assert_eq!(items[0].updated_at, ada.updated_at);
        let errors = log.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, "Failed to update contact");
    }

    #[tokio::test]
    async fn test_update_without_identity_never_reaches_store() {
        let (binding, store, log) = binding::<Contact>();

        let result = binding
            .update(Uuid::new_v4(), ContactPatch::default())
            .await;

        assert!(matches!(result, Err(BindingError::NoIdentity)));
        assert_eq!(store.calls(), 0);
        assert!(log.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_for_owner_acts_without_initial_load() {
        let store = Arc::new(FlakyStore::<Contact>::new());
        let owner = Uuid::new_v4();
        let binding: EntityBinding<Contact> =
            EntityBinding::for_owner(store.clone(), Arc::new(NotificationLog::default()), owner);

        assert_eq!(binding.identity().await, Some(owner));
        assert_eq!(store.calls(), 0);

        let created = binding.create(contact("Ada")).await.unwrap();
        assert_eq!(created.user_id, owner);
        assert_eq!(binding.items().await.len(), 1);
    }
}
