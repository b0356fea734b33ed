//! Reconciliation of draft updates against persisted state.
//!
//! For every draft: derive its identity, look up the stored record, and
//! classify it as [`UpdateOutcome::New`], [`UpdateOutcome::Updated`] or
//! [`UpdateOutcome::Unchanged`], writing only when needed.

use async_trait::async_trait;
use tracing::{debug, instrument};

use releasewatch_shared::{
    DraftUpdate, PersistedUpdate, ReleaseWatchError, Result, UpdateId, UpdateOutcome,
};
use releasewatch_storage::Storage;

use crate::identity::unique_id;

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// The storage surface the reconciler needs.
#[async_trait]
pub trait UpdateStore: Send + Sync {
    /// Point lookup by identity.
    async fn find(&self, unique_id: &UpdateId) -> Result<Option<PersistedUpdate>>;

    /// Insert a new record. Must fail with [`ReleaseWatchError::Conflict`]
    /// when the identity already exists.
    async fn insert(&self, update: &PersistedUpdate) -> Result<()>;

    /// Overwrite `version`, `description` and `link` if any differ.
    /// Returns whether a write happened.
    async fn overwrite_content(&self, unique_id: &UpdateId, draft: &DraftUpdate) -> Result<bool>;
}

#[async_trait]
impl UpdateStore for Storage {
    async fn find(&self, unique_id: &UpdateId) -> Result<Option<PersistedUpdate>> {
        self.get_update(unique_id).await
    }

    async fn insert(&self, update: &PersistedUpdate) -> Result<()> {
        self.insert_update(update).await
    }

    async fn overwrite_content(&self, unique_id: &UpdateId, draft: &DraftUpdate) -> Result<bool> {
        self.update_content(unique_id, draft).await
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Classifies drafts and applies the resulting writes.
pub struct Reconciler<'a> {
    store: &'a dyn UpdateStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn UpdateStore) -> Self {
        Self { store }
    }

    /// Reconcile one draft produced by `tool`.
    ///
    /// One read and at most one write. If another writer inserts the same
    /// identity between the read and the insert, the record is re-read and
    /// the draft continues down the update path.
    #[instrument(skip_all, fields(tool = tool, version = %draft.version))]
    pub async fn reconcile(&self, tool: &str, draft: &DraftUpdate) -> Result<UpdateOutcome> {
        let id = unique_id(tool, draft);

        if let Some(existing) = self.store.find(&id).await? {
            return self.apply_existing(&existing, draft).await;
        }

        let record = PersistedUpdate::first_seen(tool, id.clone(), draft);
        match self.store.insert(&record).await {
            Ok(()) => {
                debug!(unique_id = %id, "inserted");
                Ok(UpdateOutcome::New)
            }
            Err(e) if e.is_conflict() => {
                debug!(unique_id = %id, "insert lost a race, retrying as update");
                let existing = self.store.find(&id).await?.ok_or_else(|| {
                    ReleaseWatchError::Storage(format!(
                        "update {id} reported as existing but could not be read"
                    ))
                })?;
                self.apply_existing(&existing, draft).await
            }
            Err(e) => Err(e),
        }
    }

    async fn apply_existing(
        &self,
        existing: &PersistedUpdate,
        draft: &DraftUpdate,
    ) -> Result<UpdateOutcome> {
        if existing.same_content(draft) {
            return Ok(UpdateOutcome::Unchanged);
        }

        if self
            .store
            .overwrite_content(&existing.unique_id, draft)
            .await?
        {
            debug!(unique_id = %existing.unique_id, "content overwritten");
            Ok(UpdateOutcome::Updated)
        } else {
            Ok(UpdateOutcome::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use chrono::NaiveDate;

    /// In-memory store that counts writes and can simulate a lost insert race.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<UpdateId, PersistedUpdate>>,
        writes: AtomicUsize,
        /// When set, the first `find` misses and the next `insert` hits a
        /// row some other writer stored in the meantime.
        racing_row: Mutex<Option<PersistedUpdate>>,
        raced: AtomicBool,
    }

    #[async_trait]
    impl UpdateStore for MemoryStore {
        async fn find(&self, unique_id: &UpdateId) -> Result<Option<PersistedUpdate>> {
            if self.racing_row.lock().unwrap().is_some() && !self.raced.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(self.rows.lock().unwrap().get(unique_id).cloned())
        }

        async fn insert(&self, update: &PersistedUpdate) -> Result<()> {
            if let Some(row) = self.racing_row.lock().unwrap().take() {
                self.raced.store(true, Ordering::SeqCst);
                self.rows.lock().unwrap().insert(row.unique_id.clone(), row);
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&update.unique_id) {
                return Err(ReleaseWatchError::Conflict {
                    unique_id: update.unique_id.to_string(),
                });
            }
            rows.insert(update.unique_id.clone(), update.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn overwrite_content(&self, unique_id: &UpdateId, draft: &DraftUpdate) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let Some(row) = rows.get_mut(unique_id) else {
                return Ok(false);
            };
            if row.same_content(draft) {
                return Ok(false);
            }
            row.version = draft.version.clone();
            row.description = draft.description.clone();
            row.link = draft.link.clone();
            row.revision += 1;
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl UpdateStore for BrokenStore {
        async fn find(&self, _unique_id: &UpdateId) -> Result<Option<PersistedUpdate>> {
            Err(ReleaseWatchError::Storage("connection refused".into()))
        }

        async fn insert(&self, _update: &PersistedUpdate) -> Result<()> {
            unreachable!("find always fails")
        }

        async fn overwrite_content(&self, _id: &UpdateId, _draft: &DraftUpdate) -> Result<bool> {
            unreachable!("find always fails")
        }
    }

    fn draft(description: &str) -> DraftUpdate {
        DraftUpdate {
            version: "CLI updates - Veracode CLI v2.44.0".into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            description: description.into(),
            link: "https://docs.veracode.com/updates/r/Veracode_CLI_Updates".into(),
        }
    }

    #[tokio::test]
    async fn new_then_unchanged() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(&store);

        let d = draft("Adds SBOM reports.");
        assert_eq!(reconciler.reconcile("Veracode", &d).await.unwrap(), UpdateOutcome::New);
        assert_eq!(
            reconciler.reconcile("Veracode", &d).await.unwrap(),
            UpdateOutcome::Unchanged
        );
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changed_description_is_updated_in_place() {
        let store = MemoryStore::default();
        let reconciler = Reconciler::new(&store);

        reconciler
            .reconcile("Veracode", &draft("Adds SBOM reports."))
            .await
            .unwrap();
        let created_at = store.rows.lock().unwrap().values().next().unwrap().created_at;

        let outcome = reconciler
            .reconcile("Veracode", &draft("Adds SBOM and license reports."))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows.values().next().unwrap();
        assert_eq!(row.description, "Adds SBOM and license reports.");
        assert_eq!(row.created_at, created_at);
        assert_eq!(row.revision, 2);
    }

    #[tokio::test]
    async fn lost_insert_race_continues_as_update() {
        let d = draft("Our description");
        let id = unique_id("Veracode", &d);
        let theirs = PersistedUpdate::first_seen("Veracode", id.clone(), &draft("Their description"));

        let store = MemoryStore {
            racing_row: Mutex::new(Some(theirs)),
            ..MemoryStore::default()
        };
        let reconciler = Reconciler::new(&store);

        let outcome = reconciler.reconcile("Veracode", &d).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);
        assert_eq!(
            store.rows.lock().unwrap()[&id].description,
            "Our description"
        );
    }

    #[tokio::test]
    async fn lost_insert_race_with_same_content_is_unchanged() {
        let d = draft("Same description");
        let id = unique_id("Veracode", &d);
        let theirs = PersistedUpdate::first_seen("Veracode", id, &d);

        let store = MemoryStore {
            racing_row: Mutex::new(Some(theirs)),
            ..MemoryStore::default()
        };
        let outcome = Reconciler::new(&store).reconcile("Veracode", &d).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let result = Reconciler::new(&BrokenStore)
            .reconcile("Veracode", &draft(""))
            .await;
        assert!(matches!(result, Err(ReleaseWatchError::Storage(_))));
    }

    #[tokio::test]
    async fn libsql_storage_round_trip() {
        let path = std::env::temp_dir().join(format!("rw_core_{}.db", uuid::Uuid::now_v7()));
        let storage = Storage::open(&path).await.unwrap();
        let reconciler = Reconciler::new(&storage);

        let first = draft("v1");
        assert_eq!(reconciler.reconcile("Veracode", &first).await.unwrap(), UpdateOutcome::New);
        let id = unique_id("Veracode", &first);
        let before = storage.get_update(&id).await.unwrap().unwrap();

        let changed = DraftUpdate {
            link: "https://docs.veracode.com/updates/r/c_all_static".into(),
            ..draft("v2")
        };
        assert_eq!(
            reconciler.reconcile("Veracode", &changed).await.unwrap(),
            UpdateOutcome::Updated
        );
        assert_eq!(
            reconciler.reconcile("Veracode", &changed).await.unwrap(),
            UpdateOutcome::Unchanged
        );

        let after = storage.get_update(&id).await.unwrap().unwrap();
        assert_eq!(after.description, "v2");
        assert_eq!(after.link, "https://docs.veracode.com/updates/r/c_all_static");
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.revision, 2);
        assert_eq!(storage.count_updates().await.unwrap(), 1);
    }
}
