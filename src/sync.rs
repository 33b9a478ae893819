//! Client-side synchronization of the medicine list.
//!
//! [`InventorySyncController`] owns the items shown to the user, the active
//! search filter and the add-item draft. Every mutation goes to the server
//! first and is followed by a full re-fetch; local state is never patched
//! with unconfirmed data.
//!
//! Each refresh is tagged with a sequence number when it is issued. A
//! response is applied only if no newer refresh has been issued since, so
//! the last-issued request wins even when responses arrive out of order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use log::{debug, info, warn};

use crate::client::{HttpMedicineApi, MedicineApi};
use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::models::{Medicine, MedicineRow};
use crate::validator::{FieldValidator, FormField, MedicineForm, QuantityEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the list; carries the new item count.
    Applied(usize),
    /// A newer refresh was issued before this one finished; its result was dropped.
    Superseded,
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied(_))
    }
}

#[derive(Debug, Default)]
struct SyncState {
    items: Vec<Medicine>,
    filter: String,
    /// Filter the current `items` were fetched with; `None` before the first fetch.
    loaded_filter: Option<String>,
    form: MedicineForm,
}

pub struct InventorySyncController<A> {
    api: A,
    state: RwLock<SyncState>,
    issued: AtomicU64,
    filter_generation: AtomicU64,
    search_debounce: Duration,
}

impl InventorySyncController<HttpMedicineApi> {
    pub fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        let api = HttpMedicineApi::new(config)?;
        Ok(Self::new(api).with_search_debounce(config.search_debounce()))
    }
}

impl<A: MedicineApi> InventorySyncController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: RwLock::new(SyncState::default()),
            issued: AtomicU64::new(0),
            filter_generation: AtomicU64::new(0),
            search_debounce: Duration::ZERO,
        }
    }

    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // Locks are only ever held for plain reads/writes, never across an await.
    fn read(&self) -> RwLockReadGuard<'_, SyncState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SyncState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== READ-ONLY ACCESSORS ====================

    pub fn items(&self) -> Vec<Medicine> {
        self.read().items.clone()
    }

    pub fn rows(&self) -> Vec<MedicineRow> {
        self.read().items.iter().cloned().map(MedicineRow::from).collect()
    }

    pub fn filter(&self) -> String {
        self.read().filter.clone()
    }

    pub fn loaded_filter(&self) -> Option<String> {
        self.read().loaded_filter.clone()
    }

    pub fn form(&self) -> MedicineForm {
        self.read().form.clone()
    }

    // ==================== REFRESH ====================

    fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Re-fetches the list for `filter` and replaces `items`, unless a newer
    /// refresh was issued while this one was in flight.
    pub async fn refresh(&self, filter: &str) -> SyncResult<RefreshOutcome> {
        let seq = self.issue();
        self.fetch(filter, seq).await
    }

    async fn fetch(&self, filter: &str, seq: u64) -> SyncResult<RefreshOutcome> {
        debug!("refresh #{} issued (filter {:?})", seq, filter);

        let result = self.api.list(filter).await;

        let mut state = self.write();
        if self.issued.load(Ordering::SeqCst) != seq {
            debug!("refresh #{} superseded, dropping response", seq);
            return Ok(RefreshOutcome::Superseded);
        }

        match result {
            Ok(items) => {
                let count = items.len();
                state.items = items;
                state.loaded_filter = Some(filter.to_string());
                debug!("refresh #{} applied: {} items", seq, count);
                Ok(RefreshOutcome::Applied(count))
            }
            Err(err) => {
                warn!("refresh #{} failed, keeping last known list: {}", seq, err);
                Err(err)
            }
        }
    }

    /// Refresh with the current filter.
    pub async fn reload(&self) -> SyncResult<RefreshOutcome> {
        // filter and sequence number are taken together so a concurrent
        // set_filter always outranks this request
        let (filter, seq) = {
            let state = self.write();
            (state.filter.clone(), self.issue())
        };
        self.fetch(&filter, seq).await
    }

    // ==================== FILTER ====================

    pub async fn set_filter(&self, text: impl Into<String>) -> SyncResult<RefreshOutcome> {
        let text = text.into();
        let generation = {
            let mut state = self.write();
            state.filter = text.clone();
            // responses for the previous filter are stale from here on
            self.issue();
            self.filter_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        if !self.search_debounce.is_zero() {
            tokio::time::sleep(self.search_debounce).await;
        }

        let seq = {
            let _state = self.write();
            if self.filter_generation.load(Ordering::SeqCst) != generation {
                return Ok(RefreshOutcome::Superseded);
            }
            self.issue()
        };
        self.fetch(&text, seq).await
    }

    // ==================== ADD ====================

    async fn create(&self, candidate: &MedicineForm) -> SyncResult<()> {
        let medicine = candidate.parse()?;
        self.api.create(&medicine).await.map_err(|err| {
            warn!("create of medicine {} rejected: {}", medicine.id, err);
            err
        })?;
        info!("medicine {} ({}) created", medicine.id, medicine.name);
        Ok(())
    }

    /// Validates `candidate`, creates it on the server and re-fetches.
    /// A rejected create leaves `items` untouched and skips the refresh.
    pub async fn add_item(&self, candidate: &MedicineForm) -> SyncResult<RefreshOutcome> {
        self.create(candidate).await?;
        self.reload().await
    }

    pub fn set_form_field(&self, field: FormField, value: impl Into<String>) {
        self.write().form.set(field, value);
    }

    /// `add_item` on the draft form. The draft is cleared once the server accepted it.
    pub async fn submit_form(&self) -> SyncResult<RefreshOutcome> {
        let draft = self.form();
        self.create(&draft).await?;

        {
            let mut state = self.write();
            // keep anything typed while the request was in flight
            if state.form == draft {
                state.form.clear();
            }
        }

        self.reload().await
    }

    // ==================== DELETE ====================

    /// Deletes `id` and always re-fetches, whatever the server answered.
    /// A delete failure takes precedence over a refresh failure.
    pub async fn delete_item(&self, id: i64) -> SyncResult<RefreshOutcome> {
        let deleted = self.api.delete(id).await;
        if let Err(err) = &deleted {
            warn!("delete of medicine {} failed: {}", id, err);
        }

        let refreshed = self.reload().await;
        deleted?;
        refreshed
    }

    // ==================== QUANTITY ====================

    /// Sends a quantity typed into an editable cell. Called once per blur.
    pub async fn set_quantity(&self, id: i64, new_quantity: &str) -> SyncResult<RefreshOutcome> {
        let quantity = FieldValidator::quantity(new_quantity).map_err(SyncError::Validation)?;

        let updated = self.api.update_quantity(id, quantity).await;
        if let Err(err) = &updated {
            warn!("quantity update of medicine {} failed: {}", id, err);
        }

        let refreshed = self.reload().await;
        updated?;
        refreshed
    }

    /// Blur handler for a [`QuantityEdit`]; does nothing when the value is unchanged.
    pub async fn commit_quantity(&self, edit: &QuantityEdit) -> SyncResult<Option<RefreshOutcome>> {
        match edit.commit() {
            Some(text) => self.set_quantity(edit.id, text).await.map(Some),
            None => Ok(None),
        }
    }
}
