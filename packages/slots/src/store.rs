//! The slot table and its lifecycle.
//!
//! A [`SlotStore`] owns the settings backend, the live (system) record, and
//! one record per slot. Records are loaded lazily on [`SlotStore::init`] and
//! released with [`SlotStore::free_all`]. Every mutation goes through the
//! writer and then updates the in-memory table to mirror what was written.
//!
//! Loading never fails as a whole. A namespace that cannot be read completely
//! is reported in its [`RecordLoad`] and the rest of the table still loads:
//! after a storage error the record keeps what was read, after an allocation
//! failure it stays empty.
//!
//! The store itself is not synchronized. [`SharedSlotStore`] wraps it in a
//! mutex so a command processor and an activation trigger can share it; each
//! operation then runs as one critical section.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keymap_settings::SettingsStore;
use serde::Serialize;

use crate::codec::{Field, Namespace};
use crate::config::SlotConfig;
use crate::consumer::{KeymapConsumer, NoopConsumer};
use crate::equality;
use crate::error::SlotError;
use crate::loader::{self, LoadError, LoadSummary};
use crate::record::SlotRecord;
use crate::writer::{self, WriteSummary};

/// Whether `save` may replace an occupied slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Save,
    Overwrite,
}

/// Why a namespace did not load completely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadFailure {
    /// An allocation failed; the record was left empty.
    OutOfMemory { field: Field },
    /// Enumeration stopped part way; the record holds what was read before.
    Storage { message: String },
}

impl From<&LoadError> for LoadFailure {
    fn from(e: &LoadError) -> Self {
        match e {
            LoadError::OutOfMemory { field, .. } => LoadFailure::OutOfMemory { field: *field },
            LoadError::Storage { source, .. } => LoadFailure::Storage {
                message: source.to_string(),
            },
        }
    }
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailure::OutOfMemory { field } => {
                write!(f, "out of memory loading {}, record discarded", field)
            }
            LoadFailure::Storage { message } => {
                write!(f, "read failed, record may be partially populated: {}", message)
            }
        }
    }
}

/// What one namespace looked like when it was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLoad {
    pub namespace: Namespace,
    pub total_size: usize,
    pub summary: LoadSummary,
    pub failure: Option<LoadFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyInitialized,
    Loaded(Vec<RecordLoad>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    /// 0-based slot index.
    pub index: usize,
    pub occupied: bool,
    pub name: Option<String>,
    pub total_size: usize,
    pub active: bool,
}

/// Snapshot of the table produced by [`SlotStore::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub system_free: bool,
    pub system_size: usize,
    pub slots: Vec<SlotStatus>,
    pub active: Option<usize>,
    pub loads: Vec<RecordLoad>,
}

impl StatusReport {
    /// The live keymap holds edits that no slot captures.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.system_free && self.active.is_none()
    }
}

pub struct SlotStore<S> {
    settings: S,
    consumer: Box<dyn KeymapConsumer>,
    config: SlotConfig,
    system: SlotRecord,
    slots: Vec<SlotRecord>,
    initialized: bool,
}

impl<S: SettingsStore> SlotStore<S> {
    pub fn new(settings: S, config: SlotConfig) -> Self {
        Self {
            settings,
            consumer: Box::new(NoopConsumer),
            config,
            system: SlotRecord::new(config.layers()),
            slots: vec![SlotRecord::new(config.layers()); config.slots()],
            initialized: false,
        }
    }

    /// Replace the consumer notified after the live keymap changes.
    #[must_use]
    pub fn with_consumer(mut self, consumer: impl KeymapConsumer + 'static) -> Self {
        self.consumer = Box::new(consumer);
        self
    }

    pub fn config(&self) -> SlotConfig {
        self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn system(&self) -> &SlotRecord {
        &self.system
    }

    pub fn slots(&self) -> &[SlotRecord] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&SlotRecord> {
        self.slots.get(index)
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn into_settings(self) -> S {
        self.settings
    }

    /// Load the system record and every slot. A second call is a no-op.
    pub fn init(&mut self) -> InitOutcome {
        if self.initialized {
            return InitOutcome::AlreadyInitialized;
        }
        InitOutcome::Loaded(self.load_all())
    }

    pub fn ensure_loaded(&mut self) {
        self.init();
    }

    /// Drop the table and load everything again from storage.
    pub fn reload(&mut self) -> Vec<RecordLoad> {
        self.free_all();
        self.load_all()
    }

    /// Reload from storage and describe every slot.
    pub fn status(&mut self) -> StatusReport {
        let loads = self.reload();
        let active = self.active_slot();

        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(index, record)| SlotStatus {
                index,
                occupied: !record.is_free(),
                name: record.name().map(str::to_string),
                total_size: record.total_size(),
                active: active == Some(index),
            })
            .collect();

        StatusReport {
            system_free: self.system.is_free(),
            system_size: self.system.total_size(),
            slots,
            active,
            loads,
        }
    }

    /// First slot whose content matches the live keymap.
    pub fn active_slot(&self) -> Option<usize> {
        if !self.initialized {
            return None;
        }
        self.slots
            .iter()
            .position(|slot| equality::is_active(slot, &self.system))
    }

    /// First occupied slot labelled exactly `name`.
    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| !slot.is_free() && slot.name() == Some(name))
    }

    /// Store the live keymap in slot `index` under `name`.
    pub fn save(&mut self, index: usize, name: &str, mode: SaveMode) -> Result<WriteSummary, SlotError> {
        self.require_initialized()?;
        self.check_index(index)?;
        if name.is_empty() {
            return Err(SlotError::EmptyName);
        }
        if self.system.is_free() {
            return Err(SlotError::SystemEmpty);
        }
        if mode == SaveMode::Save && !self.slots[index].is_free() {
            return Err(SlotError::SlotOccupied { index });
        }

        let record = self.system.clone().with_name(name);
        let namespace = Namespace::Slot(index);
        match writer::write_record(&mut self.settings, &record, namespace) {
            Ok(summary) => {
                tracing::info!(slot = index, name, bytes = record.total_size(), "keymap saved");
                self.slots[index] = record;
                Ok(summary)
            }
            Err(e) => {
                self.resync(namespace);
                Err(e.into())
            }
        }
    }

    /// Copy slot `index` over the live keymap and notify the consumer.
    pub fn activate(&mut self, index: usize) -> Result<WriteSummary, SlotError> {
        self.ensure_loaded();
        self.check_index(index)?;
        if self.slots[index].is_free() {
            return Err(SlotError::SlotEmpty { index });
        }

        let record = self.slots[index].without_name();
        match writer::write_record(&mut self.settings, &record, Namespace::System) {
            Ok(summary) => {
                tracing::info!(slot = index, name = ?self.slots[index].name(), "slot activated");
                self.system = record;
                self.consumer.discard_in_memory_overrides();
                Ok(summary)
            }
            Err(e) => {
                self.resync(Namespace::System);
                Err(e.into())
            }
        }
    }

    /// Activate the first occupied slot labelled `name`; returns its index.
    pub fn activate_named(&mut self, name: &str) -> Result<usize, SlotError> {
        self.ensure_loaded();
        let index = self.find_slot(name).ok_or_else(|| SlotError::SlotNotFound {
            name: name.to_string(),
        })?;
        self.activate(index)?;
        Ok(index)
    }

    /// Clear slot `index`. Destroying an empty slot succeeds.
    pub fn destroy(&mut self, index: usize) -> Result<(), SlotError> {
        self.require_initialized()?;
        self.check_index(index)?;

        let namespace = Namespace::Slot(index);
        if let Err(e) = writer::clear_namespace(&mut self.settings, namespace) {
            self.resync(namespace);
            return Err(e.into());
        }
        self.slots[index].free();
        tracing::info!(slot = index, "slot destroyed");
        Ok(())
    }

    /// Clear the live keymap so the firmware defaults apply, and notify the
    /// consumer. Works whether or not the table is loaded.
    pub fn restore(&mut self) -> Result<(), SlotError> {
        if let Err(e) = writer::clear_namespace(&mut self.settings, Namespace::System) {
            self.resync(Namespace::System);
            return Err(e.into());
        }
        self.system.free();
        self.consumer.discard_in_memory_overrides();
        tracing::info!("default keymap restored");
        Ok(())
    }

    /// Release every record and mark the store uninitialized. Returns whether
    /// anything was loaded.
    pub fn free_all(&mut self) -> bool {
        let was_initialized = self.initialized;
        self.system.free();
        self.slots.iter_mut().for_each(SlotRecord::free);
        self.initialized = false;
        was_initialized
    }

    fn require_initialized(&self) -> Result<(), SlotError> {
        if self.initialized {
            Ok(())
        } else {
            Err(SlotError::NotInitialized)
        }
    }

    fn check_index(&self, index: usize) -> Result<(), SlotError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(SlotError::InvalidSlot {
                index,
                capacity: self.slots.len(),
            })
        }
    }

    fn load_all(&mut self) -> Vec<RecordLoad> {
        let mut loads = Vec::with_capacity(self.slots.len() + 1);
        loads.push(load_namespace(
            &mut self.settings,
            Namespace::System,
            &mut self.system,
        ));
        for (index, slot) in self.slots.iter_mut().enumerate() {
            loads.push(load_namespace(&mut self.settings, Namespace::Slot(index), slot));
        }

        self.initialized = true;
        let failed = loads.iter().filter(|load| load.failure.is_some()).count();
        tracing::debug!(slots = self.slots.len(), failed, "slot store initialized");
        loads
    }

    /// After a failed write the table no longer mirrors storage; read the
    /// namespace back so it does.
    fn resync(&mut self, namespace: Namespace) {
        if !self.initialized {
            return;
        }
        let target = match namespace {
            Namespace::System => &mut self.system,
            Namespace::Slot(index) => match self.slots.get_mut(index) {
                Some(slot) => slot,
                None => return,
            },
        };
        if let Err(e) = loader::load_into(&mut self.settings, namespace, target) {
            tracing::warn!(%namespace, error = %e, "could not re-read namespace after failed write");
        }
    }
}

fn load_namespace<S: SettingsStore>(
    settings: &mut S,
    namespace: Namespace,
    target: &mut SlotRecord,
) -> RecordLoad {
    let (summary, failure) = match loader::load_into(settings, namespace, target) {
        Ok(summary) => (summary, None),
        Err(e) => {
            tracing::warn!(%namespace, error = %e, "namespace not fully loaded, continuing");
            (LoadSummary::default(), Some(LoadFailure::from(&e)))
        }
    };
    RecordLoad {
        namespace,
        total_size: target.total_size(),
        summary,
        failure,
    }
}

/// A [`SlotStore`] behind a mutex, shareable between threads.
pub struct SharedSlotStore<S> {
    inner: Arc<Mutex<SlotStore<S>>>,
}

impl<S> Clone for SharedSlotStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SettingsStore> SharedSlotStore<S> {
    pub fn new(store: SlotStore<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store. A panic in another holder does not leave the table in
    /// a torn state, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, SlotStore<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<T>(&self, f: impl FnOnce(&mut SlotStore<S>) -> T) -> T {
        f(&mut self.lock())
    }
}

impl<S: SettingsStore> From<SlotStore<S>> for SharedSlotStore<S> {
    fn from(store: SlotStore<S>) -> Self {
        Self::new(store)
    }
}
