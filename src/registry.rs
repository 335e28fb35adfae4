//! Copy-on-write producer registry with a one-way phase latch.
//!
//! Readers take a cheap snapshot of the current map (`Arc` clone under a
//! short read lock) and never contend with each other. Writers clone the map,
//! insert, and swap the `Arc`, so in-flight readers keep seeing a consistent
//! older snapshot. The phase latch is a one-way `AtomicBool`: once locked,
//! registration-phase mutation is rejected permanently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::producer::Producer;
use crate::registration::CollectionRegistration;

type ProducerMap = HashMap<ServiceKey, Arc<Producer>>;
type CollectionMap = HashMap<ServiceKey, Arc<CollectionRegistration>>;

pub(crate) struct Registry {
    producers: RwLock<Arc<ProducerMap>>,
    collections: RwLock<Arc<CollectionMap>>,
    locked: AtomicBool,
    // Serializes registration-phase mutation so duplicate checks and the
    // snapshot swap happen atomically with respect to other registrations.
    registration_lock: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            producers: RwLock::new(Arc::new(HashMap::new())),
            collections: RwLock::new(Arc::new(HashMap::new())),
            locked: AtomicBool::new(false),
            registration_lock: Mutex::new(()),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Transitions the container into the locked phase. One-way; idempotent.
    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Arc<ProducerMap> {
        match self.producers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn collections_snapshot(&self) -> Arc<CollectionMap> {
        match self.collections.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Registration-phase insert: rejected once locked, rejects duplicates.
    pub fn insert_registered(
        &self,
        op: &'static str,
        key: ServiceKey,
        producer: Arc<Producer>,
    ) -> DiResult<()> {
        let _serial = match self.registration_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.is_locked() {
            return Err(DiError::AlreadyLocked(op));
        }
        if self.snapshot().contains_key(&key) {
            return Err(DiError::DuplicateRegistration(key.display_name()));
        }
        self.install(key, producer);
        Ok(())
    }

    /// Registration-phase collection insert.
    pub fn insert_collection(
        &self,
        op: &'static str,
        key: ServiceKey,
        collection: Arc<CollectionRegistration>,
    ) -> DiResult<()> {
        let _serial = match self.registration_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.is_locked() {
            return Err(DiError::AlreadyLocked(op));
        }
        if self.collections_snapshot().contains_key(&key) {
            return Err(DiError::DuplicateCollectionRegistration(key.display_name()));
        }
        let mut guard = match self.collections.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = (**guard).clone();
        next.insert(key, collection);
        *guard = Arc::new(next);
        Ok(())
    }

    /// Installs a producer via copy-on-write swap. Used both during the
    /// registration phase (under the registration lock) and for just-in-time
    /// producers after locking. Returns the producer now in the map: when two
    /// threads race to install for the same key, the first install wins and
    /// both threads share it.
    pub fn install(&self, key: ServiceKey, producer: Arc<Producer>) -> Arc<Producer> {
        let mut guard = match self.producers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(existing) = guard.get(&key) {
            return existing.clone();
        }
        let mut next = (**guard).clone();
        next.insert(key, producer.clone());
        *guard = Arc::new(next);
        producer
    }
}
