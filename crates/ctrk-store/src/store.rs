//! # Generic In-Memory Store
//!
//! Thread-safe, cloneable record store keyed by each record's id. Clones
//! share the same underlying data.
//!
//! All operations are synchronous (`parking_lot::RwLock`, not
//! `tokio::sync`) and no lock is ever held across an `.await`.
//! `parking_lot` locks do not poison, so a panicking writer leaves the
//! store usable.
//!
//! Listing returns records in insertion order. Readers receive clones, so
//! a caller never observes a record mid-update.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use ctrk_core::{ComplianceId, DocumentId, Entity, EntityId, SubmissionId, SubscriptionId};
use ctrk_state::{ComplianceInstance, Document, Submission, Subscription};
use parking_lot::RwLock;

/// A record with a stable identity.
pub trait Record: Clone + Debug + Send + Sync {
    type Id: Clone + Debug + Eq + Hash + Send + Sync;

    fn id(&self) -> &Self::Id;
}

impl Record for ComplianceInstance {
    type Id = ComplianceId;
    fn id(&self) -> &ComplianceId {
        &self.id
    }
}

impl Record for Subscription {
    type Id = SubscriptionId;
    fn id(&self) -> &SubscriptionId {
        &self.id
    }
}

impl Record for Document {
    type Id = DocumentId;
    fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl Record for Submission {
    type Id = SubmissionId;
    fn id(&self) -> &SubmissionId {
        &self.id
    }
}

impl Record for Entity {
    type Id = EntityId;
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug)]
struct Inner<T: Record> {
    order: Vec<T::Id>,
    records: HashMap<T::Id, T>,
}

impl<T: Record> Inner<T> {
    fn empty() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }
}

/// Thread-safe, cloneable in-memory record store.
#[derive(Debug)]
pub struct Store<T: Record> {
    data: Arc<RwLock<Inner<T>>>,
}

impl<T: Record> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Record> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(Inner::empty())),
        }
    }

    /// Insert a record, returning the previous value if the id existed.
    /// A replaced record keeps its original position.
    pub fn insert(&self, value: T) -> Option<T> {
        let mut guard = self.data.write();
        let id = value.id().clone();
        let previous = guard.records.insert(id.clone(), value);
        if previous.is_none() {
            guard.order.push(id);
        }
        previous
    }

    /// Insert only if the id is free. Returns false if it was taken.
    pub fn insert_new(&self, value: T) -> bool {
        let mut guard = self.data.write();
        let id = value.id().clone();
        if guard.records.contains_key(&id) {
            return false;
        }
        guard.records.insert(id.clone(), value);
        guard.order.push(id);
        true
    }

    /// Retrieve a record by id.
    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.data.read().records.get(id).cloned()
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().iter().cloned().collect()
    }

    /// Records matching `pred`, in insertion order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().iter().filter(|r| pred(*r)).cloned().collect()
    }

    /// Whether any record matches `pred`.
    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.data.read().iter().any(pred)
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &T::Id, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        guard.records.get_mut(id).map(|entry| {
            f(entry);
            entry.clone()
        })
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the write lock and may inspect, validate and
    /// mutate the record. It must leave the record untouched when it returns
    /// `Err`. Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &T::Id,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().records.get_mut(id).map(f)
    }

    /// Apply `f` to every record matching `pred` under a single write lock.
    /// Returns the updated records in insertion order.
    pub fn update_where(&self, pred: impl Fn(&T) -> bool, mut f: impl FnMut(&mut T)) -> Vec<T> {
        let mut guard = self.data.write();
        let Inner { order, records } = &mut *guard;
        let mut updated = Vec::new();
        for id in order.iter() {
            if let Some(record) = records.get_mut(id) {
                if pred(record) {
                    f(record);
                    updated.push(record.clone());
                }
            }
        }
        updated
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.data.read().records.contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole contents with `records`, in the given order.
    /// Later duplicates overwrite earlier ones.
    pub fn replace_all(&self, records: Vec<T>) {
        let mut fresh = Inner::empty();
        for record in records {
            let id = record.id().clone();
            if fresh.records.insert(id.clone(), record).is_none() {
                fresh.order.push(id);
            }
        }
        *self.data.write() = fresh;
    }
}

impl<T: Record> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}
