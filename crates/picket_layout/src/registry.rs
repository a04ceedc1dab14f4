//! Option registry
//!
//! A `Registry` tracks the options currently mounted under one composite
//! widget: one entry per distinct value, kept in document order no matter in
//! which order the options registered. Composites ask it for the label of a
//! value and for the value before/after a given one (keyboard traversal).
//!
//! Registration hands back an [`EntryToken`]; deregistration takes the token,
//! so an option being torn down can never remove the entry of a newer option
//! that mounted with the same value.
//!
//! # Example
//!
//! ```ignore
//! let doc = Document::new();
//! let registry = RegistryHandle::new(doc.clone());
//!
//! let c = registry.register(3, "Three", node_c);
//! let a = registry.register(1, "One", node_a);
//! let b = registry.register(2, "Two", node_b);
//!
//! // Document order, not registration order
//! assert_eq!(registry.values(), vec![1, 2, 3]);
//! assert_eq!(registry.after(Some(&3)), Some(3));
//! ```

use std::cmp::Ordering;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use picket_core::DirtyFlag;
use slotmap::{new_key_type, SlotMap};

use crate::document::{Document, NodeId};

/// Values a registry and the choice controllers can hold
pub trait ChoiceValue: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {}

impl<T> ChoiceValue for T where T: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {}

new_key_type! {
    /// Handle returned by `register`, required to deregister
    pub struct EntryToken;
}

/// Relative order of host nodes
///
/// `None` means the two nodes have no defined order (one is detached);
/// such pairs keep their current relative position.
pub trait NodeOrder: Send + Sync {
    fn compare(&self, a: NodeId, b: NodeId) -> Option<Ordering>;
}

impl NodeOrder for Document {
    fn compare(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        self.compare_position(a, b)
    }
}

impl<F> NodeOrder for F
where
    F: Fn(NodeId, NodeId) -> Ordering + Send + Sync,
{
    fn compare(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        Some(self(a, b))
    }
}

/// One mounted option
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T> {
    pub value: T,
    pub label: String,
    pub node: NodeId,
}

struct Registration<T> {
    entry: Entry<T>,
    /// Registration sequence, used to promote the oldest shadow
    seq: u64,
}

/// Ordered set of mounted options for one widget instance
pub struct Registry<T> {
    registrations: SlotMap<EntryToken, Registration<T>>,
    /// Tokens of the visible entries, in document order
    visible: Vec<EntryToken>,
    order: Arc<dyn NodeOrder>,
    next_seq: u64,
    revision: u64,
}

impl<T: ChoiceValue> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.values())
            .field("shadowed", &(self.registrations.len() - self.visible.len()))
            .field("revision", &self.revision)
            .finish()
    }
}

impl<T: ChoiceValue> Registry<T> {
    pub fn new(order: impl NodeOrder + 'static) -> Self {
        Self::with_order(Arc::new(order))
    }

    pub fn with_order(order: Arc<dyn NodeOrder>) -> Self {
        Self {
            registrations: SlotMap::with_key(),
            visible: Vec::new(),
            order,
            next_seq: 0,
            revision: 0,
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Register an option
    ///
    /// If the value is already present the visible list does not change; the
    /// registration is kept as a shadow and takes over if the visible one for
    /// the same value is deregistered first.
    pub fn register(&mut self, value: T, label: impl Into<String>, node: NodeId) -> EntryToken {
        let shadowed = self.position(&value).is_some();
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = Entry {
            value,
            label: label.into(),
            node,
        };
        tracing::trace!(
            "register {:?} at {:?}{}",
            entry.value,
            node,
            if shadowed { " (shadowed)" } else { "" }
        );
        let token = self.registrations.insert(Registration { entry, seq });

        if !shadowed {
            self.insert_visible(token);
            self.revision += 1;
        }
        token
    }

    /// Change the label of a registration in place
    ///
    /// Keeps the token, so a shadow for the same value is never promoted
    /// over it. Returns false for an unknown token.
    pub fn relabel(&mut self, token: EntryToken, label: impl Into<String>) -> bool {
        let Some(registration) = self.registrations.get_mut(token) else {
            return false;
        };
        let label = label.into();
        if registration.entry.label == label {
            return true;
        }
        tracing::trace!("relabel {:?} as {:?}", registration.entry.value, label);
        registration.entry.label = label;
        if self.visible.contains(&token) {
            self.revision += 1;
        }
        true
    }

    /// Remove a registration; returns false for an unknown or stale token
    pub fn deregister(&mut self, token: EntryToken) -> bool {
        let Some(removed) = self.registrations.remove(token) else {
            return false;
        };
        tracing::trace!("deregister {:?} at {:?}", removed.entry.value, removed.entry.node);

        let Some(index) = self.visible.iter().position(|t| *t == token) else {
            // A shadow went away; nothing visible changed
            return true;
        };
        self.visible.remove(index);

        let promoted = self
            .registrations
            .iter()
            .filter(|(_, r)| r.entry.value == removed.entry.value)
            .min_by_key(|(_, r)| r.seq)
            .map(|(t, _)| t);
        if let Some(promoted) = promoted {
            tracing::trace!("promote shadow registration of {:?}", removed.entry.value);
            self.insert_visible(promoted);
        }

        self.revision += 1;
        true
    }

    /// Re-sort after the host moved nodes without re-registering them
    pub fn resort(&mut self) {
        let before = self.visible.clone();
        self.sort();
        if self.visible != before {
            self.revision += 1;
        }
    }

    /// Insert a token into the sorted visible list
    ///
    /// Binary search for the slot after every entry that does not follow
    /// the new node. Entries without a defined order count as preceding it.
    fn insert_visible(&mut self, token: EntryToken) {
        let index = self
            .visible
            .partition_point(|existing| self.node_cmp(*existing, token) != Some(Ordering::Greater));
        self.visible.insert(index, token);
    }

    /// Stable insertion sort by node order
    ///
    /// Pairs without a defined order never swap, so detached nodes keep
    /// their place instead of breaking the sort.
    fn sort(&mut self) {
        for i in 1..self.visible.len() {
            let mut j = i;
            while j > 0 && self.node_cmp(self.visible[j], self.visible[j - 1]) == Some(Ordering::Less)
            {
                self.visible.swap(j, j - 1);
                j -= 1;
            }
        }
    }

    fn node_cmp(&self, a: EntryToken, b: EntryToken) -> Option<Ordering> {
        let a = self.registrations.get(a)?;
        let b = self.registrations.get(b)?;
        self.order.compare(a.entry.node, b.entry.node)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn visible_entries(&self) -> impl Iterator<Item = &Entry<T>> + '_ {
        self.visible
            .iter()
            .filter_map(|t| self.registrations.get(*t))
            .map(|r| &r.entry)
    }

    fn value_at(&self, index: usize) -> Option<T> {
        let token = self.visible.get(index)?;
        self.registrations.get(*token).map(|r| r.entry.value.clone())
    }

    /// Index of a value in the ordered list
    pub fn position(&self, value: &T) -> Option<usize> {
        self.visible_entries().position(|e| e.value == *value)
    }

    /// The value preceding `value`
    ///
    /// `None` or an unregistered value yields the first entry; the first
    /// entry yields itself. An empty registry yields `None`.
    pub fn before(&self, value: Option<&T>) -> Option<T> {
        match value.and_then(|v| self.position(v)) {
            Some(index) => self.value_at(index.saturating_sub(1)),
            None => self.value_at(0),
        }
    }

    /// The value following `value`, clamped at the last entry
    pub fn after(&self, value: Option<&T>) -> Option<T> {
        match value.and_then(|v| self.position(v)) {
            Some(index) => self.value_at((index + 1).min(self.visible.len() - 1)),
            None => self.value_at(0),
        }
    }

    pub fn first(&self) -> Option<T> {
        self.value_at(0)
    }

    pub fn last(&self) -> Option<T> {
        self.value_at(self.visible.len().checked_sub(1)?)
    }

    /// The visible entry for a value
    pub fn get(&self, value: &T) -> Option<Entry<T>> {
        self.visible_entries().find(|e| e.value == *value).cloned()
    }

    /// The first visible entry matching a predicate
    pub fn find(&self, mut predicate: impl FnMut(&Entry<T>) -> bool) -> Option<Entry<T>> {
        self.visible_entries().find(|e| predicate(e)).cloned()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.position(value).is_some()
    }

    /// Snapshot of the visible entries in document order
    pub fn entries(&self) -> Vec<Entry<T>> {
        self.visible_entries().cloned().collect()
    }

    pub fn values(&self) -> Vec<T> {
        self.visible_entries().map(|e| e.value.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Bumped on every visible change
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Shared handle to a [`Registry`]
///
/// This is what a composite hands to its options. Visible changes mark the
/// optional dirty flag so the host re-renders.
pub struct RegistryHandle<T> {
    inner: Arc<RwLock<Registry<T>>>,
    dirty_flag: Option<DirtyFlag>,
}

impl<T> Clone for RegistryHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dirty_flag: self.dirty_flag.clone(),
        }
    }
}

impl<T: ChoiceValue> std::fmt::Debug for RegistryHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.read(), f)
    }
}

impl<T: ChoiceValue> RegistryHandle<T> {
    pub fn new(order: impl NodeOrder + 'static) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Registry::new(order))),
            dirty_flag: None,
        }
    }

    /// Mark `flag` whenever the visible entries change
    pub fn with_dirty_flag(mut self, flag: DirtyFlag) -> Self {
        self.dirty_flag = Some(flag);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Registry<T>) -> R) -> R {
        let (result, changed) = {
            let mut registry = self.write();
            let revision = registry.revision();
            let result = f(&mut registry);
            (result, registry.revision() != revision)
        };
        if changed {
            if let Some(flag) = &self.dirty_flag {
                flag.store(true, AtomicOrdering::SeqCst);
            }
        }
        result
    }

    pub fn register(&self, value: T, label: impl Into<String>, node: NodeId) -> EntryToken {
        self.mutate(|r| r.register(value, label, node))
    }

    pub fn deregister(&self, token: EntryToken) -> bool {
        self.mutate(|r| r.deregister(token))
    }

    pub fn relabel(&self, token: EntryToken, label: impl Into<String>) -> bool {
        self.mutate(|r| r.relabel(token, label))
    }

    pub fn resort(&self) {
        self.mutate(|r| r.resort())
    }

    pub fn before(&self, value: Option<&T>) -> Option<T> {
        self.read().before(value)
    }

    pub fn after(&self, value: Option<&T>) -> Option<T> {
        self.read().after(value)
    }

    pub fn first(&self) -> Option<T> {
        self.read().first()
    }

    pub fn last(&self) -> Option<T> {
        self.read().last()
    }

    pub fn get(&self, value: &T) -> Option<Entry<T>> {
        self.read().get(value)
    }

    pub fn find(&self, predicate: impl FnMut(&Entry<T>) -> bool) -> Option<Entry<T>> {
        self.read().find(predicate)
    }

    pub fn position(&self, value: &T) -> Option<usize> {
        self.read().position(value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.read().contains(value)
    }

    pub fn entries(&self) -> Vec<Entry<T>> {
        self.read().entries()
    }

    pub fn values(&self) -> Vec<T> {
        self.read().values()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.read().revision()
    }

    /// Whether two handles share one registry
    pub fn ptr_eq(&self, other: &RegistryHandle<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
