//! Versioned signal store
//!
//! A `ReactiveGraph` holds type-erased values behind `Signal<T>` handles.
//! Every write bumps the signal's version, which is how composites tell an
//! outside write apart from "nothing changed" without caching the value.
//!
//! # State
//!
//! The [`State<T>`] type wraps a signal with shared access to the graph.
//! Composite widgets are controlled from a consumer-owned `State`: they read
//! it on every interaction and write it through their choice controller,
//! never caching the value themselves.
//!
//! ```ignore
//! use picket_core::context::StateContext;
//!
//! let ctx = StateContext::new();
//! let fruit: State<Option<String>> = ctx.use_state_keyed("fruit", || None);
//!
//! fruit.set(Some("apple".into()));
//! assert_eq!(fruit.get(), Some("apple".into()));
//! ```

use slotmap::{new_key_type, SlotMap};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

new_key_type! {
    /// Unique identifier for a signal
    pub struct SignalId;
}

/// A reactive signal handle (cheap to copy)
#[derive(Debug)]
pub struct Signal<T> {
    id: SignalId,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> Signal<T> {
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Rebuild a handle from a stored id
    ///
    /// Reads return `None` if the id belongs to a signal of another type.
    pub fn from_id(id: SignalId) -> Self {
        Signal {
            id,
            _marker: std::marker::PhantomData,
        }
    }
}

impl SignalId {
    /// Raw form used as the hook-state value
    pub fn to_raw(&self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    pub fn from_raw(raw: u64) -> Self {
        slotmap::KeyData::from_ffi(raw).into()
    }
}

struct SignalNode {
    value: Box<dyn Any + Send>,
    /// Bumped on every write
    version: u64,
}

/// Storage for every signal of one host
#[derive(Default)]
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
}

impl std::fmt::Debug for ReactiveGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveGraph")
            .field("signals", &self.signals.len())
            .finish()
    }
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_signal<T: Send + 'static>(&mut self, initial: T) -> Signal<T> {
        let id = self.signals.insert(SignalNode {
            value: Box::new(initial),
            version: 0,
        });
        Signal::from_id(id)
    }

    /// Current value, or `None` for a disposed or mistyped signal
    pub fn get<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.signals
            .get(signal.id)
            .and_then(|node| node.value.downcast_ref::<T>().cloned())
    }

    pub fn set<T: Send + 'static>(&mut self, signal: Signal<T>, value: T) {
        let Some(node) = self.signals.get_mut(signal.id) else {
            tracing::warn!("write to disposed signal {:?}", signal.id);
            return;
        };
        node.value = Box::new(value);
        node.version += 1;
    }

    pub fn update<T: Clone + Send + 'static, F: FnOnce(T) -> T>(&mut self, signal: Signal<T>, f: F) {
        if let Some(current) = self.get(signal) {
            self.set(signal, f(current));
        }
    }

    /// Write counter of a signal
    pub fn signal_version(&self, id: SignalId) -> Option<u64> {
        self.signals.get(id).map(|n| n.version)
    }

    pub fn dispose_signal(&mut self, id: SignalId) {
        self.signals.remove(id);
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

// =============================================================================
// STATE - High-level API for consumer-owned values
// =============================================================================

/// Shared reactive graph for thread-safe access
pub type SharedReactiveGraph = Arc<Mutex<ReactiveGraph>>;

/// Shared dirty flag for requesting a host re-render
pub type DirtyFlag = Arc<AtomicBool>;

/// Lock a shared graph, recovering the guard from a poisoned mutex
pub fn lock_graph(graph: &SharedReactiveGraph) -> MutexGuard<'_, ReactiveGraph> {
    graph.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A bound state value with direct get/set methods
pub struct State<T> {
    signal: Signal<T>,
    reactive: SharedReactiveGraph,
    dirty_flag: DirtyFlag,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal,
            reactive: Arc::clone(&self.reactive),
            dirty_flag: Arc::clone(&self.dirty_flag),
        }
    }
}

impl<T> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State").field("signal", &self.signal.id).finish()
    }
}

impl<T: Clone + Send + 'static> State<T> {
    /// Create a new State wrapper
    pub fn new(signal: Signal<T>, reactive: SharedReactiveGraph, dirty_flag: DirtyFlag) -> Self {
        Self {
            signal,
            reactive,
            dirty_flag,
        }
    }

    /// Get the current value
    pub fn get(&self) -> T
    where
        T: Default,
    {
        lock_graph(&self.reactive)
            .get(self.signal)
            .unwrap_or_default()
    }

    /// Get the current value, returning None if the signal is gone
    pub fn try_get(&self) -> Option<T> {
        lock_graph(&self.reactive).get(self.signal)
    }

    /// Set a new value without requesting a re-render
    pub fn set(&self, value: T) {
        lock_graph(&self.reactive).set(self.signal, value);
    }

    /// Set a new value AND request a host re-render
    pub fn set_rebuild(&self, value: T) {
        self.set(value);
        self.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// Update the value using a function
    pub fn update(&self, f: impl FnOnce(T) -> T) {
        lock_graph(&self.reactive).update(self.signal, f);
    }

    /// Update the value AND request a host re-render
    pub fn update_rebuild(&self, f: impl FnOnce(T) -> T) {
        self.update(f);
        self.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// Write counter of the underlying signal
    ///
    /// Two equal versions mean nobody wrote the value in between.
    pub fn version(&self) -> u64 {
        lock_graph(&self.reactive)
            .signal_version(self.signal.id())
            .unwrap_or(0)
    }

    /// The underlying signal handle
    pub fn signal(&self) -> Signal<T> {
        self.signal
    }

    pub fn signal_id(&self) -> SignalId {
        self.signal.id()
    }

    /// The dirty flag this state marks on `set_rebuild`
    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.dirty_flag
    }
}
