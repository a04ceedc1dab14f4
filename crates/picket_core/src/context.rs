//! Explicit state context
//!
//! `StateContext` owns a reactive graph, a rebuild flag and keyed hook state.
//! It is handed to whoever needs to create persistent state instead of being
//! reached through a global, so several independent hosts (or tests) can
//! live side by side.
//!
//! ```ignore
//! use picket_core::context::StateContext;
//!
//! let ctx = StateContext::new();
//! let country = ctx.use_state_keyed("country", || None::<String>);
//!
//! // Same key and type: same underlying signal
//! let again = ctx.use_state_keyed("country", || Some("ignored".to_string()));
//! assert_eq!(country.signal_id(), again.signal_id());
//! ```

use std::any::TypeId;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::{FxHashMap, FxHasher};

use crate::reactive::{lock_graph, DirtyFlag, ReactiveGraph, SharedReactiveGraph, Signal, SignalId, State};

/// Key for identifying a signal in the keyed state system
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    key_hash: u64,
    type_id: TypeId,
}

impl StateKey {
    /// Create a new StateKey from a hashable key and type
    pub fn new<T: 'static, K: Hash + ?Sized>(key: &K) -> Self {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        Self {
            key_hash: hasher.finish(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Create a StateKey from a string key and type
    pub fn from_string<T: 'static>(key: &str) -> Self {
        Self::new::<T, _>(key)
    }
}

/// Keyed signals that survive across rebuilds
#[derive(Debug, Default)]
pub struct HookState {
    signals: FxHashMap<StateKey, u64>,
}

impl HookState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing signal by key
    pub fn get(&self, key: &StateKey) -> Option<u64> {
        self.signals.get(key).copied()
    }

    /// Store a signal with the given key
    pub fn insert(&mut self, key: StateKey, signal_id: u64) {
        self.signals.insert(key, signal_id);
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Shared hook state for a context
pub type SharedHookState = Arc<Mutex<HookState>>;

/// Owner of the reactive graph and keyed state for one host
#[derive(Clone)]
pub struct StateContext {
    reactive: SharedReactiveGraph,
    hooks: SharedHookState,
    dirty_flag: DirtyFlag,
}

impl std::fmt::Debug for StateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContext")
            .field("hooks", &self.lock_hooks().len())
            .field("dirty", &self.dirty_flag.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for StateContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StateContext {
    /// Create a context with a fresh reactive graph
    pub fn new() -> Self {
        Self::with_graph(Arc::new(Mutex::new(ReactiveGraph::new())))
    }

    /// Create a context over an existing graph
    pub fn with_graph(reactive: SharedReactiveGraph) -> Self {
        Self {
            reactive,
            hooks: Arc::new(Mutex::new(HookState::new())),
            dirty_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    fn lock_hooks(&self) -> MutexGuard<'_, HookState> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a new, unkeyed state
    pub fn use_state<T: Clone + Send + 'static>(&self, initial: T) -> State<T> {
        let signal = lock_graph(&self.reactive).create_signal(initial);
        State::new(signal, Arc::clone(&self.reactive), Arc::clone(&self.dirty_flag))
    }

    /// Create or fetch a persistent state identified by `key`
    ///
    /// `init` only runs the first time a key/type pair is seen.
    pub fn use_state_keyed<T, F>(&self, key: &str, init: F) -> State<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        let signal = self.use_signal_keyed(key, init);
        State::new(signal, Arc::clone(&self.reactive), Arc::clone(&self.dirty_flag))
    }

    /// Create or fetch a persistent signal identified by `key`
    pub fn use_signal_keyed<T, F>(&self, key: &str, init: F) -> Signal<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> T,
    {
        let state_key = StateKey::from_string::<T>(key);
        let mut hooks = self.lock_hooks();

        if let Some(raw_id) = hooks.get(&state_key) {
            return Signal::from_id(SignalId::from_raw(raw_id));
        }

        let signal = lock_graph(&self.reactive).create_signal(init());
        hooks.insert(state_key, signal.id().to_raw());
        tracing::trace!("created keyed state '{}'", key);
        signal
    }

    /// The shared reactive graph
    pub fn graph(&self) -> &SharedReactiveGraph {
        &self.reactive
    }

    /// The rebuild flag shared with every state created here
    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.dirty_flag
    }

    /// Request a host re-render
    pub fn request_rebuild(&self) {
        self.dirty_flag.store(true, Ordering::SeqCst);
    }

    /// Check and clear the rebuild request
    pub fn take_rebuild(&self) -> bool {
        self.dirty_flag.swap(false, Ordering::SeqCst)
    }
}
