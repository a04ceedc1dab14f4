//! Picket Core Runtime
//!
//! Foundational primitives for the Picket selection toolkit:
//!
//! - **Reactive Signals**: versioned signal storage
//! - **State**: consumer-owned values that composite widgets are controlled from
//! - **State Context**: keyed state that survives host re-renders
//! - **Input Events**: keyboard events and handler outcomes
//!
//! # Example
//!
//! ```rust
//! use picket_core::reactive::ReactiveGraph;
//!
//! let mut graph = ReactiveGraph::new();
//! let count = graph.create_signal(0i32);
//!
//! graph.set(count, 5);
//! assert_eq!(graph.get(count), Some(5));
//! ```

pub mod context;
pub mod events;
pub mod geometry;
pub mod reactive;

pub use context::{HookState, SharedHookState, StateContext, StateKey};
pub use events::{EventOutcome, Key, KeyState, KeyboardEvent, Modifiers};
pub use geometry::Rect;
pub use reactive::{
    lock_graph, DirtyFlag, ReactiveGraph, SharedReactiveGraph, Signal, SignalId, State,
};
