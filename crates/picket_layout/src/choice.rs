//! Choice controllers
//!
//! A choice controller is the view a composite hands to its options: the
//! selected value(s), a group name, and a normalized way to change the
//! selection. It holds no value of its own. Reads and writes go to the
//! consumer's [`State`], after which the consumer's callbacks run.
//!
//! ```ignore
//! let ctx = StateContext::new();
//! let tags = ctx.use_state(Vec::<&str>::new());
//! let choice = MultipleChoice::new(&tags);
//!
//! choice.toggle("red");
//! choice.toggle("blue");
//! choice.toggle("red");
//! assert_eq!(tags.get(), vec!["blue"]);
//! ```

use std::sync::Arc;

use picket_core::State;

use crate::key::InstanceKey;
use crate::registry::ChoiceValue;

/// Callback for a single-choice change
pub type SelectCallback<T> = Arc<dyn Fn(Option<&T>) + Send + Sync>;

/// Callback for a multiple-choice change, given the full new selection
pub type ToggleCallback<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

// ============================================================================
// SingleChoice
// ============================================================================

/// Zero or one selected value
pub struct SingleChoice<T> {
    value: State<Option<T>>,
    name: InstanceKey,
    on_change: Vec<SelectCallback<T>>,
}

impl<T> Clone for SingleChoice<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            name: self.name.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<T: ChoiceValue> std::fmt::Debug for SingleChoice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleChoice")
            .field("name", &self.name.name())
            .field("value", &self.value())
            .finish()
    }
}

impl<T: ChoiceValue> SingleChoice<T> {
    #[track_caller]
    pub fn new(value: &State<Option<T>>) -> Self {
        Self {
            value: value.clone(),
            name: InstanceKey::new("choice"),
            on_change: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: InstanceKey) -> Self {
        self.name = name;
        self
    }

    /// Add a change callback; earlier callbacks run first
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        self.on_change.push(Arc::new(callback));
        self
    }

    /// Add an already shared callback
    pub fn on_change_shared(mut self, callback: SelectCallback<T>) -> Self {
        self.on_change.push(callback);
        self
    }

    pub fn value(&self) -> Option<T> {
        self.value.get()
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn is_selected(&self, value: &T) -> bool {
        self.value().as_ref() == Some(value)
    }

    /// Replace the selection
    ///
    /// No check against registered options is made.
    pub fn select(&self, value: Option<T>) {
        tracing::debug!("{}: select {:?}", self.name, value);
        self.value.set_rebuild(value.clone());
        for callback in &self.on_change {
            callback(value.as_ref());
        }
    }

    /// The consumer state this controller writes to
    pub fn state(&self) -> &State<Option<T>> {
        &self.value
    }
}

// ============================================================================
// MultipleChoice
// ============================================================================

/// A set of selected values, in the order they were picked
pub struct MultipleChoice<T> {
    value: State<Vec<T>>,
    name: InstanceKey,
    on_change: Vec<ToggleCallback<T>>,
}

impl<T> Clone for MultipleChoice<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            name: self.name.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<T: ChoiceValue> std::fmt::Debug for MultipleChoice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipleChoice")
            .field("name", &self.name.name())
            .field("value", &self.value())
            .finish()
    }
}

impl<T: ChoiceValue> MultipleChoice<T> {
    #[track_caller]
    pub fn new(value: &State<Vec<T>>) -> Self {
        Self {
            value: value.clone(),
            name: InstanceKey::new("choice"),
            on_change: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: InstanceKey) -> Self {
        self.name = name;
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        self.on_change.push(Arc::new(callback));
        self
    }

    pub fn on_change_shared(mut self, callback: ToggleCallback<T>) -> Self {
        self.on_change.push(callback);
        self
    }

    pub fn value(&self) -> Vec<T> {
        self.value.get()
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn is_selected(&self, item: &T) -> bool {
        self.value().contains(item)
    }

    pub fn len(&self) -> usize {
        self.value().len()
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    /// Remove `item` if selected, append it otherwise
    ///
    /// The selection keeps pick order, not option order.
    pub fn toggle(&self, item: T) {
        let mut next = self.value();
        if next.contains(&item) {
            next.retain(|v| *v != item);
        } else {
            next.push(item);
        }
        tracing::debug!("{}: selection now {:?}", self.name, next);

        self.value.set_rebuild(next.clone());
        for callback in &self.on_change {
            callback(&next);
        }
    }

    pub fn state(&self) -> &State<Vec<T>> {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picket_core::StateContext;
    use std::sync::Mutex;

    #[test]
    fn test_single_select_writes_state_then_callbacks() {
        let ctx = StateContext::new();
        let value = ctx.use_state(None::<u32>);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let choice = SingleChoice::new(&value).on_change(move |v| s.lock().unwrap().push(v.copied()));

        choice.select(Some(4));
        choice.select(None);

        assert_eq!(value.get(), None);
        assert_eq!(*seen.lock().unwrap(), vec![Some(4), None]);
        assert!(ctx.take_rebuild());
    }

    #[test]
    fn test_single_is_selected_reads_through() {
        let ctx = StateContext::new();
        let value = ctx.use_state(Some("b"));
        let choice = SingleChoice::new(&value);

        assert!(choice.is_selected(&"b"));
        value.set(Some("a"));
        assert!(!choice.is_selected(&"b"));
        assert!(choice.is_selected(&"a"));
    }

    #[test]
    fn test_single_accepts_unregistered_value() {
        let ctx = StateContext::new();
        let value = ctx.use_state(None::<i32>);
        let choice = SingleChoice::new(&value);

        choice.select(Some(-99));
        assert_eq!(choice.value(), Some(-99));
    }

    #[test]
    fn test_callbacks_run_in_order() {
        let ctx = StateContext::new();
        let value = ctx.use_state(None::<u8>);
        let log = Arc::new(Mutex::new(Vec::new()));

        let (a, b) = (log.clone(), log.clone());
        let choice = SingleChoice::new(&value)
            .on_change(move |_| a.lock().unwrap().push("consumer"))
            .on_change(move |_| b.lock().unwrap().push("close"));
        choice.select(Some(1));

        assert_eq!(*log.lock().unwrap(), vec!["consumer", "close"]);
    }

    #[test]
    fn test_toggle_appends_in_pick_order() {
        let ctx = StateContext::new();
        let value = ctx.use_state(Vec::<char>::new());
        let choice = MultipleChoice::new(&value);

        choice.toggle('c');
        choice.toggle('a');
        choice.toggle('b');
        assert_eq!(value.get(), vec!['c', 'a', 'b']);
    }

    #[test]
    fn test_toggle_twice_restores_original() {
        let ctx = StateContext::new();
        let value = ctx.use_state(vec![1, 2, 3]);
        let choice = MultipleChoice::new(&value);

        choice.toggle(2);
        assert_eq!(value.get(), vec![1, 3]);
        choice.toggle(2);
        assert_eq!(value.get(), vec![1, 3, 2]);
        choice.toggle(2);
        assert_eq!(value.get(), vec![1, 3]);

        choice.toggle(9);
        choice.toggle(9);
        assert_eq!(value.get(), vec![1, 3]);
    }

    #[test]
    fn test_toggle_removes_every_copy() {
        let ctx = StateContext::new();
        let value = ctx.use_state(vec![4, 7, 4, 5, 4]);
        let choice = MultipleChoice::new(&value);

        choice.toggle(4);
        assert_eq!(value.get(), vec![7, 5]);
        choice.toggle(4);
        assert_eq!(value.get(), vec![7, 5, 4]);
    }

    #[test]
    fn test_toggle_reports_full_selection() {
        let ctx = StateContext::new();
        let value = ctx.use_state(vec!["x"]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let choice = MultipleChoice::new(&value)
            .with_name(InstanceKey::explicit("tags"))
            .on_change(move |all| *s.lock().unwrap() = all.to_vec());
        choice.toggle("y");

        assert_eq!(*seen.lock().unwrap(), vec!["x", "y"]);
        assert_eq!(choice.name(), "tags");
        assert_eq!(choice.len(), 2);
    }
}
