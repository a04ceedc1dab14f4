//! Mounted registry entries
//!
//! `MountedEntry` ties a registration to the lifetime of the option that made
//! it: create it once the option's node exists in the document, and dropping
//! it removes the registration again.

use crate::document::NodeId;
use crate::registry::{ChoiceValue, EntryToken, RegistryHandle};

/// Registration guard for one mounted option
pub struct MountedEntry<T: ChoiceValue> {
    registry: RegistryHandle<T>,
    token: EntryToken,
    value: T,
    label: String,
    node: NodeId,
}

impl<T: ChoiceValue> std::fmt::Debug for MountedEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedEntry")
            .field("value", &self.value)
            .field("label", &self.label)
            .field("node", &self.node)
            .finish()
    }
}

impl<T: ChoiceValue> MountedEntry<T> {
    /// Register `value` for `node`; the node should already be in the tree
    pub fn mount(
        registry: &RegistryHandle<T>,
        value: T,
        label: impl Into<String>,
        node: NodeId,
    ) -> Self {
        let label = label.into();
        let token = registry.register(value.clone(), label.clone(), node);
        Self {
            registry: registry.clone(),
            token,
            value,
            label,
            node,
        }
    }

    /// Change value or label
    ///
    /// A label change keeps the registration. A value change registers the
    /// new value before releasing the old one, so the registry never holds
    /// an entry whose value and node disagree.
    pub fn update(&mut self, value: T, label: impl Into<String>) {
        let label = label.into();
        if value == self.value {
            if label != self.label {
                self.registry.relabel(self.token, label.clone());
                self.label = label;
            }
            return;
        }

        let token = self
            .registry
            .register(value.clone(), label.clone(), self.node);
        self.registry.deregister(self.token);
        self.token = token;
        self.value = value;
        self.label = label;
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn token(&self) -> EntryToken {
        self.token
    }

    pub fn registry(&self) -> &RegistryHandle<T> {
        &self.registry
    }
}

impl<T: ChoiceValue> Drop for MountedEntry<T> {
    fn drop(&mut self) {
        self.registry.deregister(self.token);
    }
}
