//! Option elements
//!
//! Options are the children a composite's panel lists. Each one registers
//! itself with the composite's registry for as long as it lives and talks to
//! the selection through the choice controller it was given.
//!
//! ```ignore
//! let fruit = ctx.use_state(None::<&str>);
//! let select = cn::select(&doc, &fruit).build();
//!
//! let apple = select.option("apple", "Apple")?;
//! let pear = select.option("pear", "Pear")?;
//!
//! pear.click();
//! assert!(pear.is_selected());
//! assert_eq!(apple.class(), "option");
//! ```

use picket_layout::{
    ChoiceValue, Document, DocumentError, MountedEntry, MultipleChoice, NodeId, RegistryHandle,
    SingleChoice,
};

/// Creates an `li` under `parent` that the option will own
pub(crate) fn create_option_node(
    document: &Document,
    parent: NodeId,
) -> Result<NodeId, DocumentError> {
    let node = document.create_element("li");
    if let Err(err) = document.append_child(parent, node) {
        let _ = document.destroy(node);
        return Err(err);
    }
    Ok(node)
}

// ============================================================================
// SelectOption
// ============================================================================

/// An option of a single-choice widget
pub struct SelectOption<T: ChoiceValue> {
    entry: MountedEntry<T>,
    choice: SingleChoice<T>,
    /// Set when the option created its node and must remove it
    owned_by: Option<Document>,
}

impl<T: ChoiceValue> std::fmt::Debug for SelectOption<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectOption")
            .field("value", self.entry.value())
            .field("label", &self.entry.label())
            .field("selected", &self.is_selected())
            .finish()
    }
}

impl<T: ChoiceValue> SelectOption<T> {
    /// Register an option for a node the host manages
    pub fn mount(
        registry: &RegistryHandle<T>,
        choice: &SingleChoice<T>,
        value: T,
        label: impl Into<String>,
        node: NodeId,
    ) -> Self {
        Self {
            entry: MountedEntry::mount(registry, value, label, node),
            choice: choice.clone(),
            owned_by: None,
        }
    }

    pub(crate) fn mount_owned(
        registry: &RegistryHandle<T>,
        choice: &SingleChoice<T>,
        value: T,
        label: impl Into<String>,
        node: NodeId,
        document: &Document,
    ) -> Self {
        let mut option = Self::mount(registry, choice, value, label, node);
        option.owned_by = Some(document.clone());
        option
    }

    pub fn value(&self) -> &T {
        self.entry.value()
    }

    pub fn label(&self) -> &str {
        self.entry.label()
    }

    pub fn node(&self) -> NodeId {
        self.entry.node()
    }

    /// Group name shared with the other options of the widget
    pub fn name(&self) -> &str {
        self.choice.name()
    }

    pub fn is_selected(&self) -> bool {
        self.choice.is_selected(self.entry.value())
    }

    /// Pick this option
    pub fn click(&self) {
        self.choice.select(Some(self.entry.value().clone()));
    }

    pub fn update(&mut self, value: T, label: impl Into<String>) {
        self.entry.update(value, label);
    }

    pub fn class(&self) -> &'static str {
        if self.is_selected() {
            "option selected"
        } else {
            "option"
        }
    }
}

impl<T: ChoiceValue> Drop for SelectOption<T> {
    fn drop(&mut self) {
        if let Some(document) = self.owned_by.take() {
            let _ = document.destroy(self.entry.node());
        }
    }
}

// ============================================================================
// CheckboxOption
// ============================================================================

/// An option of a multiple-choice widget
pub struct CheckboxOption<T: ChoiceValue> {
    entry: MountedEntry<T>,
    choice: MultipleChoice<T>,
    owned_by: Option<Document>,
}

impl<T: ChoiceValue> std::fmt::Debug for CheckboxOption<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckboxOption")
            .field("value", self.entry.value())
            .field("label", &self.entry.label())
            .field("checked", &self.is_checked())
            .finish()
    }
}

impl<T: ChoiceValue> CheckboxOption<T> {
    pub fn mount(
        registry: &RegistryHandle<T>,
        choice: &MultipleChoice<T>,
        value: T,
        label: impl Into<String>,
        node: NodeId,
    ) -> Self {
        Self {
            entry: MountedEntry::mount(registry, value, label, node),
            choice: choice.clone(),
            owned_by: None,
        }
    }

    pub(crate) fn mount_owned(
        registry: &RegistryHandle<T>,
        choice: &MultipleChoice<T>,
        value: T,
        label: impl Into<String>,
        node: NodeId,
        document: &Document,
    ) -> Self {
        let mut option = Self::mount(registry, choice, value, label, node);
        option.owned_by = Some(document.clone());
        option
    }

    pub fn value(&self) -> &T {
        self.entry.value()
    }

    pub fn label(&self) -> &str {
        self.entry.label()
    }

    pub fn node(&self) -> NodeId {
        self.entry.node()
    }

    pub fn name(&self) -> &str {
        self.choice.name()
    }

    pub fn is_checked(&self) -> bool {
        self.choice.is_selected(self.entry.value())
    }

    /// Flip membership of this option's value
    pub fn click(&self) {
        self.choice.toggle(self.entry.value().clone());
    }

    pub fn update(&mut self, value: T, label: impl Into<String>) {
        self.entry.update(value, label);
    }

    pub fn class(&self) -> &'static str {
        if self.is_checked() {
            "option checked"
        } else {
            "option"
        }
    }
}

impl<T: ChoiceValue> Drop for CheckboxOption<T> {
    fn drop(&mut self) {
        if let Some(document) = self.owned_by.take() {
            let _ = document.destroy(self.entry.node());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picket_core::StateContext;

    fn panel(doc: &Document) -> NodeId {
        let ul = doc.create_element("ul");
        doc.append_child(doc.body(), ul).unwrap();
        ul
    }

    #[test]
    fn test_select_option_click() {
        let ctx = StateContext::new();
        let doc = Document::new();
        let ul = panel(&doc);
        let value = ctx.use_state(None::<u8>);
        let registry = RegistryHandle::new(doc.clone());
        let choice = SingleChoice::new(&value);

        let a = SelectOption::mount(&registry, &choice, 1, "One", create_option_node(&doc, ul).unwrap());
        let b = SelectOption::mount(&registry, &choice, 2, "Two", create_option_node(&doc, ul).unwrap());

        b.click();
        assert_eq!(value.get(), Some(2));
        assert!(b.is_selected());
        assert!(!a.is_selected());
        assert_eq!(b.class(), "option selected");
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_owned_node_removed_on_drop() {
        let ctx = StateContext::new();
        let doc = Document::new();
        let ul = panel(&doc);
        let value = ctx.use_state(None::<u8>);
        let registry = RegistryHandle::new(doc.clone());
        let choice = SingleChoice::new(&value);

        let node = create_option_node(&doc, ul).unwrap();
        let option = SelectOption::mount_owned(&registry, &choice, 1, "One", node, &doc);
        drop(option);

        assert!(!doc.contains(node));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_checkbox_option_toggles() {
        let ctx = StateContext::new();
        let doc = Document::new();
        let ul = panel(&doc);
        let value = ctx.use_state(Vec::<&str>::new());
        let registry = RegistryHandle::new(doc.clone());
        let choice = MultipleChoice::new(&value);

        let red = CheckboxOption::mount(&registry, &choice, "red", "Red", create_option_node(&doc, ul).unwrap());
        red.click();
        assert!(red.is_checked());
        assert_eq!(red.class(), "option checked");
        red.click();
        assert!(!red.is_checked());
        assert!(value.get().is_empty());
    }
}
