//! MultipleSelect component for picking several values
//!
//! Same shell as [`Select`](super::select::Select), but the control shows how
//! many values are picked (`"{n} {placeholder}"`) and options toggle instead
//! of replacing the value. Arrow keys move a focus candidate through the
//! options; Enter or Space toggles it.
//!
//! # Example
//!
//! ```ignore
//! let tags = ctx.use_state_keyed("tags", Vec::<String>::new);
//!
//! let mut tags_select = cn::multiple_select(&doc, &tags)
//!     .placeholder("tags")
//!     .build();
//! let _rust = tags_select.option("rust".into(), "Rust")?;
//!
//! tags_select.on_key_down(&KeyboardEvent::pressed(Key::ArrowDown));
//! tags_select.on_key_down(&KeyboardEvent::pressed(Key::Enter));
//! assert_eq!(tags_select.view().text, "1 tags");
//! ```

use std::sync::Arc;

use picket_core::{EventOutcome, Key, KeyboardEvent, State};
use picket_layout::{
    Anchor, ChoiceValue, Document, DocumentError, InlineStyle, InstanceKey, MultipleChoice,
    NodeId, RegistryHandle, ToggleCallback,
};

use super::handlers::Handlers;
use super::option::{create_option_node, CheckboxOption};
use super::panel::{PanelEvent, PanelShell, ShellConfig, WidgetView};

struct MultipleSelectConfig<T: ChoiceValue> {
    value_state: State<Vec<T>>,
    shell: ShellConfig,
    on_change: Option<ToggleCallback<T>>,
}

/// Multiple-choice dropdown
pub struct MultipleSelect<T: ChoiceValue> {
    key: InstanceKey,
    config: MultipleSelectConfig<T>,
    registry: RegistryHandle<T>,
    choice: MultipleChoice<T>,
    /// Keyboard focus candidate
    focus: Option<T>,
    shell: PanelShell,
}

impl<T: ChoiceValue> std::fmt::Debug for MultipleSelect<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipleSelect")
            .field("key", &self.key)
            .field("value", &self.choice.value())
            .field("focus", &self.focus)
            .field("open", &self.shell.is_open())
            .finish()
    }
}

impl<T: ChoiceValue> MultipleSelect<T> {
    fn from_config(document: &Document, key: InstanceKey, config: MultipleSelectConfig<T>) -> Self {
        let shell = PanelShell::new(document, "div", "select", "select-options");
        let registry = RegistryHandle::new(document.clone())
            .with_dirty_flag(config.value_state.dirty_flag().clone());

        let name = match &config.shell.name {
            Some(name) => InstanceKey::explicit(name.clone()),
            None => key.clone(),
        };
        let mut choice = MultipleChoice::new(&config.value_state).with_name(name);
        if let Some(on_change) = &config.on_change {
            choice = choice.on_change_shared(on_change.clone());
        }

        Self {
            key,
            config,
            registry,
            choice,
            focus: None,
            shell,
        }
    }

    pub fn root(&self) -> NodeId {
        self.shell.root()
    }

    pub fn panel(&self) -> NodeId {
        self.shell.panel()
    }

    pub fn key(&self) -> &InstanceKey {
        &self.key
    }

    pub fn registry(&self) -> &RegistryHandle<T> {
        &self.registry
    }

    pub fn choice(&self) -> &MultipleChoice<T> {
        &self.choice
    }

    pub fn option(&self, value: T, label: impl Into<String>) -> Result<CheckboxOption<T>, DocumentError> {
        let document = self.shell.document();
        let node = create_option_node(document, self.shell.panel())?;
        Ok(CheckboxOption::mount_owned(
            &self.registry,
            &self.choice,
            value,
            label,
            node,
            document,
        ))
    }

    pub fn mount_option(&self, value: T, label: impl Into<String>, node: NodeId) -> CheckboxOption<T> {
        CheckboxOption::mount(&self.registry, &self.choice, value, label, node)
    }

    pub fn value(&self) -> Vec<T> {
        self.choice.value()
    }

    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    pub fn is_disabled(&self) -> bool {
        self.config.shell.disabled
    }

    /// The focus candidate, dropped once its option unmounts
    pub fn focused(&self) -> Option<T> {
        self.focus
            .as_ref()
            .filter(|v| self.registry.contains(v))
            .cloned()
    }

    pub fn display_text(&self) -> String {
        format!("{} {}", self.choice.len(), self.config.shell.placeholder)
    }

    fn move_focus(&mut self, next: Option<T>) {
        if next.is_some() {
            tracing::trace!("{}: focus candidate {:?}", self.key, next);
            self.focus = next;
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn on_click(&mut self) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        self.shell.dispatch(PanelEvent::Click);
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.click();
        EventOutcome::handled()
    }

    pub fn on_focus(&mut self) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        self.config.shell.handlers.focus();
        EventOutcome::handled()
    }

    pub fn on_blur(&mut self) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        self.focus = None;
        self.shell.dispatch(PanelEvent::Blur);
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.blur();
        EventOutcome::handled()
    }

    pub fn on_key_down(&mut self, event: &KeyboardEvent) -> EventOutcome {
        if self.is_disabled() || !event.is_pressed() {
            return EventOutcome::ignored();
        }

        let focused = self.focused();
        let outcome = match (event.key, focused) {
            (Key::Enter | Key::Space, Some(candidate)) => {
                self.choice.toggle(candidate);
                EventOutcome::prevent_default()
            }
            (Key::Space, None) => {
                self.shell.dispatch(PanelEvent::Space);
                EventOutcome::prevent_default()
            }
            (Key::Enter, None) if self.shell.dispatch(PanelEvent::Enter) => {
                EventOutcome::prevent_default()
            }
            (Key::Escape, _) if self.shell.dispatch(PanelEvent::Escape) => EventOutcome::handled(),
            (Key::ArrowUp, focused) => {
                self.move_focus(self.registry.before(focused.as_ref()));
                EventOutcome::prevent_default()
            }
            (Key::ArrowDown, focused) => {
                self.move_focus(self.registry.after(focused.as_ref()));
                EventOutcome::prevent_default()
            }
            (Key::Home, _) => {
                self.move_focus(self.registry.first());
                EventOutcome::prevent_default()
            }
            (Key::End, _) => {
                self.move_focus(self.registry.last());
                EventOutcome::prevent_default()
            }
            _ => EventOutcome::ignored(),
        };

        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.key_down(event);
        outcome
    }

    pub fn open(&mut self) {
        if !self.is_open() {
            self.shell.dispatch(PanelEvent::Click);
        }
        self.shell.sync(&self.config.shell);
    }

    pub fn close(&mut self) {
        self.shell.dispatch(PanelEvent::Escape);
        self.shell.sync(&self.config.shell);
    }

    pub fn reposition(&self) {
        self.shell.reposition();
    }

    pub fn view(&mut self) -> WidgetView<T> {
        self.shell.sync(&self.config.shell);
        WidgetView {
            class: self.shell.class(),
            text: self.display_text(),
            placeholder: self.config.shell.placeholder.clone(),
            is_placeholder: self.choice.is_empty(),
            panel_class: self.shell.panel_class(),
            panel: self.shell.frame(),
            highlighted: self.focused(),
            disabled: self.is_disabled(),
        }
    }
}

/// Builder for [`MultipleSelect`]
pub struct MultipleSelectBuilder<T: ChoiceValue> {
    key: InstanceKey,
    document: Document,
    config: MultipleSelectConfig<T>,
}

impl<T: ChoiceValue> MultipleSelectBuilder<T> {
    #[track_caller]
    pub fn new(document: &Document, value_state: &State<Vec<T>>) -> Self {
        Self::with_instance_key(InstanceKey::new("multiple-select"), document, value_state)
    }

    pub fn with_key(key: impl Into<String>, document: &Document, value_state: &State<Vec<T>>) -> Self {
        Self::with_instance_key(InstanceKey::explicit(key), document, value_state)
    }

    fn with_instance_key(key: InstanceKey, document: &Document, value_state: &State<Vec<T>>) -> Self {
        Self {
            key,
            document: document.clone(),
            config: MultipleSelectConfig {
                value_state: value_state.clone(),
                shell: ShellConfig::default(),
                on_change: None,
            },
        }
    }

    /// Noun shown after the count
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.shell.placeholder = placeholder.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.shell.name = Some(name.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.config.shell.disabled = disabled;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.config.shell.anchor = anchor;
        self
    }

    pub fn panel_style(mut self, style: InlineStyle) -> Self {
        self.config.shell.style = style;
        self
    }

    pub fn render_target(mut self, target: NodeId) -> Self {
        self.config.shell.render_target = Some(target);
        self
    }

    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.config.shell.handlers = handlers;
        self
    }

    /// Called with the full selection after every toggle
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[T]) + Send + Sync + 'static,
    {
        self.config.on_change = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> MultipleSelect<T> {
        MultipleSelect::from_config(&self.document, self.key, self.config)
    }
}

/// Create a multiple select over a list state
#[track_caller]
pub fn multiple_select<T: ChoiceValue>(
    document: &Document,
    value_state: &State<Vec<T>>,
) -> MultipleSelectBuilder<T> {
    MultipleSelectBuilder::new(document, value_state)
}
