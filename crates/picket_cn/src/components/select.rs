//! Select component for single value selection
//!
//! A focusable control showing the label of the selected option (or the
//! placeholder), with a floating option panel toggled by click, Enter or Space.
//! Arrow keys change the value directly, open or not.
//!
//! The value lives in the consumer's `State`; the select never caches it.
//!
//! # Example
//!
//! ```ignore
//! use picket_cn::prelude::*;
//!
//! let fruit = ctx.use_state_keyed("fruit", || None::<&str>);
//!
//! let mut select = cn::select(&doc, &fruit)
//!     .placeholder("Choose a fruit...")
//!     .on_change(|v| println!("Selected: {:?}", v))
//!     .build();
//! doc.append_child(form, select.root())?;
//!
//! let _apple = select.option("apple", "Apple")?;
//! let _banana = select.option("banana", "Banana")?;
//!
//! select.on_key_down(&KeyboardEvent::pressed(Key::ArrowDown));
//! assert_eq!(fruit.get(), Some("apple"));
//! ```

use picket_core::{EventOutcome, Key, KeyboardEvent, State};
use picket_layout::{
    Anchor, ChoiceValue, Document, DocumentError, InlineStyle, InstanceKey, NodeId,
    RegistryHandle, SelectCallback, SingleChoice,
};

use super::handlers::Handlers;
use super::option::{create_option_node, SelectOption};
use super::panel::{PanelEvent, PanelShell, ShellConfig, WidgetView};

/// Internal configuration for building a Select
#[derive(Clone)]
struct SelectConfig<T: ChoiceValue> {
    value_state: State<Option<T>>,
    shell: ShellConfig,
    on_change: Option<SelectCallback<T>>,
}

/// Single-choice dropdown
pub struct Select<T: ChoiceValue> {
    key: InstanceKey,
    config: SelectConfig<T>,
    registry: RegistryHandle<T>,
    /// Consumer-facing controller, used for keyboard changes
    choice: SingleChoice<T>,
    /// Controller handed to options; also closes the panel
    option_choice: SingleChoice<T>,
    shell: PanelShell,
}

impl<T: ChoiceValue> std::fmt::Debug for Select<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select")
            .field("key", &self.key)
            .field("value", &self.choice.value())
            .field("open", &self.shell.is_open())
            .field("registry", &self.registry)
            .finish()
    }
}

impl<T: ChoiceValue> Select<T> {
    fn from_config(document: &Document, key: InstanceKey, config: SelectConfig<T>) -> Self {
        let shell = PanelShell::new(document, "div", "select", "select-options");
        let registry = RegistryHandle::new(document.clone())
            .with_dirty_flag(config.value_state.dirty_flag().clone());

        let name = match &config.shell.name {
            Some(name) => InstanceKey::explicit(name.clone()),
            None => key.clone(),
        };
        let mut choice = SingleChoice::new(&config.value_state).with_name(name);
        if let Some(on_change) = &config.on_change {
            choice = choice.on_change_shared(on_change.clone());
        }

        let panel = shell.cell().clone();
        let option_choice = choice.clone().on_change(move |_| {
            panel.dispatch(PanelEvent::Select);
        });

        Self {
            key,
            config,
            registry,
            choice,
            option_choice,
            shell,
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The control element; the host places it in its layout
    pub fn root(&self) -> NodeId {
        self.shell.root()
    }

    /// The element options mount under
    pub fn panel(&self) -> NodeId {
        self.shell.panel()
    }

    pub fn key(&self) -> &InstanceKey {
        &self.key
    }

    pub fn registry(&self) -> &RegistryHandle<T> {
        &self.registry
    }

    /// Controller for options rendered by the host
    pub fn choice(&self) -> &SingleChoice<T> {
        &self.option_choice
    }

    /// Add an option at the end of the panel
    pub fn option(&self, value: T, label: impl Into<String>) -> Result<SelectOption<T>, DocumentError> {
        let document = self.shell.document();
        let node = create_option_node(document, self.shell.panel())?;
        Ok(SelectOption::mount_owned(
            &self.registry,
            &self.option_choice,
            value,
            label,
            node,
            document,
        ))
    }

    /// Register an option for a node the host created under [`Select::panel`]
    pub fn mount_option(&self, value: T, label: impl Into<String>, node: NodeId) -> SelectOption<T> {
        SelectOption::mount(&self.registry, &self.option_choice, value, label, node)
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn value(&self) -> Option<T> {
        self.choice.value()
    }

    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    pub fn is_disabled(&self) -> bool {
        self.config.shell.disabled
    }

    /// Label of the selected option, or the placeholder
    pub fn display_text(&self) -> String {
        self.value()
            .and_then(|v| self.registry.get(&v))
            .map(|entry| entry.label)
            .unwrap_or_else(|| self.config.shell.placeholder.clone())
    }

    fn commit(&self, next: Option<T>) {
        // Empty registry or already there
        if next.is_some() && next != self.value() {
            self.choice.select(next);
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
        self.shell.dispatch(PanelEvent::Blur);
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.blur();
        EventOutcome::handled()
    }

    pub fn on_key_down(&mut self, event: &KeyboardEvent) -> EventOutcome {
        if self.is_disabled() || !event.is_pressed() {
            return EventOutcome::ignored();
        }

        let current = self.value();
        let outcome = match event.key {
            Key::Space => {
                self.shell.dispatch(PanelEvent::Space);
                EventOutcome::prevent_default()
            }
            Key::Enter => {
                let was_open = self.is_open();
                self.shell.dispatch(PanelEvent::Enter);
                if was_open {
                    EventOutcome::prevent_default()
                } else {
                    EventOutcome::handled()
                }
            }
            Key::Escape if self.shell.dispatch(PanelEvent::Escape) => EventOutcome::handled(),
            Key::ArrowUp => {
                self.commit(self.registry.before(current.as_ref()));
                EventOutcome::prevent_default()
            }
            Key::ArrowDown => {
                self.commit(self.registry.after(current.as_ref()));
                EventOutcome::prevent_default()
            }
            Key::Home => {
                self.commit(self.registry.first());
                EventOutcome::prevent_default()
            }
            Key::End => {
                self.commit(self.registry.last());
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

    /// Re-read the anchor position after the host moved the control
    pub fn reposition(&self) {
        self.shell.reposition();
    }

    /// Current render output
    ///
    /// Also applies panel changes made by options since the last event.
    pub fn view(&mut self) -> WidgetView<T> {
        self.shell.sync(&self.config.shell);

        let label = self.value().and_then(|v| self.registry.get(&v));
        WidgetView {
            class: self.shell.class(),
            is_placeholder: label.is_none(),
            text: label
                .map(|entry| entry.label)
                .unwrap_or_else(|| self.config.shell.placeholder.clone()),
            placeholder: self.config.shell.placeholder.clone(),
            panel_class: self.shell.panel_class(),
            panel: self.shell.frame(),
            highlighted: None,
            disabled: self.is_disabled(),
        }
    }
}

/// Builder for creating Select components with fluent API
pub struct SelectBuilder<T: ChoiceValue> {
    key: InstanceKey,
    document: Document,
    config: SelectConfig<T>,
}

impl<T: ChoiceValue> SelectBuilder<T> {
    /// Create a select builder over a value state
    ///
    /// Uses `#[track_caller]` so each call site gets its own instance key.
    #[track_caller]
    pub fn new(document: &Document, value_state: &State<Option<T>>) -> Self {
        Self {
            key: InstanceKey::new("select"),
            document: document.clone(),
            config: SelectConfig {
                value_state: value_state.clone(),
                shell: ShellConfig::default(),
                on_change: None,
            },
        }
    }

    /// Create a select builder with an explicit key
    pub fn with_key(
        key: impl Into<String>,
        document: &Document,
        value_state: &State<Option<T>>,
    ) -> Self {
        Self {
            key: InstanceKey::explicit(key),
            document: document.clone(),
            config: SelectConfig {
                value_state: value_state.clone(),
                shell: ShellConfig::default(),
                on_change: None,
            },
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.shell.placeholder = placeholder.into();
        self
    }

    /// Group name for the options; defaults to the instance key
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.shell.name = Some(name.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.config.shell.disabled = disabled;
        self
    }

    /// Panel placement relative to the control
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.config.shell.anchor = anchor;
        self
    }

    /// Inline style for the panel container
    pub fn panel_style(mut self, style: InlineStyle) -> Self {
        self.config.shell.style = style;
        self
    }

    /// Render the panel under `target` instead of the body
    pub fn render_target(mut self, target: NodeId) -> Self {
        self.config.shell.render_target = Some(target);
        self
    }

    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.config.shell.handlers = handlers;
        self
    }

    /// Called after the value state was written
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        self.config.on_change = Some(std::sync::Arc::new(callback));
        self
    }

    pub fn build(self) -> Select<T> {
        Select::from_config(&self.document, self.key, self.config)
    }
}

/// Create a select over a value state
///
/// # Example
///
/// ```ignore
/// let country = ctx.use_state_keyed("country", || None::<String>);
/// let select = cn::select(&doc, &country).placeholder("Country").build();
/// ```
#[track_caller]
pub fn select<T: ChoiceValue>(document: &Document, value_state: &State<Option<T>>) -> SelectBuilder<T> {
    SelectBuilder::new(document, value_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use picket_core::{Rect, StateContext};
    use std::sync::{Arc, Mutex};

    fn fixture(initial: Option<u32>) -> (StateContext, Document, State<Option<u32>>) {
        let ctx = StateContext::new();
        let doc = Document::new();
        let value = ctx.use_state(initial);
        (ctx, doc, value)
    }

    fn press(select: &mut Select<u32>, key: Key) -> EventOutcome {
        select.on_key_down(&KeyboardEvent::pressed(key))
    }

    #[test]
    fn test_label_falls_back_to_placeholder() {
        let (_ctx, doc, value) = fixture(None);
        let mut select = select(&doc, &value).placeholder("Pick one").build();
        let _one = select.option(1, "One").unwrap();

        assert_eq!(select.display_text(), "Pick one");
        assert!(select.view().is_placeholder);

        value.set(Some(1));
        assert_eq!(select.view().text, "One");

        // Value with no registered option
        value.set(Some(42));
        assert_eq!(select.display_text(), "Pick one");
    }

    #[test]
    fn test_click_toggles_and_blur_closes() {
        let (_ctx, doc, value) = fixture(None);
        let mut select = select(&doc, &value).build();
        doc.append_child(doc.body(), select.root()).unwrap();

        select.on_click();
        assert!(select.is_open());
        assert_eq!(select.view().class, "select open");
        assert!(doc.is_connected(select.panel()));

        select.on_click();
        assert!(!select.is_open());

        select.on_click();
        select.on_blur();
        assert!(!select.is_open());
        assert!(!doc.is_connected(select.panel()));
    }

    #[test]
    fn test_space_toggles_escape_closes() {
        let (_ctx, doc, value) = fixture(None);
        let mut select = select(&doc, &value).build();

        assert!(press(&mut select, Key::Space).prevent_default);
        assert!(select.is_open());
        assert!(press(&mut select, Key::Escape).handled);
        assert!(!select.is_open());
        assert!(!press(&mut select, Key::Escape).handled);
    }

    #[test]
    fn test_enter_toggles_panel() {
        let (_ctx, doc, value) = fixture(Some(1));
        let mut select = select(&doc, &value).build();
        let _one = select.option(1, "One").unwrap();

        let opened = press(&mut select, Key::Enter);
        assert!(opened.handled && !opened.prevent_default);
        assert!(select.is_open());

        // Closing an open panel must not submit the surrounding form
        assert!(press(&mut select, Key::Enter).prevent_default);
        assert!(!select.is_open());
        assert_eq!(value.get(), Some(1));
    }

    #[test]
    fn test_option_click_selects_and_closes() {
        let (_ctx, doc, value) = fixture(None);
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let mut select = select(&doc, &value)
            .on_change(move |v| *s.lock().unwrap() = v.copied())
            .build();
        let _a = select.option(10, "Ten").unwrap();
        let b = select.option(20, "Twenty").unwrap();

        select.on_click();
        b.click();

        assert_eq!(value.get(), Some(20));
        assert_eq!(*seen.lock().unwrap(), Some(20));
        let view = select.view();
        assert_eq!(view.class, "select");
        assert!(view.panel.is_none());
        assert_eq!(view.text, "Twenty");
    }

    #[test]
    fn test_arrows_change_value_while_closed() {
        let (_ctx, doc, value) = fixture(None);
        let mut select = select(&doc, &value).build();
        let _options: Vec<_> = [1, 2, 3]
            .into_iter()
            .map(|v| select.option(v, v.to_string()).unwrap())
            .collect();

        press(&mut select, Key::ArrowDown);
        assert_eq!(value.get(), Some(1));
        press(&mut select, Key::End);
        assert_eq!(value.get(), Some(3));
        press(&mut select, Key::Home);
        assert_eq!(value.get(), Some(1));
        assert!(!select.is_open());
    }

    #[test]
    fn test_arrow_on_empty_registry_keeps_value() {
        let (_ctx, doc, value) = fixture(Some(5));
        let mut select = select(&doc, &value).build();

        press(&mut select, Key::ArrowDown);
        assert_eq!(value.get(), Some(5));
    }

    #[test]
    fn test_disabled_ignores_everything() {
        let (_ctx, doc, value) = fixture(None);
        let mut select = select(&doc, &value).disabled(true).build();
        let _one = select.option(1, "One").unwrap();

        assert!(!select.on_click().handled);
        assert!(!press(&mut select, Key::ArrowDown).handled);
        assert!(!select.is_open());
        assert_eq!(value.get(), None);
        assert!(select.view().disabled);
    }

    #[test]
    fn test_passthrough_runs_after_own_handling() {
        let (_ctx, doc, value) = fixture(None);
        let seen_open = Arc::new(Mutex::new(Vec::new()));
        let s = seen_open.clone();
        let value_for_handler = value.clone();
        let mut select = select(&doc, &value)
            .handlers(Handlers::new().on_key_down(move |_| {
                s.lock().unwrap().push(value_for_handler.get());
            }))
            .build();
        let _one = select.option(1, "One").unwrap();

        press(&mut select, Key::ArrowDown);
        assert_eq!(*seen_open.lock().unwrap(), vec![Some(1)]);
    }

    #[test]
    fn test_panel_frame_follows_control() {
        let (_ctx, doc, value) = fixture(None);
        let mut select = select(&doc, &value).build();
        doc.append_child(doc.body(), select.root()).unwrap();
        doc.set_bounds(select.root(), Rect::new(8.0, 40.0, 200.0, 32.0))
            .unwrap();

        select.open();
        let frame = select.view().panel.unwrap();
        assert_eq!(frame.style.get("top"), Some("72px"));
        assert_eq!(frame.style.get("left"), Some("8px"));
        assert_eq!(select.view().panel_class, "select-options");
    }

    #[test]
    fn test_options_share_name() {
        let (_ctx, doc, value) = fixture(None);
        let select = SelectBuilder::with_key("fruit", &doc, &value).build();
        let a = select.option(1, "One").unwrap();
        assert_eq!(a.name(), "fruit");

        let named = super::select(&doc, &value).name("country").build();
        let b = named.option(1, "One").unwrap();
        assert_eq!(b.name(), "country");
    }
}
