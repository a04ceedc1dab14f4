//! Autocomplete component - free-text query with a committed value
//!
//! A text input whose typed query drives a caller-supplied option list, and
//! whose committed value is kept in the consumer's `State`. The query is the
//! only state the widget keeps itself. It is reconciled with the value by
//! three rules, applied in [`Autocomplete::reconcile`] after every event:
//!
//! 1. when the value changes, the query becomes `serialize(value)`
//!    (empty for no value)
//! 2. when the query equals `serialize` of a registered option, that
//!    option's value is committed
//! 3. when the query is cleared while a value is set, the value is cleared
//!
//! `on_query` fires on every input and on focus so the caller can (re)fetch
//! options; debouncing and dropping stale responses is up to the caller.
//!
//! # Example
//!
//! ```ignore
//! let city = ctx.use_state_keyed("city", || None::<String>);
//!
//! let mut input = cn::autocomplete(&doc, &city)
//!     .placeholder("City")
//!     .on_query(|text| fetch_cities(text))
//!     .build();
//!
//! // later, when results arrive
//! let options: Vec<_> = results
//!     .into_iter()
//!     .map(|name| input.option(name.clone(), name))
//!     .collect::<Result<_, _>>()?;
//! ```

use std::sync::Arc;

use picket_core::{EventOutcome, Key, KeyboardEvent, State};
use picket_layout::{
    Anchor, ChoiceValue, Document, DocumentError, InlineStyle, InstanceKey, NodeId,
    RegistryHandle, SelectCallback, SingleChoice,
};

use super::handlers::Handlers;
use super::option::{create_option_node, SelectOption};
use super::panel::{PanelEvent, PanelShell, ShellConfig, WidgetView};

/// Text form of a value, compared against the query
pub type SerializeFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Called with the current query text
pub type QueryCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct AutocompleteConfig<T: ChoiceValue> {
    value_state: State<Option<T>>,
    shell: ShellConfig,
    serialize: SerializeFn<T>,
    on_change: Option<SelectCallback<T>>,
    on_query: Option<QueryCallback>,
}

/// Text input with a dropdown of matching options
pub struct Autocomplete<T: ChoiceValue> {
    key: InstanceKey,
    config: AutocompleteConfig<T>,
    registry: RegistryHandle<T>,
    choice: SingleChoice<T>,
    option_choice: SingleChoice<T>,
    shell: PanelShell,
    query: String,
    /// Value version the query last mirrored
    mirrored_version: Option<u64>,
}

impl<T: ChoiceValue> std::fmt::Debug for Autocomplete<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autocomplete")
            .field("key", &self.key)
            .field("query", &self.query)
            .field("value", &self.choice.value())
            .field("open", &self.shell.is_open())
            .finish()
    }
}

impl<T: ChoiceValue> Autocomplete<T> {
    fn from_config(document: &Document, key: InstanceKey, config: AutocompleteConfig<T>) -> Self {
        let shell = PanelShell::new(document, "input", "autocomplete", "autocomplete-options");
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

        let mut autocomplete = Self {
            key,
            config,
            registry,
            choice,
            option_choice,
            shell,
            query: String::new(),
            mirrored_version: None,
        };
        autocomplete.reconcile();
        autocomplete
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

    pub fn choice(&self) -> &SingleChoice<T> {
        &self.option_choice
    }

    /// Add an option at the end of the panel
    ///
    /// A query that already spells the new option commits it on the next
    /// event or [`Autocomplete::view`].
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

    pub fn mount_option(&self, value: T, label: impl Into<String>, node: NodeId) -> SelectOption<T> {
        SelectOption::mount(&self.registry, &self.option_choice, value, label, node)
    }

    pub fn value(&self) -> Option<T> {
        self.choice.value()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    pub fn is_disabled(&self) -> bool {
        self.config.shell.disabled
    }

    fn serialize(&self, value: &T) -> String {
        (self.config.serialize)(value)
    }

    fn notify_query(&self) {
        if let Some(on_query) = &self.config.on_query {
            on_query(&self.query);
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Mirror the value into the query when the value was written
    fn mirror_value(&mut self) {
        let version = self.config.value_state.version();
        if self.mirrored_version == Some(version) {
            return;
        }
        self.mirrored_version = Some(version);

        let text = self
            .value()
            .map(|v| self.serialize(&v))
            .unwrap_or_default();
        if text != self.query {
            tracing::trace!("{}: query mirrors value as {:?}", self.key, text);
            self.query = text;
        }
    }

    /// Bring query and value back in line
    pub fn reconcile(&mut self) {
        self.mirror_value();

        let current = self.value();
        if self.query.is_empty() {
            if current.is_some() {
                tracing::debug!("{}: query cleared, clearing value", self.key);
                self.choice.select(None);
            }
        } else {
            let serialize = &self.config.serialize;
            let query = &self.query;
            let exact = self.registry.find(|entry| serialize(&entry.value) == *query);
            if let Some(entry) = exact {
                if current.as_ref() != Some(&entry.value) {
                    tracing::debug!("{}: query matches {:?}, committing", self.key, entry.value);
                    self.choice.select(Some(entry.value));
                }
            }
        }

        self.mirror_value();
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// The input text changed
    pub fn on_input(&mut self, text: impl Into<String>) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        // Pick up outside writes before the new text overrides them
        self.mirror_value();
        self.query = text.into();
        self.notify_query();
        self.reconcile();
        self.shell.sync(&self.config.shell);
        EventOutcome::handled()
    }

    pub fn on_focus(&mut self) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        self.reconcile();
        self.shell.dispatch(PanelEvent::Focus);
        self.notify_query();
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.focus();
        EventOutcome::handled()
    }

    /// Clicking the input opens the panel; it never closes it
    pub fn on_click(&mut self) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        if !self.is_open() {
            self.shell.dispatch(PanelEvent::Click);
        }
        self.reconcile();
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.click();
        EventOutcome::handled()
    }

    pub fn on_blur(&mut self) -> EventOutcome {
        if self.is_disabled() {
            return EventOutcome::ignored();
        }
        self.shell.dispatch(PanelEvent::Blur);
        self.reconcile();
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.blur();
        EventOutcome::handled()
    }

    pub fn on_key_down(&mut self, event: &KeyboardEvent) -> EventOutcome {
        if self.is_disabled() || !event.is_pressed() {
            return EventOutcome::ignored();
        }
        self.reconcile();

        let current = self.value();
        let outcome = match event.key {
            Key::Enter => {
                let was_open = self.is_open();
                self.shell.dispatch(PanelEvent::Enter);
                if was_open {
                    // Keep the surrounding form from submitting
                    EventOutcome::prevent_default()
                } else {
                    EventOutcome::handled()
                }
            }
            Key::Escape if self.shell.dispatch(PanelEvent::Escape) => EventOutcome::handled(),
            Key::ArrowUp => {
                self.step(self.registry.before(current.as_ref()));
                EventOutcome::prevent_default()
            }
            Key::ArrowDown => {
                self.step(self.registry.after(current.as_ref()));
                EventOutcome::prevent_default()
            }
            _ => EventOutcome::ignored(),
        };

        self.reconcile();
        self.shell.sync(&self.config.shell);
        self.config.shell.handlers.key_down(event);
        outcome
    }

    fn step(&self, next: Option<T>) {
        if next.is_some() && next != self.value() {
            self.choice.select(next);
        }
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
        self.reconcile();
        self.shell.sync(&self.config.shell);
        WidgetView {
            class: self.shell.class(),
            text: self.query.clone(),
            placeholder: self.config.shell.placeholder.clone(),
            is_placeholder: self.query.is_empty(),
            panel_class: self.shell.panel_class(),
            panel: self.shell.frame(),
            highlighted: None,
            disabled: self.is_disabled(),
        }
    }
}

/// Builder for [`Autocomplete`]
pub struct AutocompleteBuilder<T: ChoiceValue> {
    key: InstanceKey,
    document: Document,
    config: AutocompleteConfig<T>,
}

impl<T: ChoiceValue + std::fmt::Display> AutocompleteBuilder<T> {
    /// Builder serializing values with `ToString`
    #[track_caller]
    pub fn new(document: &Document, value_state: &State<Option<T>>) -> Self {
        Self::with_serializer(document, value_state, |v: &T| v.to_string())
    }
}

impl<T: ChoiceValue> AutocompleteBuilder<T> {
    /// Builder for values without a `Display` form
    #[track_caller]
    pub fn with_serializer<F>(document: &Document, value_state: &State<Option<T>>, serialize: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            key: InstanceKey::new("autocomplete"),
            document: document.clone(),
            config: AutocompleteConfig {
                value_state: value_state.clone(),
                shell: ShellConfig::default(),
                serialize: Arc::new(serialize),
                on_change: None,
                on_query: None,
            },
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = InstanceKey::explicit(key);
        self
    }

    /// Replace the text form used for the query
    pub fn serialize<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.config.serialize = Arc::new(serialize);
        self
    }

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

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        self.config.on_change = Some(Arc::new(callback));
        self
    }

    /// Called with the query on every input and on focus
    pub fn on_query<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.config.on_query = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Autocomplete<T> {
        Autocomplete::from_config(&self.document, self.key, self.config)
    }
}

/// Create an autocomplete over a value state
#[track_caller]
pub fn autocomplete<T: ChoiceValue + std::fmt::Display>(
    document: &Document,
    value_state: &State<Option<T>>,
) -> AutocompleteBuilder<T> {
    AutocompleteBuilder::new(document, value_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use picket_core::StateContext;
    use std::sync::Mutex;

    fn fixture(initial: Option<&'static str>) -> (StateContext, Document, State<Option<&'static str>>) {
        let ctx = StateContext::new();
        let doc = Document::new();
        let value = ctx.use_state(initial);
        (ctx, doc, value)
    }

    fn press(input: &mut Autocomplete<&'static str>, key: Key) -> EventOutcome {
        input.on_key_down(&KeyboardEvent::pressed(key))
    }

    #[test]
    fn test_query_mirrors_initial_value() {
        let (_ctx, doc, value) = fixture(Some("Oslo"));
        let input = autocomplete(&doc, &value).build();
        assert_eq!(input.query(), "Oslo");
    }

    #[test]
    fn test_outside_write_replaces_query() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();
        input.on_input("Be");

        value.set(Some("Bergen"));
        assert_eq!(input.view().text, "Bergen");

        value.set(None);
        assert_eq!(input.view().text, "");
    }

    #[test]
    fn test_exact_match_commits() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();
        let _oslo = input.option("Oslo", "Oslo").unwrap();
        let _bergen = input.option("Bergen", "Bergen").unwrap();

        input.on_input("Berg");
        assert_eq!(value.get(), None);
        input.on_input("Bergen");
        assert_eq!(value.get(), Some("Bergen"));
        assert_eq!(input.query(), "Bergen");
    }

    #[test]
    fn test_match_waits_for_option_to_arrive() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();

        input.on_input("Oslo");
        assert_eq!(value.get(), None);

        let _oslo = input.option("Oslo", "Oslo").unwrap();
        input.view();
        assert_eq!(value.get(), Some("Oslo"));
    }

    #[test]
    fn test_clearing_query_clears_value() {
        let (_ctx, doc, value) = fixture(Some("Oslo"));
        let mut input = autocomplete(&doc, &value).build();

        input.on_input("");
        assert_eq!(value.get(), None);
        assert_eq!(input.query(), "");
    }

    #[test]
    fn test_on_query_on_input_and_focus() {
        let (_ctx, doc, value) = fixture(None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let mut input = autocomplete(&doc, &value)
            .on_query(move |q| s.lock().unwrap().push(q.to_string()))
            .build();

        input.on_focus();
        input.on_input("T");
        input.on_input("Tr");
        assert_eq!(*seen.lock().unwrap(), vec!["", "T", "Tr"]);
    }

    #[test]
    fn test_focus_opens_blur_closes() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();

        input.on_focus();
        assert!(input.is_open());
        assert_eq!(input.view().class, "autocomplete open");
        assert_eq!(input.view().panel_class, "autocomplete-options");

        input.on_click();
        assert!(input.is_open());

        input.on_blur();
        assert!(!input.is_open());
    }

    #[test]
    fn test_enter_toggles_and_prevents_submit_when_open() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();

        let first = press(&mut input, Key::Enter);
        assert!(input.is_open());
        assert!(!first.prevent_default);

        let second = press(&mut input, Key::Enter);
        assert!(!input.is_open());
        assert!(second.prevent_default);
    }

    #[test]
    fn test_arrows_move_value_and_query() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();
        let _a = input.option("Aalborg", "Aalborg").unwrap();
        let _b = input.option("Bodø", "Bodø").unwrap();

        input.on_input("xyz");
        press(&mut input, Key::ArrowDown);
        assert_eq!(value.get(), Some("Aalborg"));
        assert_eq!(input.query(), "Aalborg");

        press(&mut input, Key::ArrowDown);
        press(&mut input, Key::ArrowDown);
        assert_eq!(value.get(), Some("Bodø"));
        assert_eq!(input.query(), "Bodø");
    }

    #[test]
    fn test_option_click_commits_and_closes() {
        let (_ctx, doc, value) = fixture(None);
        let mut input = autocomplete(&doc, &value).build();
        let tromso = input.option("Tromsø", "Tromsø").unwrap();

        input.on_focus();
        input.on_input("Tro");
        tromso.click();

        let view = input.view();
        assert_eq!(view.text, "Tromsø");
        assert!(view.panel.is_none());
        assert_eq!(value.get(), Some("Tromsø"));
    }

    #[test]
    fn test_custom_serializer() {
        #[derive(Clone, Debug, PartialEq)]
        struct City {
            id: u32,
            name: &'static str,
        }

        let ctx = StateContext::new();
        let doc = Document::new();
        let value = ctx.use_state(Some(City { id: 1, name: "Oslo" }));
        let mut input =
            AutocompleteBuilder::with_serializer(&doc, &value, |c: &City| c.name.to_uppercase())
                .build();
        assert_eq!(input.query(), "OSLO");

        let _b = input.option(City { id: 2, name: "Bergen" }, "Bergen").unwrap();
        input.on_input("BERGEN");
        assert_eq!(value.get().map(|c| c.id), Some(2));
    }
}
