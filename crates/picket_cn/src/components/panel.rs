//! Option panel shared by the composite widgets
//!
//! Every composite owns a control element (the anchor) and a panel element
//! its options mount into. The panel lives detached from the document while
//! closed; opening mounts a [`RelativeOverlay`] below the control and moves
//! the panel into it, closing hands the panel back and drops the overlay.
//!
//! Open/closed follows one state machine for all composites:
//!
//! ```text
//! Closed --(Click | Focus | Enter | Space)--> Open
//! Open   --(Click | Enter | Space | Blur | Escape | Select)--> Closed
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use picket_layout::{
    anchors, Anchor, Document, InlineStyle, NodeId, OverlayFrame, RelativeOverlay,
};

use super::handlers::Handlers;

/// Panel visibility
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

/// Inputs that move the panel between states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelEvent {
    Click,
    Focus,
    Enter,
    Space,
    Blur,
    Escape,
    /// An option was picked
    Select,
}

impl PanelState {
    /// Next state for `event`, or `None` when the event does not apply
    pub fn on_event(&self, event: PanelEvent) -> Option<Self> {
        use PanelEvent::*;

        match (self, event) {
            (PanelState::Closed, Click | Focus | Enter | Space) => Some(PanelState::Open),
            (PanelState::Open, Click | Enter | Space | Blur | Escape | Select) => {
                Some(PanelState::Closed)
            }
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PanelState::Open)
    }
}

/// Shared panel state, so option callbacks can close the panel
#[derive(Clone, Debug, Default)]
pub struct PanelCell(Arc<Mutex<PanelState>>);

impl PanelCell {
    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> PanelState {
        *self.lock()
    }

    pub fn is_open(&self) -> bool {
        self.get().is_open()
    }

    /// Apply `event`; returns whether the state changed
    pub fn dispatch(&self, event: PanelEvent) -> bool {
        let mut state = self.lock();
        match state.on_event(event) {
            Some(next) => {
                tracing::debug!("panel {:?} --{:?}--> {:?}", *state, event, next);
                *state = next;
                true
            }
            None => false,
        }
    }
}

/// Settings every composite builder collects
#[derive(Clone)]
pub(crate) struct ShellConfig {
    pub placeholder: String,
    pub name: Option<String>,
    pub disabled: bool,
    pub anchor: Anchor,
    pub style: InlineStyle,
    pub render_target: Option<NodeId>,
    pub handlers: Handlers,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            placeholder: String::new(),
            name: None,
            disabled: false,
            anchor: anchors::below_left(),
            style: InlineStyle::new(),
            render_target: None,
            handlers: Handlers::default(),
        }
    }
}

/// Render output of a composite
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetView<T> {
    /// Control class, e.g. `"select open"`
    pub class: String,
    /// Label, count or query shown in the control
    pub text: String,
    pub placeholder: String,
    /// Whether `text` is the placeholder rather than a value
    pub is_placeholder: bool,
    pub panel_class: &'static str,
    /// Where to draw the panel; `None` while closed or not yet positioned
    pub panel: Option<OverlayFrame>,
    /// Option under the keyboard focus candidate, if the widget tracks one
    pub highlighted: Option<T>,
    pub disabled: bool,
}

/// Control element, panel element and overlay for one composite
pub(crate) struct PanelShell {
    document: Document,
    root: NodeId,
    panel: NodeId,
    state: PanelCell,
    overlay: Option<RelativeOverlay>,
    base_class: &'static str,
    panel_class: &'static str,
}

impl PanelShell {
    pub fn new(
        document: &Document,
        root_tag: &str,
        base_class: &'static str,
        panel_class: &'static str,
    ) -> Self {
        Self {
            document: document.clone(),
            root: document.create_element(root_tag),
            panel: document.create_element("ul"),
            state: PanelCell::default(),
            overlay: None,
            base_class,
            panel_class,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn panel(&self) -> NodeId {
        self.panel
    }

    pub fn cell(&self) -> &PanelCell {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn dispatch(&self, event: PanelEvent) -> bool {
        self.state.dispatch(event)
    }

    /// Mount or drop the overlay to match the panel state
    pub fn sync(&mut self, config: &ShellConfig) {
        match (self.state.is_open(), self.overlay.is_some()) {
            (true, false) => self.mount_overlay(config),
            (false, true) => {
                self.overlay = None;
                tracing::debug!("{} panel closed", self.base_class);
            }
            _ => {}
        }
    }

    fn mount_overlay(&mut self, config: &ShellConfig) {
        let mut builder = RelativeOverlay::builder(&self.document, self.root)
            .anchor(config.anchor.clone())
            .style(config.style.clone());
        if let Some(target) = config.render_target {
            builder = builder.render_target(target);
        }

        let overlay = match builder.mount() {
            Ok(overlay) => overlay,
            Err(err) => {
                tracing::warn!("{} panel could not open: {}", self.base_class, err);
                return;
            }
        };
        if let Err(err) = overlay.attach(self.panel) {
            tracing::warn!("{} panel could not attach: {}", self.base_class, err);
            return;
        }
        tracing::debug!("{} panel open in {:?}", self.base_class, overlay.container());
        self.overlay = Some(overlay);
    }

    pub fn frame(&self) -> Option<OverlayFrame> {
        self.overlay.as_ref().and_then(RelativeOverlay::frame)
    }

    /// Re-read the anchor rectangle, e.g. after the host re-laid out
    pub fn reposition(&self) {
        if let Some(overlay) = &self.overlay {
            overlay.reposition();
        }
    }

    pub fn class(&self) -> String {
        if self.is_open() {
            format!("{} open", self.base_class)
        } else {
            self.base_class.to_string()
        }
    }

    pub fn panel_class(&self) -> &'static str {
        self.panel_class
    }
}

impl Drop for PanelShell {
    fn drop(&mut self) {
        self.overlay = None;
        let _ = self.document.destroy(self.panel);
        let _ = self.document.destroy(self.root);
    }
}
