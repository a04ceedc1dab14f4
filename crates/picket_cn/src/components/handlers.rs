//! Pass-through event callbacks
//!
//! Consumers can hook the same events the widgets react to. A widget always
//! finishes its own handling first, then calls through.

use std::sync::Arc;

use picket_core::KeyboardEvent;

/// Callback for focus, blur and click
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback for key presses
pub type KeyCallback = Arc<dyn Fn(&KeyboardEvent) + Send + Sync>;

/// Consumer callbacks run after a widget's own handling
#[derive(Clone, Default)]
pub struct Handlers {
    on_focus: Option<EventCallback>,
    on_blur: Option<EventCallback>,
    on_click: Option<EventCallback>,
    on_key_down: Option<KeyCallback>,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_focus", &self.on_focus.is_some())
            .field("on_blur", &self.on_blur.is_some())
            .field("on_click", &self.on_click.is_some())
            .field("on_key_down", &self.on_key_down.is_some())
            .finish()
    }
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_focus<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_focus = Some(Arc::new(f));
        self
    }

    pub fn on_blur<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_blur = Some(Arc::new(f));
        self
    }

    pub fn on_click<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_click = Some(Arc::new(f));
        self
    }

    pub fn on_key_down<F: Fn(&KeyboardEvent) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_key_down = Some(Arc::new(f));
        self
    }

    pub(crate) fn focus(&self) {
        if let Some(f) = &self.on_focus {
            f();
        }
    }

    pub(crate) fn blur(&self) {
        if let Some(f) = &self.on_blur {
            f();
        }
    }

    pub(crate) fn click(&self) {
        if let Some(f) = &self.on_click {
            f();
        }
    }

    pub(crate) fn key_down(&self, event: &KeyboardEvent) {
        if let Some(f) = &self.on_key_down {
            f(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picket_core::Key;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callbacks_fire() {
        let count = Arc::new(AtomicUsize::new(0));
        let (a, b) = (count.clone(), count.clone());
        let handlers = Handlers::new()
            .on_focus(move || {
                a.fetch_add(1, Ordering::SeqCst);
            })
            .on_key_down(move |ev| {
                if ev.key == Key::Enter {
                    b.fetch_add(10, Ordering::SeqCst);
                }
            });

        handlers.focus();
        handlers.blur();
        handlers.key_down(&KeyboardEvent::pressed(Key::Enter));
        assert_eq!(count.load(Ordering::SeqCst), 11);
    }
}
