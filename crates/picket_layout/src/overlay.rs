//! Floating overlays
//!
//! [`Overlay`] renders content into a container of its own, appended to the
//! document body (or to an injected render target), so floating panels are
//! never clipped by the layout they logically belong to. The container lives
//! exactly as long as the `Overlay`.
//!
//! [`RelativeOverlay`] adds position tracking: it derives fixed-position
//! offsets from an anchor element's on-screen rectangle, and recomputes them
//! on mount, when the anchor or anchor function changes, and on every scroll
//! anywhere in the document.
//!
//! Resizes and anchor content changes do not trigger a recompute; call
//! [`RelativeOverlay::reposition`] when the host knows the anchor moved.
//!
//! # Example
//!
//! ```ignore
//! let overlay = RelativeOverlay::builder(&doc, button)
//!     .anchor(anchors::below_left_offset(4.0))
//!     .style(InlineStyle::new().with("z-index", "10"))
//!     .mount()?;
//! overlay.attach(panel)?;
//!
//! if let Some(frame) = overlay.frame() {
//!     render_at(frame.container, &frame.style);
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use picket_core::Rect;

use crate::document::{Document, DocumentError, ListenerId, ListenerPhase, NodeId};

// ============================================================================
// Style and position
// ============================================================================

/// Ordered inline style declarations
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InlineStyle {
    declarations: IndexMap<String, String>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InlineStyle::set`]
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Set a property, replacing any earlier value in place
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.declarations.insert(property.into(), value.into());
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.declarations.shift_remove(property)
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations.get(property).map(String::as_str)
    }

    /// Overlay `other` on top of this style
    pub fn merge(&mut self, other: &InlineStyle) {
        for (property, value) in &other.declarations {
            self.set(property.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialize as `property: value; ...`
    pub fn to_css(&self) -> String {
        self.iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Fixed-position offsets in pixels; unset sides are left to the stylesheet
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayPosition {
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
}

impl OverlayPosition {
    /// No side computed yet
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }

    fn sides(&self) -> [(&'static str, Option<f32>); 4] {
        [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ]
    }

    /// `position: fixed` plus the computed offsets
    pub fn to_style(&self) -> InlineStyle {
        let mut style = InlineStyle::new().with("position", "fixed");
        for (side, offset) in self.sides() {
            if let Some(px) = offset {
                style.set(side, format!("{}px", px));
            }
        }
        style
    }
}

/// Maps the anchor's on-screen rectangle to overlay offsets
pub type Anchor = Arc<dyn Fn(Rect) -> OverlayPosition + Send + Sync>;

/// Common anchor functions
pub mod anchors {
    use super::{Anchor, OverlayPosition};
    use picket_core::Rect;
    use std::sync::Arc;

    /// Directly below the anchor, left edges aligned
    pub fn below_left() -> Anchor {
        below_left_offset(0.0)
    }

    /// Below the anchor with a vertical gap
    pub fn below_left_offset(gap: f32) -> Anchor {
        Arc::new(move |rect: Rect| OverlayPosition {
            top: Some(rect.bottom() + gap),
            left: Some(rect.x),
            ..Default::default()
        })
    }

    /// Below the anchor, right edges aligned
    pub fn below_right(viewport_width: f32) -> Anchor {
        Arc::new(move |rect: Rect| OverlayPosition {
            top: Some(rect.bottom()),
            right: Some(viewport_width - rect.right()),
            ..Default::default()
        })
    }

    /// Above the anchor, left edges aligned
    pub fn above_left(viewport_height: f32) -> Anchor {
        Arc::new(move |rect: Rect| OverlayPosition {
            bottom: Some(viewport_height - rect.y),
            left: Some(rect.x),
            ..Default::default()
        })
    }

    /// To the right of the anchor, top edges aligned
    pub fn right_of(gap: f32) -> Anchor {
        Arc::new(move |rect: Rect| OverlayPosition {
            top: Some(rect.y),
            left: Some(rect.right() + gap),
            ..Default::default()
        })
    }
}

/// What a host needs to draw a positioned overlay
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayFrame {
    pub container: NodeId,
    pub style: InlineStyle,
}

// ============================================================================
// Overlay
// ============================================================================

/// A top-level container owned by one floating element
#[derive(Debug)]
pub struct Overlay {
    document: Document,
    container: NodeId,
}

impl Overlay {
    /// Create a container at the end of the body
    pub fn mount(document: &Document) -> Result<Self, DocumentError> {
        Self::mount_into(document, document.body())
    }

    /// Create a container under an alternate render target
    pub fn mount_into(document: &Document, target: NodeId) -> Result<Self, DocumentError> {
        let container = document.create_element("div");
        if let Err(err) = document.append_child(target, container) {
            let _ = document.destroy(container);
            return Err(err);
        }
        tracing::debug!("overlay container {:?} mounted under {:?}", container, target);
        Ok(Self {
            document: document.clone(),
            container,
        })
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Render `content` into the container
    pub fn attach(&self, content: NodeId) -> Result<(), DocumentError> {
        self.document.append_child(self.container, content)
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        // Content is owned by whoever attached it; hand it back detached
        for child in self.document.children(self.container) {
            let _ = self.document.detach(child);
        }
        if let Err(err) = self.document.destroy(self.container) {
            tracing::warn!("overlay container already gone: {}", err);
        } else {
            tracing::debug!("overlay container {:?} removed", self.container);
        }
    }
}

// ============================================================================
// RelativeOverlay
// ============================================================================

struct Tracking {
    at: NodeId,
    anchor: Anchor,
    position: OverlayPosition,
}

impl Tracking {
    fn recompute(&mut self, document: &Document) {
        match document.bounding_rect(self.at) {
            Some(rect) => {
                self.position = (self.anchor)(rect);
                tracing::trace!("overlay repositioned to {:?}", self.position);
            }
            None => tracing::warn!("overlay anchor {:?} is not in the document", self.at),
        }
    }
}

fn lock_tracking(tracking: &Mutex<Tracking>) -> MutexGuard<'_, Tracking> {
    tracking.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`RelativeOverlay`]
pub struct RelativeOverlayBuilder {
    document: Document,
    at: NodeId,
    anchor: Anchor,
    style: InlineStyle,
    render_target: Option<NodeId>,
}

impl RelativeOverlayBuilder {
    /// Anchor function; defaults to [`anchors::below_left`]
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Caller style; position offsets are merged over it
    pub fn style(mut self, style: InlineStyle) -> Self {
        self.style = style;
        self
    }

    /// Mount under `target` instead of the body
    pub fn render_target(mut self, target: NodeId) -> Self {
        self.render_target = Some(target);
        self
    }

    pub fn mount(self) -> Result<RelativeOverlay, DocumentError> {
        let overlay = match self.render_target {
            Some(target) => Overlay::mount_into(&self.document, target)?,
            None => Overlay::mount(&self.document)?,
        };

        let tracking = Arc::new(Mutex::new(Tracking {
            at: self.at,
            anchor: self.anchor,
            position: OverlayPosition::default(),
        }));
        lock_tracking(&tracking).recompute(&self.document);

        let listener_tracking = Arc::clone(&tracking);
        let listener = self
            .document
            .add_scroll_listener(ListenerPhase::Capture, move |doc, _| {
                lock_tracking(&listener_tracking).recompute(doc);
            });

        Ok(RelativeOverlay {
            overlay,
            tracking,
            listener,
            style: self.style,
        })
    }
}

/// An [`Overlay`] kept at a fixed offset from an anchor element
pub struct RelativeOverlay {
    overlay: Overlay,
    tracking: Arc<Mutex<Tracking>>,
    listener: ListenerId,
    style: InlineStyle,
}

impl std::fmt::Debug for RelativeOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tracking = lock_tracking(&self.tracking);
        f.debug_struct("RelativeOverlay")
            .field("container", &self.overlay.container)
            .field("at", &tracking.at)
            .field("position", &tracking.position)
            .finish()
    }
}

impl RelativeOverlay {
    pub fn builder(document: &Document, at: NodeId) -> RelativeOverlayBuilder {
        RelativeOverlayBuilder {
            document: document.clone(),
            at,
            anchor: anchors::below_left(),
            style: InlineStyle::new(),
            render_target: None,
        }
    }

    /// Mount with the default anchor below `at`
    pub fn mount(document: &Document, at: NodeId) -> Result<Self, DocumentError> {
        Self::builder(document, at).mount()
    }

    pub fn container(&self) -> NodeId {
        self.overlay.container()
    }

    pub fn attach(&self, content: NodeId) -> Result<(), DocumentError> {
        self.overlay.attach(content)
    }

    pub fn at(&self) -> NodeId {
        lock_tracking(&self.tracking).at
    }

    /// Track a different anchor element
    pub fn set_at(&self, at: NodeId) {
        let mut tracking = lock_tracking(&self.tracking);
        if tracking.at != at {
            tracking.at = at;
            tracking.recompute(self.overlay.document());
        }
    }

    pub fn set_anchor(&self, anchor: Anchor) {
        let mut tracking = lock_tracking(&self.tracking);
        tracking.anchor = anchor;
        tracking.recompute(self.overlay.document());
    }

    pub fn set_style(&mut self, style: InlineStyle) {
        self.style = style;
    }

    /// Recompute from the anchor's current rectangle
    pub fn reposition(&self) {
        lock_tracking(&self.tracking).recompute(self.overlay.document());
    }

    /// Offsets as of the last recompute
    pub fn position(&self) -> OverlayPosition {
        lock_tracking(&self.tracking).position
    }

    /// Container and merged style, or `None` until a position exists
    pub fn frame(&self) -> Option<OverlayFrame> {
        let position = self.position();
        if position.is_empty() {
            return None;
        }
        let mut style = self.style.clone();
        style.merge(&position.to_style());
        Some(OverlayFrame {
            container: self.overlay.container(),
            style,
        })
    }
}

impl Drop for RelativeOverlay {
    fn drop(&mut self) {
        self.overlay.document().remove_scroll_listener(self.listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(doc: &Document, bounds: Rect) -> (NodeId, NodeId) {
        let scroller = doc.create_element("div");
        doc.append_child(doc.body(), scroller).unwrap();
        let button = doc.create_element("button");
        doc.append_child(scroller, button).unwrap();
        doc.set_bounds(button, bounds).unwrap();
        (scroller, button)
    }

    #[test]
    fn test_overlay_container_lifecycle() {
        let doc = Document::new();
        let container = {
            let overlay = Overlay::mount(&doc).unwrap();
            assert_eq!(doc.parent(overlay.container()), Some(doc.body()));
            overlay.container()
        };
        assert!(!doc.contains(container));
    }

    #[test]
    fn test_overlay_drop_returns_content_detached() {
        let doc = Document::new();
        let panel = doc.create_element("ul");
        {
            let overlay = Overlay::mount(&doc).unwrap();
            overlay.attach(panel).unwrap();
            assert!(doc.is_connected(panel));
        }
        assert!(doc.contains(panel));
        assert_eq!(doc.parent(panel), None);
    }

    #[test]
    fn test_overlay_render_target() {
        let doc = Document::new();
        let layer = doc.create_element("div");
        doc.append_child(doc.body(), layer).unwrap();

        let overlay = Overlay::mount_into(&doc, layer).unwrap();
        assert_eq!(doc.parent(overlay.container()), Some(layer));
    }

    #[test]
    fn test_overlay_missing_target() {
        let doc = Document::new();
        let gone = doc.create_element("div");
        doc.destroy(gone).unwrap();
        assert!(Overlay::mount_into(&doc, gone).is_err());
    }

    #[test]
    fn test_default_anchor_below_left() {
        let doc = Document::new();
        let (_, button) = anchored(&doc, Rect::new(20.0, 70.0, 120.0, 30.0));

        let overlay = RelativeOverlay::mount(&doc, button).unwrap();
        let position = overlay.position();
        assert_eq!(position.top, Some(100.0));
        assert_eq!(position.left, Some(20.0));
        assert_eq!(position.right, None);
    }

    #[test]
    fn test_scroll_tracking() {
        let doc = Document::new();
        let (scroller, button) = anchored(&doc, Rect::new(0.0, 100.0, 80.0, 24.0));

        let overlay = RelativeOverlay::builder(&doc, button)
            .anchor(Arc::new(|rect: Rect| OverlayPosition {
                top: Some(rect.y),
                ..Default::default()
            }))
            .mount()
            .unwrap();
        assert_eq!(overlay.position().top, Some(100.0));

        doc.scroll_by(scroller, 0.0, 60.0).unwrap();
        assert_eq!(overlay.position().top, Some(40.0));
    }

    #[test]
    fn test_frame_merges_style() {
        let doc = Document::new();
        let (_, button) = anchored(&doc, Rect::new(5.0, 10.0, 50.0, 20.0));

        let overlay = RelativeOverlay::builder(&doc, button)
            .style(
                InlineStyle::new()
                    .with("z-index", "10")
                    .with("position", "absolute"),
            )
            .mount()
            .unwrap();

        let frame = overlay.frame().unwrap();
        assert_eq!(frame.container, overlay.container());
        assert_eq!(frame.style.get("position"), Some("fixed"));
        assert_eq!(frame.style.get("top"), Some("30px"));
        assert_eq!(frame.style.get("left"), Some("5px"));
        assert_eq!(frame.style.get("z-index"), Some("10"));
        assert_eq!(frame.style.to_css(), "z-index: 10; position: fixed; top: 30px; left: 5px");
    }

    #[test]
    fn test_no_frame_without_position() {
        let doc = Document::new();
        let detached = doc.create_element("button");
        doc.destroy(detached).unwrap();

        let overlay = RelativeOverlay::mount(&doc, detached).unwrap();
        assert!(overlay.position().is_empty());
        assert!(overlay.frame().is_none());
    }

    #[test]
    fn test_anchor_and_target_changes_recompute() {
        let doc = Document::new();
        let (scroller, first) = anchored(&doc, Rect::new(0.0, 0.0, 10.0, 10.0));
        let second = doc.create_element("button");
        doc.append_child(scroller, second).unwrap();
        doc.set_bounds(second, Rect::new(0.0, 50.0, 10.0, 10.0))
            .unwrap();

        let overlay = RelativeOverlay::mount(&doc, first).unwrap();
        assert_eq!(overlay.position().top, Some(10.0));

        overlay.set_at(second);
        assert_eq!(overlay.position().top, Some(60.0));

        overlay.set_anchor(anchors::right_of(4.0));
        assert_eq!(overlay.position().top, Some(50.0));
        assert_eq!(overlay.position().left, Some(14.0));
    }

    #[test]
    fn test_listener_removed_on_drop() {
        let doc = Document::new();
        let (_, button) = anchored(&doc, Rect::default());
        {
            let _overlay = RelativeOverlay::mount(&doc, button).unwrap();
            assert_eq!(doc.scroll_listener_count(), 1);
        }
        assert_eq!(doc.scroll_listener_count(), 0);
        assert_eq!(doc.children(doc.body()).len(), 1);
    }

    #[test]
    fn test_viewport_anchors() {
        let rect = Rect::new(100.0, 200.0, 50.0, 20.0);
        let below = (anchors::below_right(800.0))(rect);
        assert_eq!(below.top, Some(220.0));
        assert_eq!(below.right, Some(650.0));

        let above = (anchors::above_left(600.0))(rect);
        assert_eq!(above.bottom, Some(400.0));
        assert_eq!(above.left, Some(100.0));
    }
}
